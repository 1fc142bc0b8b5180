pub mod components;
mod layout;
pub mod screens;
mod text;
mod theme;

pub use layout::Layout;
pub use text::{fit_segments, skip_width, truncate_to_width};
pub use theme::Theme;
