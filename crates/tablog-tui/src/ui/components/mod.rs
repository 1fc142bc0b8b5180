mod help_overlay;
mod level_bar;
mod line_detail;
mod status_bar;

pub use help_overlay::HelpOverlay;
pub use level_bar::{LevelBar, level_label};
pub use line_detail::LineDetailOverlay;
pub use status_bar::{StatusBar, log_viewer_hints, search_hints};
