mod action;
mod state;

pub use action::Action;
pub use state::{
    AppState, HSCROLL_PAGE, HSCROLL_STEP, LineDetail, PAGE_SIZE, Pane, PaneState, Tab, UiState,
};
