//! TUI components for tablog
//!
//! This crate provides the terminal user interface for tablog,
//! including state management, keybindings, event handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{
    Action, AppState, HSCROLL_PAGE, HSCROLL_STEP, LineDetail, PAGE_SIZE, Pane, PaneState, Tab,
    UiState,
};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{HelpOverlay, LevelBar, LineDetailOverlay, StatusBar};
pub use ui::screens::LogViewerScreen;
pub use ui::{Layout, Theme};
