use std::path::{Path, PathBuf};

use tablog_logs::{FilterState, Session, SessionEvent, referenced_logs};
use tablog_types::{ClassifiedLine, SeverityLevel};

/// Lines moved by PageUp/PageDown
pub const PAGE_SIZE: usize = 20;

/// Columns moved by Left/Right
pub const HSCROLL_STEP: usize = 8;

/// Columns moved by Ctrl+Left/Right
pub const HSCROLL_PAGE: usize = 40;

/// Which of the two panes has keyboard focus
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pane {
    #[default]
    Full,
    Filtered,
}

/// Selection and scroll offset of one pane
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaneState {
    /// Selected row (position in the pane's list)
    pub selected: usize,

    /// First visible row
    pub offset: usize,

    /// Display columns of line text scrolled off to the left
    pub column: usize,
}

impl PaneState {
    pub fn select(&mut self, row: usize, len: usize) {
        self.selected = row;
        self.clamp(len);
    }

    pub fn up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn down(&mut self, n: usize, len: usize) {
        self.selected = self.selected.saturating_add(n);
        self.clamp(len);
    }

    pub fn top(&mut self) {
        self.selected = 0;
    }

    pub fn bottom(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    pub fn left(&mut self, n: usize) {
        self.column = self.column.saturating_sub(n);
    }

    pub fn right(&mut self, n: usize) {
        self.column = self.column.saturating_add(n);
    }

    /// Keep at least one column of the widest visible line on screen
    pub fn clamp_column(&mut self, widest: usize) {
        self.column = self.column.min(widest.saturating_sub(1));
    }

    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Adjust the offset so the selection is inside a viewport of `height` rows
    pub fn scroll_into_view(&mut self, height: usize) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if height > 0 && self.selected >= self.offset + height {
            self.offset = self.selected + 1 - height;
        }
    }
}

/// One open file
pub struct Tab {
    pub session: Session,
    pub full: PaneState,
    pub filtered: PaneState,
    pub focus: Pane,
}

impl Tab {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            full: PaneState::default(),
            filtered: PaneState::default(),
            focus: Pane::default(),
        }
    }

    /// Short title: the file name, or the full description
    pub fn title(&self) -> String {
        let describe = self.session.describe();
        Path::new(&describe)
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or(describe)
    }

    fn focused(&mut self) -> (&mut PaneState, usize) {
        match self.focus {
            Pane::Full => (&mut self.full, self.session.store().count()),
            Pane::Filtered => (&mut self.filtered, self.session.view().len()),
        }
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.focused().0.up(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        let (pane, len) = self.focused();
        pane.down(n, len);
    }

    pub fn scroll_to_top(&mut self) {
        self.focused().0.top();
    }

    pub fn scroll_to_bottom(&mut self) {
        let (pane, len) = self.focused();
        pane.bottom(len);
    }

    pub fn scroll_left(&mut self, n: usize) {
        self.focused().0.left(n);
    }

    pub fn scroll_right(&mut self, n: usize) {
        self.focused().0.right(n);
    }

    /// The selected line of the focused pane
    pub fn selected_line(&self) -> Option<ClassifiedLine> {
        match self.focus {
            Pane::Full => self.session.store().get(self.full.selected).ok(),
            Pane::Filtered => self.session.view().get(self.filtered.selected).ok().cloned(),
        }
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Full => Pane::Filtered,
            Pane::Filtered => Pane::Full,
        };
    }

    /// Apply a change to the filter state; a new filter request is only
    /// issued when the state actually changed
    pub fn update_filter(&mut self, change: impl FnOnce(&mut FilterState)) {
        let mut state = self.session.filter_state().clone();
        change(&mut state);
        if state != *self.session.filter_state() {
            self.session.set_filter(state);
        }
    }

    /// Select, in the full pane, the original line of the selected filtered entry
    pub fn jump_to_original(&mut self) {
        if let Ok(index) = self.session.view().original_index(self.filtered.selected) {
            let count = self.session.store().count();
            self.full.select(index, count);
            self.focus = Pane::Full;
        }
    }

    /// Step through the filtered entries, keeping the full pane in sync
    pub fn next_finding(&mut self) {
        let len = self.session.view().len();
        if len == 0 {
            return;
        }
        if self.focus == Pane::Filtered {
            self.filtered.down(1, len);
        } else {
            let from = self.full.selected + 1;
            let position = self.session.view().position_at_or_after(from);
            self.filtered.select(position, len);
        }
        self.sync_full_to_filtered();
    }

    pub fn prev_finding(&mut self) {
        let len = self.session.view().len();
        if len == 0 {
            return;
        }
        if self.focus == Pane::Filtered {
            self.filtered.up(1);
        } else {
            let position = self
                .session
                .view()
                .position_at_or_after(self.full.selected)
                .saturating_sub(1);
            self.filtered.select(position, len);
        }
        self.sync_full_to_filtered();
    }

    fn sync_full_to_filtered(&mut self) {
        if let Ok(index) = self.session.view().original_index(self.filtered.selected) {
            let count = self.session.store().count();
            self.full.select(index, count);
        }
    }

    /// Apply a background result, keeping selections on the same lines
    pub fn apply_event(&mut self, event: SessionEvent) -> bool {
        let anchor = self
            .session
            .view()
            .original_index(self.filtered.selected)
            .ok();

        if !self.session.handle_event(event) {
            return false;
        }

        let view = self.session.view();
        self.filtered.selected = anchor.map_or(0, |index| view.position_at_or_after(index));
        self.filtered.clamp(view.len());
        self.full.clamp(self.session.store().count());
        true
    }
}

/// Whole-line popup contents, captured when opened
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineDetail {
    pub line: ClassifiedLine,

    /// Log files the line mentions
    pub references: Vec<PathBuf>,
}

impl LineDetail {
    pub fn new(line: ClassifiedLine) -> Self {
        let references = referenced_logs(&line.text);
        Self { line, references }
    }
}

/// UI-specific transient state
#[derive(Debug, Default)]
pub struct UiState {
    /// Is the search input active?
    pub search_active: bool,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Line shown in full, if the detail popup is open
    pub detail: Option<LineDetail>,

    /// Message shown in the status bar until dismissed
    pub message: Option<String>,
}

/// Global application state
pub struct AppState {
    pub tabs: Vec<Tab>,

    pub active_tab: usize,

    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active_tab: 0,
            ui_state: UiState::default(),
            should_quit: false,
        }
    }

    pub fn add_tab(&mut self, session: Session) {
        self.tabs.push(Tab::new(session));
        self.active_tab = self.tabs.len() - 1;
    }

    pub fn active(&self) -> Option<&Tab> {
        self.tabs.get(self.active_tab)
    }

    pub fn active_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.active_tab)
    }

    pub fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active_tab = (self.active_tab + 1) % self.tabs.len();
        }
    }

    pub fn prev_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active_tab = (self.active_tab + self.tabs.len() - 1) % self.tabs.len();
        }
    }

    /// Close the active tab; quitting when it was the last one
    pub fn close_tab(&mut self) {
        if self.active_tab < self.tabs.len() {
            let tab = self.tabs.remove(self.active_tab);
            tracing::debug!(tab = %tab.title(), "closed tab");
        }
        if self.tabs.is_empty() {
            self.should_quit = true;
        } else {
            self.active_tab = self.active_tab.min(self.tabs.len() - 1);
        }
    }

    /// Route a session event to its tab
    pub fn handle_session_event(&mut self, event: SessionEvent) -> bool {
        let session_id = event.session_id();
        match self
            .tabs
            .iter_mut()
            .find(|tab| tab.session.id() == session_id)
        {
            Some(tab) => tab.apply_event(event),
            None => {
                tracing::debug!(?session_id, "event for closed tab");
                false
            }
        }
    }

    pub fn toggle_level(&mut self, level: SeverityLevel) {
        if let Some(tab) = self.active_mut() {
            tab.update_filter(|state| {
                state.toggle_level(level);
            });
        }
    }

    pub fn clear_levels(&mut self) {
        if let Some(tab) = self.active_mut() {
            tab.update_filter(FilterState::clear_levels);
        }
    }

    /// Start live search input
    pub fn start_search(&mut self) {
        self.ui_state.search_active = true;
    }

    /// Leave search input; the search text stays applied
    pub fn end_search(&mut self) {
        self.ui_state.search_active = false;
    }

    pub fn search_input_char(&mut self, c: char) {
        if let Some(tab) = self.active_mut() {
            tab.update_filter(|state| {
                let mut text = state.search_text().to_string();
                text.push(c);
                state.set_search_text(text);
            });
        }
    }

    pub fn search_input_backspace(&mut self) {
        if let Some(tab) = self.active_mut() {
            tab.update_filter(|state| {
                let mut text = state.search_text().to_string();
                text.pop();
                state.set_search_text(text);
            });
        }
    }

    pub fn search_clear(&mut self) {
        if let Some(tab) = self.active_mut() {
            tab.update_filter(|state| state.set_search_text(""));
        }
    }

    pub fn reload(&mut self) {
        if let Some(tab) = self.active_mut() {
            let request = tab.session.reload();
            tracing::debug!(tab = %tab.title(), request, "reload requested");
        }
    }

    /// Enter: from the filtered pane jump to the original line, from the
    /// full pane show the whole selected line
    pub fn open_line(&mut self) {
        let Some(tab) = self.active_mut() else {
            return;
        };
        match tab.focus {
            Pane::Filtered => tab.jump_to_original(),
            Pane::Full => {
                let detail = tab.selected_line().map(LineDetail::new);
                self.ui_state.detail = detail;
            }
        }
    }

    pub fn close_detail(&mut self) {
        self.ui_state.detail = None;
    }

    /// First existing log file referenced by the open detail popup, or else
    /// by the selected line
    pub fn referenced_log(&self) -> Option<PathBuf> {
        let references = match &self.ui_state.detail {
            Some(detail) => detail.references.clone(),
            None => referenced_logs(&self.active()?.selected_line()?.text),
        };
        references.into_iter().find(|path| path.is_file())
    }

    /// Focus the tab showing `path`, or open one right after the active tab
    pub fn open_tab(&mut self, path: &Path, open: impl FnOnce(&Path) -> Session) {
        self.ui_state.detail = None;
        let name = path.display().to_string();
        if let Some(index) = self
            .tabs
            .iter()
            .position(|tab| tab.session.describe() == name)
        {
            self.active_tab = index;
            return;
        }

        let index = if self.tabs.is_empty() {
            0
        } else {
            self.active_tab + 1
        };
        self.tabs.insert(index, Tab::new(open(path)));
        self.active_tab = index;
        tracing::debug!(path = %name, "opened referenced log");
    }

    /// Show a message in the status bar
    pub fn show_message(&mut self, msg: String) {
        self.ui_state.message = Some(msg);
    }

    pub fn dismiss_message(&mut self) {
        self.ui_state.message = None;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
