use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use tablog_types::SeverityLevel;

use crate::app::{Action, HSCROLL_PAGE, HSCROLL_STEP, PAGE_SIZE, UiState};

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    LogViewer,
    SearchInput,
    Help,
    LineDetail,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        let mut log_viewer = HashMap::new();
        // Level toggles, in ascending severity
        for (digit, level) in ('1'..='5').zip(SeverityLevel::ALL) {
            log_viewer.insert(
                KeyBinding::new(KeyCode::Char(digit)),
                Action::ToggleLevel(level),
            );
        }
        log_viewer.insert(KeyBinding::new(KeyCode::Char('0')), Action::ClearLevels);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        log_viewer.insert(KeyBinding::new(KeyCode::Tab), Action::SwitchFocus);
        log_viewer.insert(KeyBinding::shift(KeyCode::BackTab), Action::SwitchFocus);
        log_viewer.insert(KeyBinding::new(KeyCode::Enter), Action::OpenLine);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('n')), Action::NextFinding);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('N')), Action::PrevFinding);
        log_viewer.insert(KeyBinding::new(KeyCode::Esc), Action::DismissMessage);
        // Line navigation
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        // Page navigation (less-style)
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(
            KeyBinding::ctrl(KeyCode::Char('f')),
            Action::ScrollDown(PAGE_SIZE * 2),
        );
        log_viewer.insert(
            KeyBinding::ctrl(KeyCode::Char('b')),
            Action::ScrollUp(PAGE_SIZE * 2),
        );
        // Horizontal scrolling of long lines
        for (code, action) in [
            (KeyCode::Left, Action::ScrollLeft(HSCROLL_STEP)),
            (KeyCode::Char('h'), Action::ScrollLeft(HSCROLL_STEP)),
            (KeyCode::Right, Action::ScrollRight(HSCROLL_STEP)),
            (KeyCode::Char('l'), Action::ScrollRight(HSCROLL_STEP)),
        ] {
            log_viewer.insert(KeyBinding::new(code), action);
        }
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Left), Action::ScrollLeft(HSCROLL_PAGE));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Right), Action::ScrollRight(HSCROLL_PAGE));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        // Files
        log_viewer.insert(KeyBinding::new(KeyCode::Char('r')), Action::Reload);
        log_viewer.insert(KeyBinding::new(KeyCode::F(5)), Action::Reload);
        log_viewer.insert(KeyBinding::new(KeyCode::Char(']')), Action::NextTab);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('[')), Action::PrevTab);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('w')), Action::CloseTab);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('o')), Action::OpenReferencedLog);
        bindings.insert(KeyContext::LogViewer, log_viewer);

        // Search input bindings (when the search bar is active)
        let mut search_input = HashMap::new();
        search_input.insert(KeyBinding::new(KeyCode::Enter), Action::CloseSearch);
        search_input.insert(KeyBinding::new(KeyCode::Esc), Action::CloseSearch);
        search_input.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        search_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        bindings.insert(KeyContext::SearchInput, search_input);

        let mut help = HashMap::new();
        help.insert(KeyBinding::new(KeyCode::Esc), Action::ToggleHelp);
        bindings.insert(KeyContext::Help, help);

        let mut detail = HashMap::new();
        detail.insert(KeyBinding::new(KeyCode::Esc), Action::CloseDetail);
        detail.insert(KeyBinding::new(KeyCode::Enter), Action::CloseDetail);
        detail.insert(KeyBinding::new(KeyCode::Char('q')), Action::CloseDetail);
        detail.insert(KeyBinding::new(KeyCode::Char('o')), Action::OpenReferencedLog);
        bindings.insert(KeyContext::LineDetail, detail);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in search input mode.
    /// Returns Some(Action) for special keys and typed characters.
    pub fn get_search_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::SearchInput)
            .and_then(|search_bindings| search_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Regular characters go into the search text
        if let KeyCode::Char(c) = key.code
            && (key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT)
        {
            return Some(Action::SearchInput(c));
        }

        None
    }

    /// Resolve a key press for the current UI mode
    pub fn resolve(&self, ui: &UiState, key: &KeyEvent) -> Option<Action> {
        if ui.help_visible {
            self.get_action(KeyContext::Help, key)
        } else if ui.detail.is_some() {
            self.get_action(KeyContext::LineDetail, key)
        } else if ui.search_active {
            self.get_search_input_action(key)
        } else {
            self.get_action(KeyContext::LogViewer, key)
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
