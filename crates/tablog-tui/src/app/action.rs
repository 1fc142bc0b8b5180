use tablog_types::SeverityLevel;

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,

    // Level toggles
    ToggleLevel(SeverityLevel),
    ClearLevels,

    // Live search
    OpenSearch,
    CloseSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,

    // Panes
    SwitchFocus,
    /// Jump to the original line, or show the whole line
    OpenLine,
    CloseDetail,
    NextFinding,
    PrevFinding,

    // Scrolling in the focused pane
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,
    ScrollToBottom,
    PageUp,
    PageDown,
    ScrollLeft(usize),
    ScrollRight(usize),

    // Tabs
    Reload,
    NextTab,
    PrevTab,
    CloseTab,
    OpenReferencedLog,

    DismissMessage,
}
