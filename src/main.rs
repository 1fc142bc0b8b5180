use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use tablog_logs::{FileSource, FilterState, RuleSet, RulesConfig, Session, SessionEvent};
use tablog_tui::{
    Action, AppState, Event, EventHandler, HelpOverlay, KeyBindings, LineDetailOverlay,
    LogViewerScreen, PAGE_SIZE, Tab, Tui,
};
use tablog_types::{ClassifiedLine, SeverityLevel};

/// Tablog - A terminal log viewer that sorts lines by severity
#[derive(Parser, Debug)]
#[command(name = "tablog")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log files to open, one tab per file
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// TOML file replacing the built-in classification rules
    #[arg(long, value_name = "TOML")]
    rules: Option<PathBuf>,

    /// Initially selected level (repeatable)
    #[arg(long = "level", value_name = "LEVEL")]
    levels: Vec<SeverityLevel>,

    /// Initial search text
    #[arg(long, value_name = "TEXT", default_value = "")]
    search: String,

    /// Classify files even when they are not named *.log or *.log.gz
    #[arg(long)]
    classify_all: bool,

    /// Print the filtered lines (or every line when no filter is set) and exit
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = if args.print {
        print_files(&args)
    } else {
        run_app(args).await
    };

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn load_rules(path: Option<&Path>) -> Result<Arc<RuleSet>> {
    let rules = match path {
        Some(path) => RulesConfig::load(path)
            .with_context(|| format!("failed to load rules from {}", path.display()))?
            .into_rule_set(),
        None => RuleSet::default(),
    };
    Ok(Arc::new(rules))
}

fn initial_filter(args: &Args) -> FilterState {
    FilterState::new()
        .with_levels(args.levels.iter().copied())
        .with_search(args.search.clone())
}

/// Creates sessions that share the rules and the event channel
struct SessionFactory {
    rules: Arc<RuleSet>,
    events: mpsc::UnboundedSender<SessionEvent>,
    classify_all: bool,
}

impl SessionFactory {
    fn open(&self, path: &Path) -> Session {
        let source = FileSource::new(path).force_classify(self.classify_all);
        Session::new(Arc::new(source), Arc::clone(&self.rules), self.events.clone())
    }
}

/// Non-interactive mode: load, filter and print each file
fn print_files(args: &Args) -> Result<()> {
    let filter = initial_filter(args);
    let (events_tx, _events_rx) = mpsc::unbounded_channel();
    let factory = SessionFactory {
        rules: load_rules(args.rules.as_deref())?,
        events: events_tx,
        classify_all: args.classify_all,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let with_headers = args.files.len() > 1;

    for path in &args.files {
        let mut session = factory.open(path);
        session.load_now();
        let view = Arc::clone(session.apply_filter_now(filter.clone()));

        if with_headers {
            writeln!(out, "==> {} <==", path.display())?;
        }

        if filter.is_active() {
            for line in view.iter() {
                write_line(&mut out, line)?;
            }
        } else {
            for line in session.store().snapshot().lines() {
                write_line(&mut out, line)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn write_line(out: &mut impl Write, line: &ClassifiedLine) -> io::Result<()> {
    writeln!(
        out,
        "{:>6}\t{}\t{}",
        line.line_number(),
        line.level.as_str(),
        line.text
    )
}

async fn run_app(args: Args) -> Result<()> {
    let filter = initial_filter(&args);

    // Sessions post load and filter results here
    let (session_tx, mut session_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let factory = SessionFactory {
        rules: load_rules(args.rules.as_deref())?,
        events: session_tx,
        classify_all: args.classify_all,
    };

    let mut state = AppState::new();
    for path in &args.files {
        let mut session = factory.open(path);
        session.set_filter(filter.clone());
        session.load();
        state.add_tab(session);
    }
    state.active_tab = 0;

    let mut tui = Tui::new().context("failed to initialize terminal")?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let keybindings = KeyBindings::new();

    // Initial render
    render(&mut tui, &mut state)?;

    // Main event loop
    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        if let Some(action) = keybindings.resolve(&state.ui_state, &key) {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick | Event::Resize(_, _) => {}
                    Event::Error(e) => state.show_message(format!("Input error: {}", e)),
                }
            }

            // Handle actions
            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &factory, action);
            }

            // Handle load and filter results
            Some(event) = session_rx.recv() => {
                state.handle_session_event(event);
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state)?;
    }

    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn with_active(state: &mut AppState, f: impl FnOnce(&mut Tab)) {
    if let Some(tab) = state.active_mut() {
        f(tab);
    }
}

fn handle_action(state: &mut AppState, factory: &SessionFactory, action: Action) {
    match action {
        Action::Quit => state.should_quit = true,
        Action::ToggleHelp => state.ui_state.help_visible = !state.ui_state.help_visible,
        Action::DismissMessage => state.dismiss_message(),

        // Filter
        Action::ToggleLevel(level) => state.toggle_level(level),
        Action::ClearLevels => state.clear_levels(),
        Action::OpenSearch => state.start_search(),
        Action::CloseSearch => state.end_search(),
        Action::SearchInput(c) => state.search_input_char(c),
        Action::SearchBackspace => state.search_input_backspace(),
        Action::SearchClear => state.search_clear(),

        // Navigation
        Action::SwitchFocus => with_active(state, Tab::switch_focus),
        Action::OpenLine => state.open_line(),
        Action::CloseDetail => state.close_detail(),
        Action::NextFinding => with_active(state, Tab::next_finding),
        Action::PrevFinding => with_active(state, Tab::prev_finding),
        Action::ScrollUp(n) => with_active(state, |tab| tab.scroll_up(n)),
        Action::ScrollDown(n) => with_active(state, |tab| tab.scroll_down(n)),
        Action::PageUp => with_active(state, |tab| tab.scroll_up(PAGE_SIZE)),
        Action::PageDown => with_active(state, |tab| tab.scroll_down(PAGE_SIZE)),
        Action::ScrollToTop => with_active(state, Tab::scroll_to_top),
        Action::ScrollToBottom => with_active(state, Tab::scroll_to_bottom),
        Action::ScrollLeft(n) => with_active(state, |tab| tab.scroll_left(n)),
        Action::ScrollRight(n) => with_active(state, |tab| tab.scroll_right(n)),

        // Files
        Action::Reload => state.reload(),
        Action::NextTab => state.next_tab(),
        Action::PrevTab => state.prev_tab(),
        Action::CloseTab => state.close_tab(),
        Action::OpenReferencedLog => match state.referenced_log() {
            Some(path) => state.open_tab(&path, |path| {
                let mut session = factory.open(path);
                session.load();
                session
            }),
            None => state.show_message("No existing log file named on this line".to_string()),
        },
    }
}

fn render(tui: &mut Tui, state: &mut AppState) -> Result<()> {
    tui.draw(|frame| {
        LogViewerScreen::render(frame, state);

        if let Some(detail) = &state.ui_state.detail {
            LineDetailOverlay::render(frame, detail);
        }

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}
