use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::popup(frame.area(), 50, 33);

        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Filter"),
            Self::key_line("1-5", "Toggle Text/Debug/Info/Warning/Error"),
            Self::key_line("0", "Clear level selection"),
            Self::key_line("/", "Search (live, case-insensitive)"),
            Self::key_line("Esc", "Leave search input"),
            Line::from(""),
            Self::section("Navigation"),
            Self::key_line("j/↓", "Down"),
            Self::key_line("k/↑", "Up"),
            Self::key_line("PgDn", "Page down"),
            Self::key_line("PgUp", "Page up"),
            Self::key_line("g/G", "Top / bottom"),
            Self::key_line("Tab", "Switch pane"),
            Self::key_line("Enter", "Show line / jump to original"),
            Self::key_line("←/→", "Scroll sideways (Ctrl: faster)"),
            Self::key_line("n/N", "Next / previous finding"),
            Line::from(""),
            Self::section("Files"),
            Self::key_line("r/F5", "Reload"),
            Self::key_line("]/[", "Next / previous tab"),
            Self::key_line("w", "Close tab"),
            Self::key_line("o", "Open log named in the line"),
            Line::from(""),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(name: &str) -> Line<'_> {
        Line::from(Span::styled(name, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
