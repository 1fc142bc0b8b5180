use ratatui::style::{Color, Modifier, Style};

use tablog_types::SeverityLevel;

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;

    // Log line colors (foreground, background)
    pub const LINE_BG: Color = Color::Rgb(0xF2, 0xF2, 0xF2);
    pub const LEVEL_TEXT: Color = Color::Rgb(0x00, 0x00, 0x00);
    pub const LEVEL_DEBUG: Color = Color::Rgb(0x80, 0x80, 0x80);
    pub const LEVEL_INFO: Color = Color::Rgb(0x23, 0x2B, 0x99);
    pub const LEVEL_WARNING_BG: Color = Color::Rgb(0xFF, 0xFA, 0x99);
    pub const LEVEL_ERROR_BG: Color = Color::Rgb(0xF8, 0xA1, 0xA4);

    /// Foreground and background of a log line at the given level
    pub fn level_colors(level: SeverityLevel) -> (Color, Color) {
        match level {
            SeverityLevel::Text => (Self::LEVEL_TEXT, Self::LINE_BG),
            SeverityLevel::Debug => (Self::LEVEL_DEBUG, Self::LINE_BG),
            SeverityLevel::Info => (Self::LEVEL_INFO, Self::LINE_BG),
            SeverityLevel::Warning => (Self::LEVEL_TEXT, Self::LEVEL_WARNING_BG),
            SeverityLevel::Error => (Self::LEVEL_TEXT, Self::LEVEL_ERROR_BG),
        }
    }

    /// Style for the text of a log line
    pub fn level_style(level: SeverityLevel) -> Style {
        let (fg, bg) = Self::level_colors(level);
        Style::default().fg(fg).bg(bg)
    }

    /// Style for the short level tag in front of a line
    pub fn level_tag(level: SeverityLevel) -> Style {
        Self::level_style(level).add_modifier(Modifier::BOLD)
    }

    /// Search match inside a log line
    pub fn search_match() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    // Border styles
    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    // Text styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // Level toggles
    pub fn toggle_on() -> Style {
        Style::default()
            .fg(Self::BG)
            .bg(Self::SUCCESS)
            .add_modifier(Modifier::BOLD)
    }

    pub fn toggle_off() -> Style {
        Style::default().fg(Self::FG)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG_DIM).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_level_has_distinct_colors() {
        let mut seen = Vec::new();
        for level in SeverityLevel::ALL {
            let colors = Theme::level_colors(level);
            assert!(!seen.contains(&colors), "{level} reuses colors");
            seen.push(colors);
        }
    }

    #[test]
    fn test_severe_levels_use_background() {
        assert_eq!(
            Theme::level_colors(SeverityLevel::Error).1,
            Color::Rgb(0xF8, 0xA1, 0xA4)
        );
        assert_eq!(
            Theme::level_colors(SeverityLevel::Warning).1,
            Color::Rgb(0xFF, 0xFA, 0x99)
        );
        assert_eq!(Theme::level_style(SeverityLevel::Info).fg, Some(Theme::LEVEL_INFO));
    }
}
