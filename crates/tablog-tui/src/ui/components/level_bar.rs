use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use tablog_logs::{FilterState, LevelCounts};
use tablog_types::SeverityLevel;

use crate::ui::Theme;

/// Level toggles with line counts
pub struct LevelBar<'a> {
    filter: &'a FilterState,
    totals: LevelCounts,
    filtered: LevelCounts,
}

impl<'a> LevelBar<'a> {
    pub fn new(filter: &'a FilterState, totals: LevelCounts, filtered: LevelCounts) -> Self {
        Self {
            filter,
            totals,
            filtered,
        }
    }
}

/// "Error (filtered/total)" while a filter is active, "Error (total)" otherwise
pub fn level_label(level: SeverityLevel, total: usize, filtered: usize, active: bool) -> String {
    if active {
        format!("{} ({}/{})", level.label(), filtered, total)
    } else {
        format!("{} ({})", level.label(), total)
    }
}

impl Widget for LevelBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let active = self.filter.is_active();
        let mut spans = vec![Span::raw(" ")];

        for (i, level) in SeverityLevel::ALL.into_iter().enumerate() {
            let style = if self.filter.is_level_selected(level) {
                Theme::toggle_on()
            } else {
                Theme::toggle_off()
            };
            spans.push(Span::styled(format!("{}", i + 1), Theme::text_dim()));
            spans.push(Span::styled(
                format!(
                    " {} ",
                    level_label(
                        level,
                        self.totals.get(level),
                        self.filtered.get(level),
                        active
                    )
                ),
                style,
            ));
            spans.push(Span::raw(" "));
        }

        Paragraph::new(Line::from(spans))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border())
                    .title(Span::styled(" Levels ", Theme::title())),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_label() {
        assert_eq!(level_label(SeverityLevel::Error, 10, 3, true), "Error (3/10)");
        assert_eq!(level_label(SeverityLevel::Warning, 7, 0, false), "Warning (7)");
    }
}
