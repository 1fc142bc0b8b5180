use ratatui::{
    Frame,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::LineDetail;
use crate::ui::{Layout, Theme};

/// Popup showing one line in full, wrapped, with the log files it mentions
pub struct LineDetailOverlay;

impl LineDetailOverlay {
    pub fn render(frame: &mut Frame, detail: &LineDetail) {
        let area = frame.area();
        let popup_area = Layout::popup(area, area.width * 4 / 5, area.height * 3 / 5);

        frame.render_widget(Clear, popup_area);

        let level = detail.line.level;
        let (fg, _) = Theme::level_colors(level);
        let mut lines = vec![Line::from(Span::styled(
            detail.line.text.clone(),
            Theme::level_style(level),
        ))];

        if !detail.references.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Referenced logs",
                Style::default().fg(Theme::HIGHLIGHT),
            )));
            for path in &detail.references {
                let style = if path.is_file() {
                    Theme::text().add_modifier(Modifier::UNDERLINED)
                } else {
                    Theme::text_dim()
                };
                lines.push(Line::from(Span::styled(
                    format!("  {}", path.display()),
                    style,
                )));
            }
        }

        let title = format!(
            " Line {} · {} ",
            detail.line.line_number(),
            level.label()
        );
        let hint = if detail.references.is_empty() {
            " Esc close "
        } else {
            " o open log · Esc close "
        };

        let widget = Paragraph::new(lines)
            .style(Theme::level_style(level))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(fg).bg(Theme::LINE_BG))
                    .title(Span::styled(title, Theme::title()))
                    .title_bottom(Span::styled(hint, Theme::text_dim())),
            );

        frame.render_widget(widget, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use tablog_types::{ClassifiedLine, SeverityLevel};

    #[test]
    fn test_wraps_long_line() {
        let text = format!("ERROR {} tail-marker", "word ".repeat(40));
        let detail = LineDetail::new(ClassifiedLine::new(4, SeverityLevel::Error, text));

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| LineDetailOverlay::render(frame, &detail))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let mut rendered = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                rendered.push_str(buffer[(x, y)].symbol());
            }
        }
        assert!(rendered.contains("Line 5"));
        assert!(rendered.contains("tail-marker"));
    }
}
