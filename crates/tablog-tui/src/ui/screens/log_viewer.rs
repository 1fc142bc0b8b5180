use unicode_width::UnicodeWidthStr;

use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use tablog_logs::highlight;
use tablog_types::ClassifiedLine;

use crate::app::{AppState, Pane, PaneState, Tab};
use crate::ui::components::{LevelBar, StatusBar, log_viewer_hints, search_hints};
use crate::ui::{Layout, Theme, fit_segments};

/// Width of the line number column
const LINE_NUMBER_WIDTH: usize = 7;

/// Log viewer screen: full view above, filtered view below
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let (header, controls, panes, status) = Layout::main(frame.area());

        Self::render_header(frame, header, state);

        let search_active = state.ui_state.search_active;
        let message = state.ui_state.message.clone();

        let Some(tab) = state.active_mut() else {
            let empty = Paragraph::new(Span::styled(" No files open", Theme::text_dim()));
            frame.render_widget(empty, panes);
            return;
        };

        let (search_area, levels_area) = Layout::controls(controls);
        Self::render_search(frame, search_area, tab, search_active);
        frame.render_widget(
            LevelBar::new(
                tab.session.filter_state(),
                tab.session.level_counts(),
                tab.session.filtered_counts(),
            ),
            levels_area,
        );

        let (full_area, filtered_area) = Layout::panes(panes);
        Self::render_full_pane(frame, full_area, tab);
        Self::render_filtered_pane(frame, filtered_area, tab);

        Self::render_status_bar(frame, status, tab, search_active, message);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut spans = vec![Span::styled("tablog", Theme::title())];

        for (i, tab) in state.tabs.iter().enumerate() {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            let style = if i == state.active_tab {
                Theme::text_highlight()
            } else {
                Theme::text()
            };
            spans.push(Span::styled(tab.title(), style));
            if tab.session.is_loading() {
                spans.push(Span::styled(" (loading)", Theme::text_dim()));
            }
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_search(frame: &mut Frame, area: Rect, tab: &Tab, active: bool) {
        let text = tab.session.filter_state().search_text();
        let mut spans = vec![];

        if active {
            spans.push(Span::styled(
                " /",
                Style::default()
                    .fg(Theme::HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(text.to_string(), Theme::text()));
            spans.push(Span::styled("▏", Theme::text_highlight()));
        } else if text.is_empty() {
            spans.push(Span::styled(" Press / to search", Theme::text_dim()));
        } else {
            spans.push(Span::styled(" ", Theme::text()));
            spans.push(Span::styled(text.to_string(), Theme::text_highlight()));
        }

        let border = if active {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        let search = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(" Search ", Theme::title())),
        );

        frame.render_widget(search, area);
    }

    fn render_full_pane(frame: &mut Frame, area: Rect, tab: &mut Tab) {
        let snapshot = tab.session.store().snapshot();
        let focused = tab.focus == Pane::Full;
        let height = area.height.saturating_sub(2) as usize;
        let width = area.width.saturating_sub(3) as usize;

        tab.full.clamp(snapshot.len());
        tab.full.scroll_into_view(height);

        let visible = snapshot.range(tab.full.offset, height);
        tab.full
            .clamp_column(visible.iter().map(|line| line.text.width()).max().unwrap_or(0));

        let lines: Vec<Line> = visible
            .iter()
            .enumerate()
            .map(|(row, line)| {
                let selected = focused && tab.full.offset + row == tab.full.selected;
                Self::format_line(line, "", tab.full.column, width, selected)
            })
            .collect();

        let title = format!(" {} ({} lines) ", tab.title(), snapshot.len());
        Self::render_pane(frame, area, lines, title, focused, &tab.full, snapshot.len());
    }

    fn render_filtered_pane(frame: &mut Frame, area: Rect, tab: &mut Tab) {
        let view = tab.session.view().clone();
        let focused = tab.focus == Pane::Filtered;
        let height = area.height.saturating_sub(2) as usize;
        let width = area.width.saturating_sub(3) as usize;

        tab.filtered.clamp(view.len());
        tab.filtered.scroll_into_view(height);

        let search = view.filter_state().search_text();
        let visible: Vec<_> = view.range(tab.filtered.offset, height).collect();
        tab.filtered
            .clamp_column(visible.iter().map(|line| line.text.width()).max().unwrap_or(0));

        let lines: Vec<Line> = visible
            .into_iter()
            .enumerate()
            .map(|(row, line)| {
                let selected = focused && tab.filtered.offset + row == tab.filtered.selected;
                Self::format_line(line, search, tab.filtered.column, width, selected)
            })
            .collect();

        let title = if tab.session.filter_state().is_active() {
            format!(
                " Filtered ({} of {}) ",
                view.len(),
                tab.session.store().count()
            )
        } else {
            " Filtered (select a level or type a search) ".to_string()
        };
        Self::render_pane(frame, area, lines, title, focused, &tab.filtered, view.len());
    }

    fn render_pane(
        frame: &mut Frame,
        area: Rect,
        lines: Vec<Line<'static>>,
        title: String,
        focused: bool,
        pane: &PaneState,
        total: usize,
    ) {
        let border = if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(widget, area);

        let inner_height = area.height.saturating_sub(2) as usize;
        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));

            let max_scroll = total.saturating_sub(inner_height);
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(pane.offset.min(max_scroll));

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    /// Line number, level tag and (highlighted) text scrolled by `column`,
    /// fitted to `width` cells
    fn format_line(
        line: &ClassifiedLine,
        search: &str,
        column: usize,
        width: usize,
        selected: bool,
    ) -> Line<'static> {
        let tag = format!(" {} ", line.level.as_str());
        let prefix_width = LINE_NUMBER_WIDTH + tag.len() + 1;

        let mut spans = vec![
            Span::styled(
                format!("{:>width$} ", line.line_number(), width = LINE_NUMBER_WIDTH - 1),
                Theme::text_dim(),
            ),
            Span::styled(tag, Theme::level_tag(line.level)),
            Span::styled(" ", Theme::level_style(line.level)),
        ];

        let segments = highlight::render(&line.text, search);
        spans.extend(fit_segments(
            &segments,
            column,
            width.saturating_sub(prefix_width),
            Theme::level_style(line.level),
            Theme::search_match(),
        ));

        let rendered = Line::from(spans);
        if selected {
            rendered.patch_style(Style::default().add_modifier(Modifier::REVERSED))
        } else {
            rendered
        }
    }

    fn render_status_bar(
        frame: &mut Frame,
        area: Rect,
        tab: &Tab,
        search_active: bool,
        message: Option<String>,
    ) {
        let hints = if search_active {
            search_hints()
        } else {
            log_viewer_hints()
        };

        let right = message.unwrap_or_else(|| {
            let (pane, len, name) = match tab.focus {
                Pane::Full => (&tab.full, tab.session.store().count(), "log"),
                Pane::Filtered => (&tab.filtered, tab.session.view().len(), "filtered"),
            };
            let position = if len == 0 { 0 } else { pane.selected + 1 };
            let busy = if tab.session.is_filtering() {
                " filtering"
            } else {
                ""
            };
            let column = if pane.column > 0 {
                format!(" col {}", pane.column + 1)
            } else {
                String::new()
            };
            format!("{} {}/{}{}{}", name, position, len, column, busy)
        });

        frame.render_widget(StatusBar::new().hints(hints).right(right), area);
    }
}
