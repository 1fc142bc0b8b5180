//! Width-aware text fitting for terminal cells

use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;

use tablog_types::Segment;

/// Longest prefix of `s` that fits in `width` terminal cells, and its width
pub fn truncate_to_width(s: &str, width: usize) -> (&str, usize) {
    let mut used = 0;
    for (index, c) in s.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            return (&s[..index], used);
        }
        used += w;
    }
    (s, used)
}

/// Drop the first `columns` cells of `s`. A wide char cut in half is dropped
/// whole.
pub fn skip_width(s: &str, columns: usize) -> (&str, usize) {
    let mut skipped = 0;
    for (index, c) in s.char_indices() {
        if skipped >= columns {
            return (&s[index..], skipped);
        }
        skipped += c.width().unwrap_or(0);
    }
    ("", skipped)
}

/// Turn highlight segments into styled spans, scrolled right by `skip` cells
/// and cut to `width` cells
pub fn fit_segments(
    segments: &[Segment],
    skip: usize,
    width: usize,
    base: Style,
    matched: Style,
) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(segments.len());
    let mut to_skip = skip;
    let mut remaining = width;

    for segment in segments {
        if remaining == 0 {
            break;
        }
        let (visible, skipped) = skip_width(&segment.text, to_skip);
        to_skip = to_skip.saturating_sub(skipped);
        if visible.is_empty() {
            continue;
        }

        let (text, used) = truncate_to_width(visible, remaining);
        if text.is_empty() {
            break;
        }
        let style = if segment.is_match() { matched } else { base };
        spans.push(Span::styled(text.to_string(), style));
        remaining -= used;
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;
    use tablog_logs::highlight;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_to_width("hello", 3), ("hel", 3));
        assert_eq!(truncate_to_width("hi", 10), ("hi", 2));
        assert_eq!(truncate_to_width("", 4), ("", 0));
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK char takes two cells
        assert_eq!(truncate_to_width("日本語", 5), ("日本", 4));
        assert_eq!(truncate_to_width("日本語", 1), ("", 0));
    }

    #[test]
    fn test_fit_segments_keeps_match_style() {
        let base = Style::default().fg(Color::White);
        let matched = Style::default().fg(Color::Black).bg(Color::Yellow);
        let segments = highlight::render("disk ERROR here", "error");

        let spans = fit_segments(&segments, 0, 8, base, matched);
        let texts: Vec<_> = spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(texts, vec!["disk ", "ERR"]);
        assert_eq!(spans[1].style, matched);
    }

    #[test]
    fn test_skip_width() {
        assert_eq!(skip_width("hello", 2), ("llo", 2));
        assert_eq!(skip_width("hi", 5), ("", 2));
        // Half of a wide char is not shown
        assert_eq!(skip_width("日本語", 1), ("本語", 2));
    }

    #[test]
    fn test_fit_segments_scrolled() {
        let base = Style::default();
        let matched = Style::default().bg(Color::Yellow);
        let segments = highlight::render("disk ERROR here", "error");

        let spans = fit_segments(&segments, 7, 6, base, matched);
        let texts: Vec<_> = spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(texts, vec!["ROR", " he"]);
        assert_eq!(spans[0].style, matched);

        assert!(fit_segments(&segments, 40, 6, base, matched).is_empty());
    }
}
