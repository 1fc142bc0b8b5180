//! Search-term highlighting
//!
//! Splits a line into plain and matched segments. Matching is
//! case-insensitive, non-overlapping and leftmost-first; the returned text
//! keeps the original casing because slicing happens on the original line.

use tablog_types::Segment;

/// Split `text` on every case-insensitive occurrence of `search`.
///
/// Empty plain segments are never emitted: two adjacent matches follow each
/// other directly, with no zero-length plain segment between them. When
/// `search` is empty or absent from `text`, the result is one plain segment
/// equal to `text`.
pub fn render(text: &str, search: &str) -> Vec<Segment> {
    let needle = fold(search);
    if needle.is_empty() {
        return vec![Segment::plain(text, 0)];
    }

    let folded = FoldedText::new(text);
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut search_from = 0;

    while let Some(found) = folded.text[search_from..].find(needle.as_str()) {
        let folded_start = search_from + found;
        let folded_end = folded_start + needle.len();
        search_from = folded_end;

        let start = folded.starts[folded_start];
        let end = folded.ends[folded_end - 1];
        if start < cursor {
            // begins inside a character already consumed by the previous match
            continue;
        }

        if start > cursor {
            segments.push(Segment::plain(&text[cursor..start], cursor));
        }
        segments.push(Segment::matched(&text[start..end], start));
        cursor = end;
    }

    if cursor < text.len() || segments.is_empty() {
        segments.push(Segment::plain(&text[cursor..], cursor));
    }

    segments
}

/// Byte ranges of the matches only
pub fn match_ranges(text: &str, search: &str) -> Vec<(usize, usize)> {
    render(text, search)
        .into_iter()
        .filter(|segment| segment.is_match())
        .map(|segment| (segment.start, segment.end))
        .collect()
}

/// Case folding shared by filtering and highlighting.
///
/// Folds one char at a time, unlike `str::to_lowercase` which maps a
/// word-final 'Σ' to 'ς'. Each char folds the same way wherever it sits, so
/// byte spans in the folded text map back to single original chars.
pub fn fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Lowercased copy of a line with, for every folded byte, the byte span of
/// the original character it came from
struct FoldedText {
    text: String,
    starts: Vec<usize>,
    ends: Vec<usize>,
}

impl FoldedText {
    fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut starts = Vec::with_capacity(original.len());
        let mut ends = Vec::with_capacity(original.len());

        for (start, c) in original.char_indices() {
            let end = start + c.len_utf8();
            for lower in c.to_lowercase() {
                text.push(lower);
                for _ in 0..lower.len_utf8() {
                    starts.push(start);
                    ends.push(end);
                }
            }
        }

        Self { text, starts, ends }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablog_types::SegmentKind;

    fn kinds(segments: &[Segment]) -> Vec<(SegmentKind, &str)> {
        segments.iter().map(|s| (s.kind, s.text.as_str())).collect()
    }

    #[test]
    fn test_matches_at_both_ends() {
        let segments = render("fooBARfoo", "foo");
        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::Matched, "foo"),
                (SegmentKind::Plain, "BAR"),
                (SegmentKind::Matched, "foo"),
            ]
        );
    }

    #[test]
    fn test_empty_search_is_single_plain_segment() {
        assert_eq!(
            kinds(&render("xx", "")),
            vec![(SegmentKind::Plain, "xx")]
        );
        assert_eq!(kinds(&render("", "")), vec![(SegmentKind::Plain, "")]);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(
            kinds(&render("hello", "xyz")),
            vec![(SegmentKind::Plain, "hello")]
        );
        assert_eq!(kinds(&render("", "a")), vec![(SegmentKind::Plain, "")]);
    }

    #[test]
    fn test_preserves_original_case() {
        let segments = render("abcABCabc", "abc");
        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::Matched, "abc"),
                (SegmentKind::Matched, "ABC"),
                (SegmentKind::Matched, "abc"),
            ]
        );

        let segments = render("Disk FAILURE detected", "failure");
        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::Plain, "Disk "),
                (SegmentKind::Matched, "FAILURE"),
                (SegmentKind::Plain, " detected"),
            ]
        );
    }

    #[test]
    fn test_non_overlapping_leftmost_first() {
        assert_eq!(
            kinds(&render("aaa", "aa")),
            vec![(SegmentKind::Matched, "aa"), (SegmentKind::Plain, "a")]
        );
        assert_eq!(
            kinds(&render("aaaa", "AA")),
            vec![(SegmentKind::Matched, "aa"), (SegmentKind::Matched, "aa")]
        );
    }

    #[test]
    fn test_spans_are_byte_offsets_into_original() {
        let text = "ßtraße STRASSE";
        for segment in render(text, "stra") {
            assert_eq!(&text[segment.start..segment.end], segment.text);
        }
    }

    #[test]
    fn test_length_changing_fold_keeps_char_boundaries() {
        // 'İ' lowercases to two chars ("i" + combining dot)
        let segments = render("İx", "i");
        assert_eq!(
            kinds(&segments),
            vec![(SegmentKind::Matched, "İ"), (SegmentKind::Plain, "x")]
        );
    }

    #[test]
    fn test_segments_concatenate_to_input() {
        let cases = [
            ("ERROR: disk full", "disk"),
            ("--x--x--", "x"),
            ("日本語のログ", "ログ"),
            ("nothing here", "zzz"),
        ];
        for (text, search) in cases {
            let joined: String = render(text, search)
                .iter()
                .map(|s| s.text.as_str())
                .collect();
            assert_eq!(joined, text);
        }
    }

    #[test]
    fn test_fold_is_per_char() {
        assert_eq!(fold("ΟΔΟΣ"), "οδοσ");
        assert_eq!(fold("Disk FULL"), "disk full");
        let segments = render("ΟΔΟΣ", "σ");
        assert_eq!(
            kinds(&segments),
            vec![(SegmentKind::Plain, "ΟΔΟ"), (SegmentKind::Matched, "Σ")]
        );
    }

    #[test]
    fn test_match_ranges() {
        assert_eq!(match_ranges("an error, another ERROR", "error"), vec![(3, 8), (18, 23)]);
    }
}
