//! Shared types for tablog
//!
//! This crate contains data structures used across multiple tablog crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Severity
// ============================================================================

/// Log severity level, ordered by increasing severity.
///
/// `Text` has a dual role: it is a real level shown in the UI and filterable
/// like any other, and it is also the fallback assigned to a line that no
/// rule claims. It never carries classification rules of its own.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    #[default]
    Text,
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl SeverityLevel {
    /// All levels in ascending severity order
    pub const ALL: [SeverityLevel; 5] = [
        Self::Text,
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
    ];

    /// Number of levels
    pub const COUNT: usize = Self::ALL.len();

    /// Stable position of this level inside [`SeverityLevel::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Self::Text => 0,
            Self::Debug => 1,
            Self::Info => 2,
            Self::Warning => 3,
            Self::Error => 4,
        }
    }

    /// Capitalized display name ("Warning")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Debug => "Debug",
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TXT",
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SeverityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown level '{}', expected one of: text, debug, info, warning, error",
                other
            )),
        }
    }
}

// ============================================================================
// Lines
// ============================================================================

/// A raw input line paired with its level and original position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedLine {
    /// Position of the line in the loaded source (0-based)
    pub original_index: usize,

    /// Assigned severity
    pub level: SeverityLevel,

    /// Original, untruncated text
    pub text: String,
}

impl ClassifiedLine {
    pub fn new(original_index: usize, level: SeverityLevel, text: String) -> Self {
        Self {
            original_index,
            level,
            text,
        }
    }

    /// 1-based line number for display
    pub fn line_number(&self) -> usize {
        self.original_index + 1
    }
}

// ============================================================================
// Highlighting
// ============================================================================

/// Whether a segment of rendered text matched the search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    Matched,
}

/// A span of a rendered line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,

    /// Text of the span, in its original casing
    pub text: String,

    /// Byte offset of the span start in the source line
    pub start: usize,

    /// Byte offset one past the span end in the source line
    pub end: usize,
}

impl Segment {
    pub fn plain(text: &str, start: usize) -> Self {
        Self {
            kind: SegmentKind::Plain,
            text: text.to_string(),
            start,
            end: start + text.len(),
        }
    }

    pub fn matched(text: &str, start: usize) -> Self {
        Self {
            kind: SegmentKind::Matched,
            text: text.to_string(),
            start,
            end: start + text.len(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.kind == SegmentKind::Matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered_by_severity() {
        assert!(SeverityLevel::Text < SeverityLevel::Debug);
        assert!(SeverityLevel::Debug < SeverityLevel::Info);
        assert!(SeverityLevel::Info < SeverityLevel::Warning);
        assert!(SeverityLevel::Warning < SeverityLevel::Error);

        for (i, level) in SeverityLevel::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("ERROR".parse::<SeverityLevel>(), Ok(SeverityLevel::Error));
        assert_eq!("warn".parse::<SeverityLevel>(), Ok(SeverityLevel::Warning));
        assert_eq!(" Info ".parse::<SeverityLevel>(), Ok(SeverityLevel::Info));
        assert!("verbose".parse::<SeverityLevel>().is_err());
    }

    #[test]
    fn test_line_number_is_one_based() {
        let line = ClassifiedLine::new(0, SeverityLevel::Text, "hello".to_string());
        assert_eq!(line.line_number(), 1);
    }

    #[test]
    fn test_segment_spans() {
        let seg = Segment::matched("héllo", 3);
        assert_eq!(seg.end, 3 + "héllo".len());
        assert!(seg.is_match());
        assert!(!Segment::plain("x", 0).is_match());
    }
}
