//! Log processing for tablog
//!
//! This crate provides severity classification, the line store, filtering,
//! search highlighting, line sources and the per-file session pipeline.

mod classifier;
mod config;
mod error;
mod filter;
pub mod highlight;
mod rules;
mod session;
mod source;
mod store;

pub use classifier::{Classifier, classify_plain};
pub use config::{LevelRuleSpec, RulesConfig};
pub use error::{LogError, Result};
pub use filter::{FilterEngine, FilterState, FilteredView};
pub use rules::{Rule, RuleSet, RuleSetBuilder};
pub use session::{RequestId, Session, SessionEvent, SessionId};
pub use source::{
    FileSource, LineSource, MemorySource, failure_lines, is_log_path, referenced_logs, split_lines,
    strip_ansi,
};
pub use store::{LevelCounts, LineStore, StoreSnapshot};

// Re-export types used in our public API
pub use tablog_types::{ClassifiedLine, Segment, SegmentKind, SeverityLevel};
