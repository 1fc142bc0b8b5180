use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use tablog_types::{ClassifiedLine, SeverityLevel};

use crate::error::{LogError, Result};
use crate::highlight;

/// Source of snapshot generations, shared by every store in the process
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Counts per severity level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    counts: [usize; SeverityLevel::COUNT],
}

impl LevelCounts {
    pub fn from_levels<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = SeverityLevel>,
    {
        let mut counts = Self::default();
        for level in levels {
            counts.counts[level.index()] += 1;
        }
        counts
    }

    pub fn get(&self, level: SeverityLevel) -> usize {
        self.counts[level.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Counts in ascending severity order
    pub fn iter(&self) -> impl Iterator<Item = (SeverityLevel, usize)> + '_ {
        SeverityLevel::ALL
            .iter()
            .map(|level| (*level, self.counts[level.index()]))
    }
}

/// Immutable published contents of a [`LineStore`]
#[derive(Debug)]
pub struct StoreSnapshot {
    /// Unique, increasing across all snapshots
    generation: u64,

    lines: Vec<ClassifiedLine>,

    /// Case-folded text per line, for case-insensitive filtering
    folded: Vec<String>,

    counts: LevelCounts,
}

impl StoreSnapshot {
    /// Build a snapshot. Lines must be indexed by position.
    pub fn new(lines: Vec<ClassifiedLine>) -> Self {
        debug_assert!(
            lines
                .iter()
                .enumerate()
                .all(|(i, line)| line.original_index == i)
        );
        let folded = lines.iter().map(|line| highlight::fold(&line.text)).collect();
        let counts = LevelCounts::from_levels(lines.iter().map(|line| line.level));

        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            lines,
            folded,
            counts,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&ClassifiedLine> {
        self.lines
            .get(index)
            .ok_or_else(|| LogError::out_of_range(index, self.lines.len()))
    }

    pub fn lines(&self) -> &[ClassifiedLine] {
        &self.lines
    }

    /// Lines in a range (for virtual scrolling), clamped to the end
    pub fn range(&self, start: usize, count: usize) -> &[ClassifiedLine] {
        let start = start.min(self.lines.len());
        let end = start.saturating_add(count).min(self.lines.len());
        &self.lines[start..end]
    }

    pub(crate) fn folded(&self, index: usize) -> &str {
        &self.folded[index]
    }

    pub fn level_counts(&self) -> LevelCounts {
        self.counts
    }
}

/// Holds the classified lines of one session.
///
/// Replacement is a single pointer swap of a fully built snapshot, so readers
/// see either the old or the new contents in full. Clones share the store.
#[derive(Clone)]
pub struct LineStore {
    current: Arc<RwLock<Arc<StoreSnapshot>>>,
}

impl LineStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(StoreSnapshot::empty()))),
        }
    }

    /// Replace the contents wholesale
    pub fn replace(&self, lines: Vec<ClassifiedLine>) -> Arc<StoreSnapshot> {
        let snapshot = Arc::new(StoreSnapshot::new(lines));
        self.publish(Arc::clone(&snapshot));
        snapshot
    }

    /// Publish a snapshot built elsewhere
    pub fn publish(&self, snapshot: Arc<StoreSnapshot>) {
        *self.current.write() = snapshot;
    }

    /// Current contents (cheap Arc clone)
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn get(&self, index: usize) -> Result<ClassifiedLine> {
        self.snapshot().get(index).cloned()
    }

    pub fn count(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation()
    }

    pub fn level_counts(&self) -> LevelCounts {
        self.current.read().level_counts()
    }
}

impl Default for LineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("LineStore")
            .field("generation", &snapshot.generation())
            .field("count", &snapshot.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn make_lines(tag: &str, n: usize) -> Vec<ClassifiedLine> {
        (0..n)
            .map(|i| ClassifiedLine::new(i, SeverityLevel::Info, format!("{}-{}", tag, i)))
            .collect()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = LineStore::new();
        assert_eq!(store.count(), 0);
        assert!(store.is_empty());
        assert!(matches!(
            store.get(0),
            Err(LogError::OutOfRange { index: 0, count: 0 })
        ));
    }

    #[test]
    fn test_replace_and_get() {
        let store = LineStore::new();
        store.replace(make_lines("a", 3));
        assert_eq!(store.count(), 3);
        assert_eq!(store.get(2).unwrap().text, "a-2");
        assert!(store.get(3).is_err());

        store.replace(make_lines("b", 1));
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(0).unwrap().text, "b-0");
    }

    #[test]
    fn test_generation_increases() {
        let store = LineStore::new();
        let first = store.generation();
        store.replace(make_lines("a", 1));
        let second = store.generation();
        assert!(second > first);
    }

    #[test]
    fn test_level_counts() {
        let lines = vec![
            ClassifiedLine::new(0, SeverityLevel::Error, "e".into()),
            ClassifiedLine::new(1, SeverityLevel::Text, "t".into()),
            ClassifiedLine::new(2, SeverityLevel::Error, "e".into()),
        ];
        let store = LineStore::new();
        store.replace(lines);
        let counts = store.level_counts();
        assert_eq!(counts.get(SeverityLevel::Error), 2);
        assert_eq!(counts.get(SeverityLevel::Text), 1);
        assert_eq!(counts.get(SeverityLevel::Debug), 0);
        assert_eq!(counts.total(), store.count());
    }

    #[test]
    fn test_range_clamps() {
        let snapshot = StoreSnapshot::new(make_lines("a", 5));
        assert_eq!(snapshot.range(3, 10).len(), 2);
        assert!(snapshot.range(9, 2).is_empty());
    }

    #[test]
    fn test_held_snapshot_survives_replace() {
        let store = LineStore::new();
        store.replace(make_lines("old", 2));
        let held = store.snapshot();
        store.replace(make_lines("new", 5));
        assert_eq!(held.len(), 2);
        assert_eq!(held.get(1).unwrap().text, "old-1");
        assert_eq!(store.count(), 5);
    }

    #[test]
    fn test_concurrent_replace_is_atomic() {
        let store = LineStore::new();
        store.replace(make_lines("a", 100));
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Relaxed) {
                        let snapshot = store.snapshot();
                        let expected_len = if snapshot.get(0).unwrap().text.starts_with("a-") {
                            100
                        } else {
                            37
                        };
                        assert_eq!(snapshot.len(), expected_len);
                        let tag = &snapshot.get(0).unwrap().text[..2];
                        assert!(snapshot.lines().iter().all(|l| l.text.starts_with(tag)));

                        let line = store.get(10).unwrap();
                        assert!(line.text == "a-10" || line.text == "b-10");
                    }
                });
            }

            for round in 0..500 {
                if round % 2 == 0 {
                    store.replace(make_lines("b", 37));
                } else {
                    store.replace(make_lines("a", 100));
                }
            }
            done.store(true, Ordering::Relaxed);
        });
    }
}
