use std::collections::BTreeSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tablog_types::{ClassifiedLine, SeverityLevel};

use crate::error::{LogError, Result};
use crate::highlight;
use crate::store::{LevelCounts, LineStore, StoreSnapshot};

/// How many lines to scan between cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// User-selected level set and search text. Matching is always
/// case-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Levels to include (empty or full = no level filter)
    allowed_levels: BTreeSet<SeverityLevel>,

    /// Substring to search for (empty = no text filter)
    search_text: String,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_levels<I>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = SeverityLevel>,
    {
        self.allowed_levels = levels.into_iter().collect();
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn allowed_levels(&self) -> &BTreeSet<SeverityLevel> {
        &self.allowed_levels
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn is_level_selected(&self, level: SeverityLevel) -> bool {
        self.allowed_levels.contains(&level)
    }

    /// Flip a level; returns whether it is now selected
    pub fn toggle_level(&mut self, level: SeverityLevel) -> bool {
        if self.allowed_levels.remove(&level) {
            false
        } else {
            self.allowed_levels.insert(level);
            true
        }
    }

    pub fn clear_levels(&mut self) {
        self.allowed_levels.clear();
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    /// A proper subset of levels is selected
    pub fn has_level_filter(&self) -> bool {
        !self.allowed_levels.is_empty() && self.allowed_levels.len() != SeverityLevel::COUNT
    }

    pub fn has_search(&self) -> bool {
        !self.search_text.is_empty()
    }

    /// Whether any predicate is active. Without one the filtered view is empty.
    pub fn is_active(&self) -> bool {
        self.has_level_filter() || self.has_search()
    }

    fn allows(&self, level: SeverityLevel) -> bool {
        !self.has_level_filter() || self.allowed_levels.contains(&level)
    }
}

/// Subsequence of a store snapshot matching a filter state
#[derive(Clone, Debug)]
pub struct FilteredView {
    snapshot: Arc<StoreSnapshot>,

    /// Strictly increasing original indices
    indices: Vec<usize>,

    state: FilterState,

    counts: LevelCounts,
}

impl FilteredView {
    /// A view over nothing
    pub fn empty() -> Self {
        Self::from_indices(Arc::new(StoreSnapshot::empty()), Vec::new(), FilterState::new())
    }

    /// Empty view over `snapshot`, standing in until a filter result for
    /// that snapshot arrives
    pub fn pending(snapshot: Arc<StoreSnapshot>, state: FilterState) -> Self {
        Self::from_indices(snapshot, Vec::new(), state)
    }

    fn from_indices(snapshot: Arc<StoreSnapshot>, indices: Vec<usize>, state: FilterState) -> Self {
        let counts = LevelCounts::from_levels(
            indices
                .iter()
                .map(|&index| snapshot.lines()[index].level),
        );
        Self {
            snapshot,
            indices,
            state,
            counts,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Entry at a view position
    pub fn get(&self, position: usize) -> Result<&ClassifiedLine> {
        let index = self.original_index(position)?;
        self.snapshot.get(index)
    }

    /// Store index of the entry at a view position
    pub fn original_index(&self, position: usize) -> Result<usize> {
        self.indices
            .get(position)
            .copied()
            .ok_or_else(|| LogError::out_of_range(position, self.indices.len()))
    }

    /// View position of a store index, if that line is in the view
    pub fn position_of(&self, original_index: usize) -> Option<usize> {
        self.indices.binary_search(&original_index).ok()
    }

    /// View position of the first entry at or after a store index
    pub fn position_at_or_after(&self, original_index: usize) -> usize {
        self.indices.partition_point(|&index| index < original_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedLine> + '_ {
        let lines = self.snapshot.lines();
        self.indices.iter().map(move |&index| &lines[index])
    }

    /// Entries in a range of view positions, clamped to the end
    pub fn range(&self, start: usize, count: usize) -> impl Iterator<Item = &ClassifiedLine> + '_ {
        self.iter().skip(start).take(count)
    }

    pub fn original_indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn level_counts(&self) -> LevelCounts {
        self.counts
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.state
    }

    /// Generation of the snapshot this view was computed from
    pub fn generation(&self) -> u64 {
        self.snapshot.generation()
    }
}

impl Default for FilteredView {
    fn default() -> Self {
        Self::empty()
    }
}

/// Derives filtered views with a single linear scan
pub struct FilterEngine;

impl FilterEngine {
    /// Filter the current contents of a store
    pub fn apply(store: &LineStore, state: &FilterState) -> FilteredView {
        Self::apply_snapshot(&store.snapshot(), state)
    }

    pub fn apply_snapshot(snapshot: &Arc<StoreSnapshot>, state: &FilterState) -> FilteredView {
        match Self::scan(snapshot, state, None) {
            Some(view) => view,
            None => unreachable!("scan without a token never cancels"),
        }
    }

    /// Like [`FilterEngine::apply_snapshot`], returning `None` once the token is cancelled
    pub fn apply_cancellable(
        snapshot: &Arc<StoreSnapshot>,
        state: &FilterState,
        cancel: &CancellationToken,
    ) -> Option<FilteredView> {
        Self::scan(snapshot, state, Some(cancel))
    }

    fn scan(
        snapshot: &Arc<StoreSnapshot>,
        state: &FilterState,
        cancel: Option<&CancellationToken>,
    ) -> Option<FilteredView> {
        // No criteria means nothing is shown, distinct from "matches everything"
        if !state.is_active() {
            return Some(FilteredView::from_indices(
                Arc::clone(snapshot),
                Vec::new(),
                state.clone(),
            ));
        }

        let needle = highlight::fold(&state.search_text);
        let mut indices = Vec::new();

        for (index, line) in snapshot.lines().iter().enumerate() {
            if index % CANCEL_CHECK_INTERVAL == 0 && cancel.is_some_and(|c| c.is_cancelled()) {
                return None;
            }
            if !state.allows(line.level) {
                continue;
            }
            if !needle.is_empty() && !snapshot.folded(index).contains(needle.as_str()) {
                continue;
            }
            indices.push(index);
        }

        Some(FilteredView::from_indices(
            Arc::clone(snapshot),
            indices,
            state.clone(),
        ))
    }
}
