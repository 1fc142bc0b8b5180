//! Per-file session: load → classify → publish → filter.
//!
//! Heavy work runs on blocking worker threads and reports back through a
//! channel. Every request carries a monotonically increasing id; only the
//! most recent load and the most recent filter are ever applied, and a filter
//! result is only applied to the store generation it was computed from.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::classifier::{Classifier, classify_plain};
use crate::filter::{FilterEngine, FilterState, FilteredView};
use crate::rules::RuleSet;
use crate::source::{LineSource, failure_lines};
use crate::store::{LevelCounts, LineStore, StoreSnapshot};

/// Per-session request sequence number
pub type RequestId = u64;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a session (tab) on a shared event channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Result of background work, delivered to [`Session::handle_event`]
#[derive(Debug)]
pub enum SessionEvent {
    Loaded {
        session: SessionId,
        request: RequestId,
        snapshot: Arc<StoreSnapshot>,
    },
    Filtered {
        session: SessionId,
        request: RequestId,
        view: Arc<FilteredView>,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::Loaded { session, .. } | Self::Filtered { session, .. } => *session,
        }
    }

    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Loaded { request, .. } | Self::Filtered { request, .. } => *request,
        }
    }
}

/// One open log with its own store, filter state and filtered view
pub struct Session {
    id: SessionId,
    source: Arc<dyn LineSource>,
    classifier: Classifier,
    store: LineStore,
    view: Arc<FilteredView>,
    filter: FilterState,

    /// Last id handed out
    next_request: RequestId,

    /// Newest load request; older results are dropped
    latest_load: RequestId,

    /// Newest filter request; older results are dropped
    latest_filter: RequestId,

    load_cancel: CancellationToken,
    filter_cancel: CancellationToken,
    loading: bool,
    filtering: bool,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    pub fn new(
        source: Arc<dyn LineSource>,
        rules: Arc<RuleSet>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            id: SessionId::next(),
            source,
            classifier: Classifier::new(rules),
            store: LineStore::new(),
            view: Arc::new(FilteredView::empty()),
            filter: FilterState::new(),
            next_request: 0,
            latest_load: 0,
            latest_filter: 0,
            load_cancel: CancellationToken::new(),
            filter_cancel: CancellationToken::new(),
            loading: false,
            filtering: false,
            events,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub fn store(&self) -> &LineStore {
        &self.store
    }

    pub fn view(&self) -> &Arc<FilteredView> {
        &self.view
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    pub fn level_counts(&self) -> LevelCounts {
        self.store.level_counts()
    }

    pub fn filtered_counts(&self) -> LevelCounts {
        self.view.level_counts()
    }

    /// Start loading the source in the background. Supersedes any in-flight
    /// load or filter. Must be called inside a Tokio runtime.
    pub fn load(&mut self) -> RequestId {
        self.cancel_pending();
        let request = self.next_request_id();
        self.latest_load = request;
        self.loading = true;

        let session = self.id;
        let source = Arc::clone(&self.source);
        let classifier = self.classifier.clone();
        let cancel = self.load_cancel.clone();
        let events = self.events.clone();

        tokio::task::spawn_blocking(move || {
            match build_snapshot(source.as_ref(), &classifier, &cancel) {
                Some(snapshot) => {
                    let _ = events.send(SessionEvent::Loaded {
                        session,
                        request,
                        snapshot,
                    });
                }
                None => tracing::debug!(request, "load cancelled"),
            }
        });

        request
    }

    /// Re-read the source from scratch
    pub fn reload(&mut self) -> RequestId {
        self.load()
    }

    /// Recompute the filtered view in the background for a new filter state.
    /// Must be called inside a Tokio runtime.
    pub fn set_filter(&mut self, state: FilterState) -> RequestId {
        self.filter = state;
        self.filter_cancel.cancel();
        self.filter_cancel = CancellationToken::new();

        let request = self.next_request_id();
        self.latest_filter = request;
        self.filtering = true;

        let session = self.id;
        let snapshot = self.store.snapshot();
        let state = self.filter.clone();
        let cancel = self.filter_cancel.clone();
        let events = self.events.clone();

        tokio::task::spawn_blocking(move || {
            match FilterEngine::apply_cancellable(&snapshot, &state, &cancel) {
                Some(view) => {
                    let _ = events.send(SessionEvent::Filtered {
                        session,
                        request,
                        view: Arc::new(view),
                    });
                }
                None => tracing::debug!(request, "filter cancelled"),
            }
        });

        request
    }

    /// Re-run the current filter state (after a reload)
    pub fn refilter(&mut self) -> RequestId {
        self.set_filter(self.filter.clone())
    }

    /// Apply a background result. Returns false if the result was stale and
    /// discarded.
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        if event.session_id() != self.id {
            tracing::debug!(session = ?self.id, other = ?event.session_id(), "event for another session");
            return false;
        }

        match event {
            SessionEvent::Loaded {
                request, snapshot, ..
            } => {
                if request != self.latest_load {
                    tracing::debug!(request, latest = self.latest_load, "discarding stale load");
                    return false;
                }
                // The old view indexes the old snapshot; never pair it with the new one
                self.view = Arc::new(FilteredView::pending(
                    Arc::clone(&snapshot),
                    self.filter.clone(),
                ));
                self.store.publish(snapshot);
                self.loading = false;
                self.refilter();
                true
            }
            SessionEvent::Filtered { request, view, .. } => {
                if request != self.latest_filter {
                    tracing::debug!(
                        request,
                        latest = self.latest_filter,
                        "discarding stale filter result"
                    );
                    return false;
                }
                if view.generation() != self.store.generation() {
                    tracing::debug!(request, "discarding filter result for replaced store");
                    return false;
                }
                self.view = view;
                self.filtering = false;
                true
            }
        }
    }

    /// Load synchronously on the calling thread
    pub fn load_now(&mut self) {
        self.cancel_pending();
        self.latest_load = self.next_request_id();

        let cancel = CancellationToken::new();
        if let Some(snapshot) = build_snapshot(self.source.as_ref(), &self.classifier, &cancel) {
            self.store.publish(snapshot);
        }
        self.loading = false;
        self.apply_filter_now(self.filter.clone());
    }

    /// Filter synchronously on the calling thread
    pub fn apply_filter_now(&mut self, state: FilterState) -> &Arc<FilteredView> {
        self.filter_cancel.cancel();
        self.filter_cancel = CancellationToken::new();
        self.latest_filter = self.next_request_id();
        self.filter = state;
        self.view = Arc::new(FilterEngine::apply(&self.store, &self.filter));
        self.filtering = false;
        &self.view
    }

    fn cancel_pending(&mut self) {
        self.load_cancel.cancel();
        self.filter_cancel.cancel();
        self.load_cancel = CancellationToken::new();
        self.filter_cancel = CancellationToken::new();
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        self.next_request
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.load_cancel.cancel();
        self.filter_cancel.cancel();
    }
}

/// Read and classify a source off to the side. Source failures become a
/// single Error line; `None` means the work was cancelled.
fn build_snapshot(
    source: &dyn LineSource,
    classifier: &Classifier,
    cancel: &CancellationToken,
) -> Option<Arc<StoreSnapshot>> {
    let started = Instant::now();
    let name = source.describe();

    let lines = match source.read_lines() {
        Ok(lines) if source.should_classify() => {
            classifier.classify_all_cancellable(lines, cancel)?
        }
        Ok(lines) => classify_plain(lines),
        Err(err) => {
            tracing::warn!(source = %name, error = %err, "line source unavailable");
            failure_lines(&err)
        }
    };

    if cancel.is_cancelled() {
        return None;
    }

    let snapshot = StoreSnapshot::new(lines);
    tracing::info!(
        source = %name,
        lines = snapshot.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "loaded"
    );
    Some(Arc::new(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::source::MemorySource;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tablog_types::SeverityLevel;
    use tokio::time::timeout;

    const TIMEOUT_MS: u64 = 2000;

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        timeout(Duration::from_millis(TIMEOUT_MS), rx.recv())
            .await
            .expect("session event timed out")
            .expect("event channel closed unexpectedly")
    }

    fn memory_session(
        lines: &[&str],
    ) -> (Session, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Arc::new(MemorySource::new("mem", lines.iter().copied()));
        (Session::new(source, Arc::new(RuleSet::default()), tx), rx)
    }

    /// Applies events until the given request has been handled
    async fn settle(
        session: &mut Session,
        rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
        request: RequestId,
    ) {
        loop {
            let event = next_event(rx).await;
            let id = event.request_id();
            let applied = session.handle_event(event);
            if id == request && applied {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_load_populates_store() {
        let (mut session, mut rx) = memory_session(&["ERROR: disk full", "plain", "DEBUG x"]);
        let request = session.load();
        assert!(session.is_loading());

        settle(&mut session, &mut rx, request).await;
        assert!(!session.is_loading());
        assert_eq!(session.store().count(), 3);
        assert_eq!(
            session.store().get(0).unwrap().level,
            SeverityLevel::Error
        );
        assert_eq!(session.level_counts().total(), 3);
    }

    #[tokio::test]
    async fn test_filter_after_load() {
        let (mut session, mut rx) = memory_session(&["ERROR: a", "INFO b", "ERROR: c"]);
        let load = session.load();
        settle(&mut session, &mut rx, load).await;

        let request = session.set_filter(FilterState::new().with_levels([SeverityLevel::Error]));
        settle(&mut session, &mut rx, request).await;
        assert_eq!(session.view().original_indices(), &[0, 2]);
        assert_eq!(session.filtered_counts().get(SeverityLevel::Error), 2);
    }

    #[tokio::test]
    async fn test_load_reapplies_current_filter() {
        let (mut session, mut rx) = memory_session(&["ERROR: a", "INFO b"]);
        session.set_filter(FilterState::new().with_search("info"));
        let load = session.load();
        settle(&mut session, &mut rx, load).await;

        // The load re-issued the filter; wait for it
        let refilter = session.latest_filter;
        settle(&mut session, &mut rx, refilter).await;
        assert_eq!(session.view().len(), 1);
        assert_eq!(session.view().get(0).unwrap().text, "INFO b");
    }

    #[tokio::test]
    async fn test_stale_filter_result_is_discarded() {
        let (mut session, mut rx) = memory_session(&["alpha", "beta", "gamma"]);
        let load = session.load();
        settle(&mut session, &mut rx, load).await;

        let first = session.set_filter(FilterState::new().with_search("alpha"));
        let second = session.set_filter(FilterState::new().with_search("beta"));
        assert!(second > first);
        settle(&mut session, &mut rx, second).await;
        assert_eq!(session.view().filter_state().search_text(), "beta");

        // A late result for the first request must not win
        let stale = FilterEngine::apply(
            session.store(),
            &FilterState::new().with_search("alpha"),
        );
        let applied = session.handle_event(SessionEvent::Filtered {
            session: session.id(),
            request: first,
            view: Arc::new(stale),
        });
        assert!(!applied);
        assert_eq!(session.view().filter_state().search_text(), "beta");
        assert_eq!(session.view().get(0).unwrap().text, "beta");

        // Drain anything the first worker produced; it is rejected as well
        while let Ok(Some(event)) = timeout(Duration::from_millis(50), rx.recv()).await {
            assert!(!session.handle_event(event));
        }
        assert_eq!(session.view().filter_state().search_text(), "beta");
    }

    #[tokio::test]
    async fn test_filter_for_replaced_store_is_discarded() {
        let (mut session, mut rx) = memory_session(&["alpha"]);
        let load = session.load();
        settle(&mut session, &mut rx, load).await;
        let old_snapshot = session.store().snapshot();

        session.load_now();
        let request = session.set_filter(FilterState::new().with_search("alpha"));
        // Fabricate the same request computed on the old snapshot
        let view = FilterEngine::apply_snapshot(
            &old_snapshot,
            &FilterState::new().with_search("alpha"),
        );
        assert!(!session.handle_event(SessionEvent::Filtered {
            session: session.id(),
            request,
            view: Arc::new(view),
        }));
    }

    /// Serves stale lines slowly until `fresh` is set
    struct SwitchingSource {
        fresh: Arc<AtomicBool>,
    }

    impl LineSource for SwitchingSource {
        fn describe(&self) -> String {
            "switching".to_string()
        }

        fn read_lines(&self) -> Result<Vec<String>> {
            if self.fresh.load(Ordering::SeqCst) {
                Ok(vec!["ERROR new".to_string(), "INFO new".to_string()])
            } else {
                std::thread::sleep(Duration::from_millis(200));
                Ok(vec!["INFO old".to_string()])
            }
        }
    }

    #[tokio::test]
    async fn test_superseded_load_never_applies() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fresh = Arc::new(AtomicBool::new(false));
        let source = Arc::new(SwitchingSource {
            fresh: Arc::clone(&fresh),
        });
        let mut session = Session::new(source, Arc::new(RuleSet::default()), tx);

        let first = session.load();
        fresh.store(true, Ordering::SeqCst);
        let second = session.reload();
        assert!(second > first);

        settle(&mut session, &mut rx, second).await;
        assert_eq!(session.store().count(), 2);

        while let Ok(Some(event)) = timeout(Duration::from_millis(400), rx.recv()).await {
            if let SessionEvent::Loaded { request, .. } = &event {
                assert_eq!(*request, first);
                assert!(!session.handle_event(event));
            } else {
                session.handle_event(event);
            }
        }
        assert_eq!(session.store().get(0).unwrap().text, "ERROR new");
    }

    /// Serves one of two contents, without delay
    struct ToggledSource {
        fresh: Arc<AtomicBool>,
    }

    impl LineSource for ToggledSource {
        fn describe(&self) -> String {
            "toggled".to_string()
        }

        fn read_lines(&self) -> Result<Vec<String>> {
            let lines: &[&str] = if self.fresh.load(Ordering::SeqCst) {
                &["INFO x", "INFO y", "ERROR z"]
            } else {
                &["ERROR a", "INFO b"]
            };
            Ok(lines.iter().map(|l| l.to_string()).collect())
        }
    }

    #[tokio::test]
    async fn test_view_matches_store_as_soon_as_load_applies() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fresh = Arc::new(AtomicBool::new(false));
        let source = Arc::new(ToggledSource {
            fresh: Arc::clone(&fresh),
        });
        let mut session = Session::new(source, Arc::new(RuleSet::default()), tx);
        session.load_now();
        session.apply_filter_now(FilterState::new().with_levels([SeverityLevel::Error]));
        assert_eq!(session.view().original_indices(), &[0]);

        fresh.store(true, Ordering::SeqCst);
        let load = session.reload();
        let event = next_event(&mut rx).await;
        assert!(matches!(event, SessionEvent::Loaded { request, .. } if request == load));
        assert!(session.handle_event(event));

        // Before the re-issued filter comes back
        assert_eq!(session.view().generation(), session.store().generation());
        for entry in session.view().iter() {
            let original = session.store().get(entry.original_index).unwrap();
            assert_eq!(original.text, entry.text);
            assert_eq!(original.level, entry.level);
        }

        let refilter = session.latest_filter;
        settle(&mut session, &mut rx, refilter).await;
        assert_eq!(session.view().original_indices(), &[2]);
        assert_eq!(session.view().get(0).unwrap().text, "ERROR z");
    }

    #[tokio::test]
    async fn test_failed_source_yields_error_line() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let source = Arc::new(crate::source::FileSource::new("/nonexistent/tablog/app.log"));
        let mut session = Session::new(source, Arc::new(RuleSet::default()), tx);

        let request = session.load();
        settle(&mut session, &mut rx, request).await;
        assert_eq!(session.store().count(), 1);
        let line = session.store().get(0).unwrap();
        assert_eq!(line.level, SeverityLevel::Error);
        assert!(line.text.starts_with("File not found"));
    }

    #[test]
    fn test_event_for_other_session_is_ignored() {
        let (mut a, _rx_a) = memory_session(&["x"]);
        let (b, _rx_b) = memory_session(&["y"]);
        assert_ne!(a.id(), b.id());
        let event = SessionEvent::Filtered {
            session: b.id(),
            request: 1,
            view: Arc::new(FilteredView::empty()),
        };
        assert!(!a.handle_event(event));
    }

    #[test]
    fn test_synchronous_pipeline() {
        let (mut session, _rx) = memory_session(&["WARNING: low disk", "ok", "[WARN ] again"]);
        session.load_now();
        assert_eq!(session.store().count(), 3);
        assert!(session.view().is_empty());

        let view = session.apply_filter_now(FilterState::new().with_levels([SeverityLevel::Warning]));
        assert_eq!(view.original_indices(), &[0, 2]);
    }

    #[test]
    fn test_plain_source_is_not_classified() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let source = Arc::new(MemorySource::new("notes", ["ERROR: looks bad"]).classify(false));
        let mut session = Session::new(source, Arc::new(RuleSet::default()), tx);
        session.load_now();
        assert_eq!(session.store().get(0).unwrap().level, SeverityLevel::Text);
    }
}
