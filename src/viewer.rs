//! Viewer: the single-threaded coordinator.
//!
//! The viewer owns the cursor, the log store, the follow controller, and
//! the loading flag, and ties them to the fetch actor and poll timer. All
//! mutation happens inside [`Viewer::process_pending`], called from the
//! presentation loop, so there is no locking discipline beyond processing
//! events in arrival order.
//!
//! Lifecycle mirrors a mount/unmount pair: [`Viewer::mount`] spawns the
//! worker threads and issues the immediate first poll; [`Viewer::unmount`]
//! stops the timer and marks the fetcher inactive, so a poll that resolves
//! afterwards mutates nothing.

use crate::feed::{
    Cursor, FeedError, FetchActor, FetchCompletion, FetchOutcome, PollTimer, TelemetryEntry,
    Transport,
};
use crate::store::LogStore;
use crate::view::{FollowConfig, FollowController, LineMetrics, ScrollGeometry};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::time::Duration;

/// Configuration for the viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Polling cadence. The first poll fires immediately on mount, the
    /// next one after this period.
    pub update_period: Duration,
    /// Retain at most this many entries, evicting oldest. `None` keeps
    /// everything received.
    pub max_entries: Option<usize>,
    /// Re-enter auto-follow when the user scrolls back to the bottom.
    pub resume_at_bottom: bool,
    /// Capacity of the status notification channel.
    pub status_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            update_period: Duration::from_millis(5000),
            max_entries: None,
            resume_at_bottom: false,
            status_capacity: 16,
        }
    }
}

/// Notification pushed once per successful merge, for an external status
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Number of entries the merge appended.
    pub appended: usize,
}

/// Events surfaced to the presentation loop by `process_pending`.
#[derive(Debug)]
pub enum ViewerEvent {
    /// New entries were merged into the store. Re-render, and if the
    /// controller is following, apply [`Viewer::auto_scroll_target`].
    Appended {
        /// Number of entries appended.
        count: usize,
    },
    /// A poll failed; the guard was released and the next tick retries.
    FetchFailed(FeedError),
}

/// The telemetry log viewer.
pub struct Viewer {
    /// Poll timer actor.
    timer: PollTimer,
    /// Fetch actor.
    fetcher: FetchActor,
    /// Fetch completion receiver.
    outcome_rx: Receiver<FetchCompletion>,
    /// Status notification sender.
    status_tx: Sender<StatusChange>,
    /// Status notification receiver, until a collaborator takes it.
    status_rx: Option<Receiver<StatusChange>>,
    /// Ordered log store.
    store: LogStore,
    /// Follow/position controller.
    follow: FollowController,
    /// Cursor to resume the next poll from.
    cursor: Cursor,
    /// True until the first successful merge.
    loading: bool,
    /// Most recent poll failure, cleared by the next successful poll.
    last_error: Option<String>,
}

impl Viewer {
    /// Mount the viewer.
    ///
    /// Spawns the fetch worker and poll timer and issues the immediate
    /// first poll, from the beginning of the feed.
    pub fn mount(transport: Box<dyn Transport>, config: ViewerConfig) -> Self {
        let (outcome_tx, outcome_rx) = bounded(8);
        let (status_tx, status_rx) = bounded(config.status_capacity);

        let fetcher = FetchActor::spawn(transport, outcome_tx);
        let timer = PollTimer::spawn(config.update_period);
        let store = config
            .max_entries
            .map_or_else(LogStore::new, LogStore::with_capacity_limit);
        let follow = FollowController::with_config(FollowConfig {
            resume_at_bottom: config.resume_at_bottom,
        });

        let viewer = Self {
            timer,
            fetcher,
            outcome_rx,
            status_tx,
            status_rx: Some(status_rx),
            store,
            follow,
            cursor: None,
            loading: true,
            last_error: None,
        };

        // First poll fires on mount, not after the first period.
        viewer.fetcher.request_poll(viewer.cursor.clone());
        viewer
    }

    /// Take the status notification receiver.
    ///
    /// Returns `None` after the first call; there is one collaborator.
    pub fn take_status_receiver(&mut self) -> Option<Receiver<StatusChange>> {
        self.status_rx.take()
    }

    /// Drain pending fetch completions and timer ticks.
    ///
    /// Completions are applied first, in arrival order, so a tick
    /// drained in the same cycle polls with every already-delivered
    /// cursor advance included. Each tick dispatches one poll unless
    /// one is already outstanding (the dropped tick is a silent no-op).
    /// The resulting events are returned for the presentation loop.
    pub fn process_pending(&mut self) -> Vec<ViewerEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.outcome_rx.try_recv() {
            if let Some(event) = self.apply(completion) {
                events.push(event);
            }
        }

        while self.timer.receiver().try_recv().is_ok() {
            self.fetcher.request_poll(self.cursor.clone());
        }
        events
    }

    /// Apply one fetch completion.
    ///
    /// The completion holds the in-flight guard; it drops (releasing
    /// the guard) only after the cursor advance below has landed, so no
    /// tick can dispatch a poll with a stale cursor in between.
    fn apply(&mut self, completion: FetchCompletion) -> Option<ViewerEvent> {
        match completion.outcome {
            FetchOutcome::Batch(batch) => {
                let count = batch.entries.len();
                self.store.append(batch.entries);
                self.cursor = Some(batch.next_cursor);
                self.loading = false;
                self.last_error = None;

                // Non-blocking: a slow collaborator must not stall merges.
                let _ = self.status_tx.try_send(StatusChange { appended: count });

                Some(ViewerEvent::Appended { count })
            }
            FetchOutcome::Empty => {
                self.last_error = None;
                None
            }
            FetchOutcome::Failed(err) => {
                self.last_error = Some(err.to_string());
                Some(ViewerEvent::FetchFailed(err))
            }
        }
    }

    /// Forward a user scroll event to the follow controller.
    pub fn handle_scroll(&mut self, geometry: ScrollGeometry) {
        self.follow.on_scroll(geometry);
    }

    /// The scroll position to apply after a merge, if auto-following.
    ///
    /// Call with post-merge geometry when processing
    /// [`ViewerEvent::Appended`]; also records the new anchor.
    pub fn auto_scroll_target(&mut self, geometry: ScrollGeometry) -> Option<f64> {
        self.follow.after_append(geometry)
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &TelemetryEntry> {
        self.store.iter()
    }

    /// The ordered log store.
    pub const fn store(&self) -> &LogStore {
        &self.store
    }

    /// Whether the viewport auto-scrolls on merges.
    pub fn is_following(&self) -> bool {
        self.follow.is_following()
    }

    /// Line metrics from the most recent scroll event.
    pub const fn line_metrics(&self) -> Option<LineMetrics> {
        self.follow.metrics()
    }

    /// True until the first successful merge.
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Cursor the next poll will resume from.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Most recent poll failure, if the latest poll did not succeed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Unmount the viewer.
    ///
    /// Stops the timer and marks the fetcher inactive. An in-flight fetch
    /// is not cancelled; its completion is dropped by the worker, so no
    /// state is mutated after this call.
    pub fn unmount(self) {
        let Self { timer, fetcher, .. } = self;
        timer.join();
        fetcher.deactivate();
        drop(fetcher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedResponse;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Instant;

    const FAST_PERIOD: Duration = Duration::from_millis(10);
    const WAIT: Duration = Duration::from_millis(2000);

    fn entry(id: &str) -> TelemetryEntry {
        TelemetryEntry {
            id: id.to_string(),
            timestamp: format!("t{id}"),
            hostname: "host".to_string(),
            brief: "event".to_string(),
        }
    }

    fn batch(ids: &[&str], cursor: &str) -> Result<FeedResponse, FeedError> {
        Ok(FeedResponse {
            telemetries: Some(ids.iter().copied().map(entry).collect()),
            timestamp: Some(cursor.to_string()),
        })
    }

    #[derive(Clone)]
    struct ScriptedTransport {
        responses: Arc<Mutex<VecDeque<Result<FeedResponse, FeedError>>>>,
        seen_cursors: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<FeedResponse, FeedError>>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into())),
                seen_cursors: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn fetch_feed(&self, cursor: Option<&str>) -> Result<FeedResponse, FeedError> {
            self.seen_cursors
                .lock()
                .unwrap()
                .push(cursor.map(str::to_owned));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(FeedResponse::default()))
        }
    }

    /// Blocks every fetch until the test releases it, recording the
    /// cursor each poll asked for. A closed gate answers "nothing new".
    struct GatedTransport {
        gate: Receiver<Result<FeedResponse, FeedError>>,
        seen_cursors: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl Transport for GatedTransport {
        fn fetch_feed(&self, cursor: Option<&str>) -> Result<FeedResponse, FeedError> {
            self.seen_cursors
                .lock()
                .unwrap()
                .push(cursor.map(str::to_owned));
            self.gate
                .recv()
                .unwrap_or_else(|_| Ok(FeedResponse::default()))
        }
    }

    fn fast_config() -> ViewerConfig {
        ViewerConfig {
            update_period: FAST_PERIOD,
            ..ViewerConfig::default()
        }
    }

    /// Pump the viewer until `predicate` holds, collecting events.
    fn pump_until(
        viewer: &mut Viewer,
        mut predicate: impl FnMut(&Viewer, &[ViewerEvent]) -> bool,
    ) -> Vec<ViewerEvent> {
        let deadline = Instant::now() + WAIT;
        let mut events = Vec::new();
        loop {
            events.extend(viewer.process_pending());
            if predicate(viewer, &events) {
                return events;
            }
            assert!(Instant::now() < deadline, "timed out; events: {events:?}");
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn appended_count(events: &[ViewerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, ViewerEvent::Appended { .. }))
            .count()
    }

    #[test]
    fn test_initial_mount_scenario() {
        // Immediate poll with no cursor; one entry merged; following,
        // pinned, loading cleared, status fired exactly once.
        let transport = ScriptedTransport::new(vec![batch(&["1"], "t1")]);
        let seen = transport.seen_cursors.clone();
        let mut viewer = Viewer::mount(Box::new(transport), fast_config());
        let status_rx = viewer.take_status_receiver().unwrap();

        assert!(viewer.is_loading());

        pump_until(&mut viewer, |_, events| appended_count(events) >= 1);

        assert_eq!(seen.lock().unwrap()[0], None);
        assert_eq!(viewer.store().len(), 1);
        assert!(viewer.is_following());
        assert!(!viewer.is_loading());
        assert_eq!(viewer.cursor(), Some("t1"));

        let pin = viewer.auto_scroll_target(ScrollGeometry {
            scroll_top: 0.0,
            scroll_height: 500.0,
            client_height: 100.0,
            line_height: 20.0,
        });
        assert_eq!(pin, Some(400.0));

        assert_eq!(
            status_rx.recv_timeout(WAIT).unwrap(),
            StatusChange { appended: 1 }
        );
        assert!(status_rx.try_recv().is_err());

        viewer.unmount();
    }

    #[test]
    fn test_cursor_monotonicity() {
        let transport = ScriptedTransport::new(vec![
            batch(&["1"], "t1"),
            batch(&["2"], "t2"),
            batch(&["3"], "t3"),
        ]);
        let seen = transport.seen_cursors.clone();
        let mut viewer = Viewer::mount(Box::new(transport), fast_config());

        pump_until(&mut viewer, |v, _| v.store().len() >= 3);

        // Each poll resumed from the cursor the previous one returned.
        let cursors = seen.lock().unwrap();
        assert_eq!(cursors[0], None);
        assert_eq!(cursors[1].as_deref(), Some("t1"));
        assert_eq!(cursors[2].as_deref(), Some("t2"));

        let ids: Vec<_> = viewer.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);

        viewer.unmount();
    }

    #[test]
    fn test_pending_tick_polls_with_the_merged_cursor() {
        // A completed poll waiting in the channel and a queued tick,
        // drained in the same cycle: the merge must land before the
        // tick turns into the next poll, so that poll resumes from the
        // cursor the completed one returned, not the one before it.
        let (gate_tx, gate_rx) = bounded(1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let transport = GatedTransport {
            gate: gate_rx,
            seen_cursors: seen.clone(),
        };
        let mut viewer = Viewer::mount(Box::new(transport), fast_config());

        // The first poll is blocked on the gate; let ticks queue behind it.
        thread::sleep(FAST_PERIOD * 3);
        gate_tx.send(batch(&["1"], "t1")).unwrap();

        pump_until(&mut viewer, |v, _| v.cursor() == Some("t1"));
        pump_until(&mut viewer, |_, _| seen.lock().unwrap().len() >= 2);

        let cursors = seen.lock().unwrap();
        assert_eq!(cursors[0], None);
        assert_eq!(cursors[1].as_deref(), Some("t1"));
        drop(cursors);

        drop(gate_tx);
        viewer.unmount();
    }

    #[test]
    fn test_empty_response_is_a_quiet_cycle() {
        // An empty cycle must not advance the cursor, fire a status
        // change, or stall the guard: the following batch still lands.
        let transport =
            ScriptedTransport::new(vec![Ok(FeedResponse::default()), batch(&["1"], "t1")]);
        let seen = transport.seen_cursors.clone();
        let mut viewer = Viewer::mount(Box::new(transport), fast_config());
        let status_rx = viewer.take_status_receiver().unwrap();

        pump_until(&mut viewer, |v, _| v.store().len() >= 1);

        let cursors = seen.lock().unwrap();
        // Cursor unchanged after the empty cycle.
        assert_eq!(cursors[0], None);
        assert_eq!(cursors[1], None);

        // Exactly one status change, from the real batch.
        assert_eq!(
            status_rx.recv_timeout(WAIT).unwrap(),
            StatusChange { appended: 1 }
        );
        assert!(status_rx.try_recv().is_err());

        viewer.unmount();
    }

    #[test]
    fn test_failure_surfaces_and_recovers() {
        let transport =
            ScriptedTransport::new(vec![Err(FeedError::Status(503)), batch(&["1"], "t1")]);
        let mut viewer = Viewer::mount(Box::new(transport), fast_config());

        let events = pump_until(&mut viewer, |v, _| v.store().len() >= 1);

        assert!(events
            .iter()
            .any(|e| matches!(e, ViewerEvent::FetchFailed(FeedError::Status(503)))));
        // The retry succeeded, so the transient error is gone.
        assert!(viewer.last_error().is_none());
        assert_eq!(viewer.cursor(), Some("t1"));

        viewer.unmount();
    }

    #[test]
    fn test_manual_mode_survives_merges() {
        let transport = ScriptedTransport::new(vec![
            batch(&["1"], "t1"),
            batch(&["2"], "t2"),
            batch(&["3"], "t3"),
        ]);
        let mut viewer = Viewer::mount(Box::new(transport), fast_config());

        pump_until(&mut viewer, |v, _| v.store().len() >= 1);

        let geometry = |scroll_top| ScrollGeometry {
            scroll_top,
            scroll_height: 500.0,
            client_height: 100.0,
            line_height: 20.0,
        };
        let pinned = viewer.auto_scroll_target(geometry(0.0)).unwrap();
        viewer.handle_scroll(geometry(pinned - 10.0));
        assert!(!viewer.is_following());

        pump_until(&mut viewer, |v, _| v.store().len() >= 3);

        // Merges kept landing, but never moved the viewport.
        assert!(!viewer.is_following());
        assert!(viewer.auto_scroll_target(geometry(pinned - 10.0)).is_none());

        viewer.unmount();
    }

    #[test]
    fn test_capped_retention() {
        let transport = ScriptedTransport::new(vec![batch(&["1", "2", "3", "4"], "t4")]);
        let mut viewer = Viewer::mount(
            Box::new(transport),
            ViewerConfig {
                max_entries: Some(2),
                ..fast_config()
            },
        );

        pump_until(&mut viewer, |v, _| v.store().len() >= 2);

        let ids: Vec<_> = viewer.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["3", "4"]);

        viewer.unmount();
    }

    #[test]
    fn test_resume_at_bottom_config_reaches_controller() {
        let transport = ScriptedTransport::new(vec![batch(&["1"], "t1")]);
        let mut viewer = Viewer::mount(
            Box::new(transport),
            ViewerConfig {
                resume_at_bottom: true,
                ..fast_config()
            },
        );

        pump_until(&mut viewer, |v, _| v.store().len() >= 1);

        let geometry = |scroll_top| ScrollGeometry {
            scroll_top,
            scroll_height: 500.0,
            client_height: 100.0,
            line_height: 20.0,
        };
        let pinned = viewer.auto_scroll_target(geometry(0.0)).unwrap();
        viewer.handle_scroll(geometry(pinned - 10.0));
        assert!(!viewer.is_following());

        viewer.handle_scroll(geometry(400.0));
        assert!(viewer.is_following());

        viewer.unmount();
    }

    #[test]
    fn test_unmount_stops_polling() {
        let transport = ScriptedTransport::new(vec![batch(&["1"], "t1")]);
        let seen = transport.seen_cursors.clone();
        let mut viewer = Viewer::mount(Box::new(transport), fast_config());

        pump_until(&mut viewer, |v, _| v.store().len() >= 1);
        viewer.unmount();

        // Let a poll dispatched just before unmount finish, then verify
        // that no further polls are ever issued.
        thread::sleep(FAST_PERIOD * 3);
        let polls_after_unmount = seen.lock().unwrap().len();
        thread::sleep(FAST_PERIOD * 5);
        assert_eq!(seen.lock().unwrap().len(), polls_after_unmount);
    }

    #[test]
    fn test_status_receiver_taken_once() {
        let transport = ScriptedTransport::new(Vec::new());
        let mut viewer = Viewer::mount(Box::new(transport), fast_config());
        assert!(viewer.take_status_receiver().is_some());
        assert!(viewer.take_status_receiver().is_none());
        viewer.unmount();
    }

    #[test]
    fn test_follow_state_checked_at_completion_time() {
        // A scroll that races an in-flight fetch: whatever mode the
        // controller reports when the completion is applied wins.
        let transport = ScriptedTransport::new(vec![batch(&["1"], "t1"), batch(&["2"], "t2")]);
        let mut viewer = Viewer::mount(Box::new(transport), fast_config());

        pump_until(&mut viewer, |v, _| v.store().len() >= 1);

        let geometry = |scroll_top| ScrollGeometry {
            scroll_top,
            scroll_height: 500.0,
            client_height: 100.0,
            line_height: 20.0,
        };
        let pinned = viewer.auto_scroll_target(geometry(0.0)).unwrap();

        // Scroll up while the second fetch may still be in flight.
        viewer.handle_scroll(geometry(pinned - 10.0));

        pump_until(&mut viewer, |v, _| v.store().len() >= 2);
        assert!(viewer.auto_scroll_target(geometry(pinned - 10.0)).is_none());

        viewer.unmount();
    }
}
