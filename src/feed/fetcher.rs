//! Fetch actor: one worker thread, at most one poll in flight.
//!
//! The actor separates *dispatch* from *execution*: the main loop calls
//! [`FetchActor::request_poll`] on every timer tick, and the call is a
//! silent no-op while a previous poll is still outstanding. The worker
//! thread performs the blocking fetch and delivers a [`FetchOutcome`]
//! back over a channel.
//!
//! The in-flight guard is released through an RAII handle so that
//! success, failure, and panic all free it; a stuck guard would stall
//! polling permanently. On the success path the handle travels inside
//! the delivered [`FetchCompletion`], so the guard stays held until the
//! main loop has applied the outcome (and its cursor advance). A tick
//! processed while a completion is still pending therefore stays a
//! dropped no-op instead of dispatching a poll with a stale cursor.

use super::entry::{Cursor, FeedBatch};
use super::error::FeedError;
use super::transport::Transport;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Outcome of a single poll, delivered to the main loop.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The response carried a `telemetries` field; the cursor advances.
    Batch(FeedBatch),
    /// The response carried no `telemetries` field: nothing to merge,
    /// cursor unchanged.
    Empty,
    /// The poll failed. Once the completion is consumed the guard is
    /// free and the next tick retries.
    Failed(FeedError),
}

/// Releases the in-flight guard when dropped, on every exit path.
#[derive(Debug)]
struct InFlightRelease(Arc<AtomicBool>);

impl Drop for InFlightRelease {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A finished poll, holding the in-flight guard until dropped.
///
/// The main loop reads the outcome, applies it (advancing the cursor on
/// a batch), and only then lets the completion drop. Until that happens
/// the guard reads as busy, so no tick can start the next poll before
/// the previous poll's cursor has landed.
#[derive(Debug)]
pub struct FetchCompletion {
    /// What the poll produced.
    pub outcome: FetchOutcome,
    /// Frees the guard on drop.
    _release: InFlightRelease,
}

/// Fetch actor polling the telemetry feed on a worker thread.
pub struct FetchActor {
    /// Handle to the worker thread.
    handle: Option<JoinHandle<()>>,
    /// Poll request sender (carries the cursor to resume from).
    request_tx: Sender<Cursor>,
    /// Guard: true while a poll is outstanding.
    in_flight: Arc<AtomicBool>,
    /// Flag: false once the owner unmounted. Late completions are dropped.
    active: Arc<AtomicBool>,
}

impl FetchActor {
    /// Spawn the fetch worker.
    ///
    /// Completions are delivered through `outcome_tx` in issuance order
    /// (trivially, since only one poll is ever in flight).
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the worker thread.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn(transport: Box<dyn Transport>, outcome_tx: Sender<FetchCompletion>) -> Self {
        let in_flight = Arc::new(AtomicBool::new(false));
        let active = Arc::new(AtomicBool::new(true));
        let (request_tx, request_rx) = bounded::<Cursor>(1);

        let worker_in_flight = in_flight.clone();
        let worker_active = active.clone();
        let handle = thread::Builder::new()
            .name("telelog-fetch".to_string())
            .spawn(move || {
                Self::run_loop(
                    transport.as_ref(),
                    &request_rx,
                    &outcome_tx,
                    &worker_in_flight,
                    &worker_active,
                );
            })
            .expect("failed to spawn fetch thread");

        Self {
            handle: Some(handle),
            request_tx,
            in_flight,
            active,
        }
    }

    /// Request a poll resuming from `cursor`.
    ///
    /// Returns `false` (and dispatches nothing) while a poll is already
    /// outstanding: overlapping ticks are dropped, never queued.
    pub fn request_poll(&self, cursor: Cursor) -> bool {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("tick dropped: a poll is already in flight");
            return false;
        }

        if self.request_tx.send(cursor).is_err() {
            // Worker is gone; leave the guard free for a later observer.
            self.in_flight.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// Whether a poll is currently outstanding.
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Stop delivering outcomes.
    ///
    /// An in-flight fetch is not interrupted, but its completion becomes
    /// a no-op: the worker checks this flag before delivering.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Deactivate and wait for the worker to finish.
    ///
    /// Blocks until a fetch that is currently executing returns.
    pub fn join(mut self) {
        self.deactivate();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Worker loop: wait for a request, fetch, deliver.
    fn run_loop(
        transport: &dyn Transport,
        request_rx: &Receiver<Cursor>,
        outcome_tx: &Sender<FetchCompletion>,
        in_flight: &Arc<AtomicBool>,
        active: &Arc<AtomicBool>,
    ) {
        loop {
            match request_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(cursor) => {
                    // Freed if the transport panics or the completion is
                    // dropped; otherwise travels with the completion and
                    // frees when the main loop has applied it.
                    let release = InFlightRelease(in_flight.clone());
                    let outcome = Self::poll_once(transport, cursor.as_deref());

                    if !active.load(Ordering::Acquire) {
                        // Unmounted while the fetch was running: drop the
                        // completion instead of mutating anything.
                        break;
                    }
                    let completion = FetchCompletion {
                        outcome,
                        _release: release,
                    };
                    if outcome_tx.send(completion).is_err() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !active.load(Ordering::Acquire) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Perform one poll and classify the result.
    fn poll_once(transport: &dyn Transport, cursor: Option<&str>) -> FetchOutcome {
        tracing::debug!(cursor = cursor.unwrap_or("<start>"), "polling telemetry feed");

        match transport.fetch_feed(cursor) {
            Ok(response) => match response.telemetries {
                Some(entries) => match response.timestamp {
                    Some(next_cursor) => FetchOutcome::Batch(FeedBatch {
                        entries,
                        next_cursor,
                    }),
                    None => {
                        FetchOutcome::Failed(FeedError::Malformed("telemetries without timestamp"))
                    }
                },
                None => {
                    tracing::trace!("feed cycle returned nothing new");
                    FetchOutcome::Empty
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "telemetry poll failed");
                FetchOutcome::Failed(err)
            }
        }
    }
}

impl Drop for FetchActor {
    fn drop(&mut self) {
        self.deactivate();
    }
}
