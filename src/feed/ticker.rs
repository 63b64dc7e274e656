//! Poll timer: dedicated thread pacing the feed polls.
//!
//! The timer only emits ticks; the main loop decides whether a tick turns
//! into a poll (it does not while one is outstanding). The first poll is
//! issued directly on mount, so the timer never needs a zero-delay tick.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A tick emitted once per update period.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// Tick number (monotonically increasing).
    pub seq: u64,
    /// Time elapsed since the timer was started.
    pub elapsed: Duration,
}

/// Timer actor that emits one [`Tick`] per update period.
pub struct PollTimer {
    /// Handle to the timer thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Receiver for tick events.
    tick_rx: Receiver<Tick>,
}

impl PollTimer {
    /// Spawn a timer emitting one tick per `period`.
    ///
    /// The first tick fires after one full period; issuing the immediate
    /// first poll is the caller's job.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the timer thread.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn(period: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        // Tiny buffer: if the main loop falls behind, ticks are dropped
        // rather than queued, so a slow cycle never triggers a poll burst.
        let (tick_tx, tick_rx) = bounded(1);

        let handle = thread::Builder::new()
            .name("telelog-poll-timer".to_string())
            .spawn(move || {
                Self::run_loop(&tick_tx, &shutdown_clone, period);
            })
            .expect("failed to spawn poll timer thread");

        Self {
            handle: Some(handle),
            shutdown,
            tick_rx,
        }
    }

    /// Get a reference to the tick receiver.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<Tick> {
        &self.tick_rx
    }

    /// Signal the timer to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the timer thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main timer loop.
    fn run_loop(tick_tx: &Sender<Tick>, shutdown: &Arc<AtomicBool>, period: Duration) {
        let start = Instant::now();
        let mut seq = 0u64;
        let mut next_tick = start + period;

        while !shutdown.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now < next_tick {
                // Sleep in short slices so shutdown stays responsive.
                thread::sleep((next_tick - now).min(Duration::from_millis(5)));
                continue;
            }

            let tick = Tick {
                seq,
                elapsed: now - start,
            };
            // Non-blocking send: a full buffer means the receiver is
            // behind, and this tick is skipped.
            let _ = tick_tx.try_send(tick);

            seq += 1;
            next_tick += period;

            // Fell behind (system sleep etc.): realign instead of bursting.
            if next_tick < now {
                next_tick = now + period;
            }
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
