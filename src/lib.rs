//! # Telelog
//!
//! An auto-following terminal console for incrementally polled telemetry
//! feeds.
//!
//! Telelog pulls newly produced telemetry events from a server, merges them
//! into a growing ordered log, and keeps the viewport pinned to the newest
//! entry until the user scrolls away.
//!
//! ## Core Concepts
//!
//! - **Cursor polling**: One poll at a time, resumed from an opaque cursor
//!   token, so the server only ships entries the viewer has not seen.
//! - **Append-only log**: Batches land in arrival order and are never
//!   re-sorted; the server is the sole ordering authority.
//! - **Auto-follow**: A one-way latch; the viewport follows new entries
//!   until the user scrolls above the last programmatic anchor.
//! - **Actor model**: Fetching and timing run on isolated threads; all
//!   state mutation happens on the caller's thread.
//!
//! ## Example
//!
//! ```rust,ignore
//! use telelog::{HttpTransport, Viewer, ViewerConfig};
//!
//! let transport = HttpTransport::from_url("https://island.example")?;
//! let mut viewer = Viewer::mount(Box::new(transport), ViewerConfig::default());
//!
//! loop {
//!     for event in viewer.process_pending() {
//!         // re-render, pin to bottom, ...
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod feed;
pub mod store;
pub mod view;
pub mod viewer;

// Re-exports for convenience
pub use feed::{
    Cursor, FeedBatch, FeedError, FeedResponse, FetchActor, FetchCompletion, FetchOutcome,
    HttpTransport, PollTimer, TelemetryEntry, Tick, Transport,
};
pub use store::LogStore;
pub use view::{
    ConsoleView, FollowConfig, FollowController, FollowMode, LineMetrics, ScrollGeometry,
};
pub use viewer::{StatusChange, Viewer, ViewerConfig, ViewerEvent};
