//! Feed client: cursor polling against the telemetry endpoint.
//!
//! This module owns the network-facing half of the viewer:
//! - **Transport**: an injected, authenticated fetch capability
//! - **Fetch actor**: one worker thread, at most one poll in flight
//! - **Poll timer**: a dedicated thread pacing the polls
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐       Tick        ┌──────────────┐
//! │ Timer Thread │ ────────────────▶ │              │
//! └──────────────┘                   │  Main Loop   │
//!                                    │   (Viewer)   │
//! ┌──────────────┐  FetchCompletion  │              │
//! │ Fetch Thread │ ────────────────▶ │              │
//! └──────────────┘ ◀──────────────── └──────────────┘
//!                    Cursor (poll request)
//! ```
//!
//! A tick that arrives while a poll is outstanding is dropped, never
//! queued, so at most one request exists at any time and completions are
//! processed in issuance order.

mod entry;
mod error;
mod fetcher;
mod ticker;
mod transport;

pub use entry::{Cursor, FeedBatch, FeedResponse, TelemetryEntry};
pub use error::FeedError;
pub use fetcher::{FetchActor, FetchCompletion, FetchOutcome};
pub use ticker::{PollTimer, Tick};
pub use transport::{HttpTransport, Transport};
