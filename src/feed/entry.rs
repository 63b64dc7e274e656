//! Wire model for the telemetry feed.

use serde::{Deserialize, Serialize};

/// A single telemetry event as produced by the server.
///
/// Immutable once received. Uniqueness on `id` is assumed but not
/// enforced; the presentation layer uses it for list identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEntry {
    /// Stable identifier. The server sends it as a string or a number;
    /// both are accepted and normalized to text.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Server-assigned ordering key.
    pub timestamp: String,
    /// Host that produced the event.
    pub hostname: String,
    /// Short human-readable description of the event.
    pub brief: String,
}

/// Opaque feed position token: the last consumed `timestamp`.
///
/// `None` means "from the beginning". Monotonically non-decreasing across
/// successful polls: the cursor passed to poll *n+1* is exactly the one
/// returned by poll *n*.
pub type Cursor = Option<String>;

/// Body of a successful `GET /api/telemetry-feed` response.
///
/// The server omits `telemetries` when there is nothing new this cycle;
/// the cursor must not advance in that case. When `telemetries` is
/// present, `timestamp` carries the new cursor and must accompany it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedResponse {
    /// Newly produced entries, oldest first. Absent when nothing new.
    #[serde(default)]
    pub telemetries: Option<Vec<TelemetryEntry>>,
    /// New cursor token.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Accept a string or numeric wire id, normalized to `String`.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireId {
        Text(String),
        Number(i64),
    }

    Ok(match WireId::deserialize(deserializer)? {
        WireId::Text(text) => text,
        WireId::Number(number) => number.to_string(),
    })
}

/// A validated batch handed to the main loop after a successful poll.
#[derive(Debug, Clone)]
pub struct FeedBatch {
    /// Entries to append, in server order.
    pub entries: Vec<TelemetryEntry>,
    /// Cursor to use for the next poll.
    pub next_cursor: String,
}
