//! Error taxonomy for the feed client.

use thiserror::Error;

/// Errors produced while polling the telemetry feed.
///
/// Every failure path releases the in-flight guard, so the next timer
/// tick can retry regardless of which variant occurred.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network-level failure or undecodable response body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("server returned status {0}")]
    Status(u16),

    /// The response body was missing an expected field.
    #[error("malformed response: {0}")]
    Malformed(&'static str),

    /// The feed URL could not be constructed.
    #[error("invalid feed url: {0}")]
    Url(#[from] url::ParseError),
}
