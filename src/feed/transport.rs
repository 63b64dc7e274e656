//! Transport: the injected fetch capability.
//!
//! The viewer never talks to the network directly. It is handed a
//! [`Transport`] at mount time, which keeps credentials out of the core
//! and lets tests substitute an in-memory feed.

use super::entry::FeedResponse;
use super::error::FeedError;
use url::Url;

/// An authenticated fetch capability for the telemetry feed.
pub trait Transport: Send {
    /// Fetch all entries newer than `cursor`.
    ///
    /// `None` means "from the beginning".
    fn fetch_feed(&self, cursor: Option<&str>) -> Result<FeedResponse, FeedError>;
}

/// HTTP transport backed by a blocking `reqwest` client.
///
/// Issues `GET {base}/api/telemetry-feed?timestamp={cursor|empty}` with an
/// optional bearer token and decodes the JSON body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpTransport {
    /// Create a transport for the given base URL.
    pub fn new(base_url: Url) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("telelog/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            http,
            base_url,
            bearer_token: None,
        }
    }

    /// Create a transport from a base URL string.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse.
    pub fn from_url(base_url: &str) -> Result<Self, FeedError> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    /// Attach a bearer token to every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// The base URL requests are issued against.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn fetch_feed(&self, cursor: Option<&str>) -> Result<FeedResponse, FeedError> {
        let mut url = self.base_url.join("/api/telemetry-feed")?;
        url.query_pairs_mut()
            .append_pair("timestamp", cursor.unwrap_or(""));

        let mut request = self.http.get(url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        Ok(response.json()?)
    }
}
