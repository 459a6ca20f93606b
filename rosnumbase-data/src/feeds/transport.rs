//! HTTP access used by discovery and downloads.
//!
//! [`FeedTransport`] is synchronous so the downloader stays a plain blocking
//! loop. [`HttpFeedTransport`] bridges to `reqwest` by blocking on a
//! current-thread Tokio runtime it owns, reusing one client (and its
//! connection pool) for every request.

use std::{io, time::Duration};

use log::debug;
use reqwest::{
    Client, RequestBuilder,
    header::{CONTENT_LENGTH, RANGE},
};
use tokio::runtime::Runtime;

use super::{ByteRange, TransportBuildError, TransportError};

/// Default user agent for registry requests.
pub const DEFAULT_USER_AGENT: &str = "rosnumbase/0.1";

/// Status line, declared length and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Length` header, when present and numeric.
    pub content_length: Option<u64>,
    /// Response body; empty for HEAD requests.
    pub body: Vec<u8>,
}

impl FeedResponse {
    /// Whether the status is in the 2xx class.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP operations needed by the downloader.
///
/// Implementations report non-success statuses as ordinary
/// [`FeedResponse`] values and reserve [`TransportError`] for failures below
/// HTTP, so callers can tell the two apart.
pub trait FeedTransport {
    /// Issue a plain GET.
    fn get(&self, url: &str) -> Result<FeedResponse, TransportError>;
    /// Issue a HEAD request.
    fn head(&self, url: &str) -> Result<FeedResponse, TransportError>;
    /// Issue a GET restricted to `range`.
    fn get_range(&self, url: &str, range: ByteRange) -> Result<FeedResponse, TransportError>;
}

impl<T: FeedTransport + ?Sized> FeedTransport for &T {
    fn get(&self, url: &str) -> Result<FeedResponse, TransportError> {
        (**self).get(url)
    }

    fn head(&self, url: &str) -> Result<FeedResponse, TransportError> {
        (**self).head(url)
    }

    fn get_range(&self, url: &str, range: ByteRange) -> Result<FeedResponse, TransportError> {
        (**self).get_range(url, range)
    }
}

/// Configuration for [`HttpFeedTransport`].
#[derive(Debug, Clone)]
pub struct HttpFeedTransportConfig {
    /// Per-request timeout; `None` keeps the client default of no timeout.
    pub timeout: Option<Duration>,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpFeedTransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpFeedTransportConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// [`FeedTransport`] backed by `reqwest`.
pub struct HttpFeedTransport {
    client: Client,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpFeedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFeedTransport")
            .field("client", &self.client)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpFeedTransport {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, TransportBuildError> {
        Self::with_config(&HttpFeedTransportConfig::default())
    }

    /// Create a transport with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: &HttpFeedTransportConfig) -> Result<Self, TransportBuildError> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        let client = builder.build().map_err(TransportBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportBuildError::Runtime)?;
        Ok(Self { client, runtime })
    }

    fn execute(&self, request: RequestBuilder, url: &str) -> Result<FeedResponse, TransportError> {
        self.runtime.block_on(async {
            let response = request
                .send()
                .await
                .map_err(|err| convert_reqwest_error(err, url))?;
            let status = response.status().as_u16();
            // Read the header directly: for HEAD responses the body size hint is zero.
            let content_length = response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok());
            let body = response
                .bytes()
                .await
                .map_err(|err| convert_reqwest_error(err, url))?
                .to_vec();
            debug!("{url} answered {status} with {} body bytes", body.len());
            Ok::<_, TransportError>(FeedResponse {
                status,
                content_length,
                body,
            })
        })
    }
}

impl FeedTransport for HttpFeedTransport {
    fn get(&self, url: &str) -> Result<FeedResponse, TransportError> {
        self.execute(self.client.get(url), url)
    }

    fn head(&self, url: &str) -> Result<FeedResponse, TransportError> {
        self.execute(self.client.head(url), url)
    }

    fn get_range(&self, url: &str, range: ByteRange) -> Result<FeedResponse, TransportError> {
        self.execute(self.client.get(url).header(RANGE, range.to_string()), url)
    }
}

fn convert_reqwest_error(error: reqwest::Error, url: &str) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout {
            url: url.to_owned(),
        };
    }
    TransportError::Network {
        url: url.to_owned(),
        source: io::Error::other(error),
    }
}
