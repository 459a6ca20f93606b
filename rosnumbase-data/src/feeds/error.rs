//! Error types produced while discovering and downloading feeds.

use std::io;

use thiserror::Error;

/// Transport-level failures; HTTP statuses are reported separately.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Fully qualified request URL.
        url: String,
    },
    /// The request failed due to a connection or protocol error.
    #[error("network error contacting {url}: {source}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// I/O error reported by the transport.
        source: io::Error,
    },
}

/// Errors that make the listing page unusable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// The listing page could not be fetched.
    #[error("failed to fetch feed listing: {source}")]
    Transport {
        /// Underlying transport failure.
        source: TransportError,
    },
    /// The listing page answered with a non-success status.
    #[error("feed listing at {url} returned HTTP {status}")]
    Status {
        /// Listing page URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
}

/// Per-feed request failures reported through
/// [`DownloadHandlers::on_request_error`](crate::feeds::DownloadHandlers::on_request_error).
///
/// These abandon the affected feed for the current cycle; the remaining feeds
/// are still downloaded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RequestError {
    /// The HEAD or ranged GET request failed below HTTP.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The feed did not declare a usable content length.
    #[error("{url} did not report a content length")]
    MissingLength {
        /// Feed URL.
        url: String,
    },
}

/// Error returned when the HTTP transport cannot be constructed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime driving the client.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] io::Error),
}
