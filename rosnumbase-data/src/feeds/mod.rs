//! Discovery and download of the published registry feeds.
//!
//! A [`FeedCatalog`] names the feeds and where the listing page lives. A
//! [`FeedDownloader`] scans that page for the current URL of every feed,
//! compares each one with the URL recorded by the previous cycle and fetches
//! the changed feeds in [`RANGE_PIECES`] sequential ranged requests. Progress
//! and per-feed failures are reported through [`DownloadHandlers`]; only a
//! failure to read the listing page is returned as an error.
//!
//! # Architecture
//!
//! Requests go through the synchronous [`FeedTransport`] trait. The
//! production [`HttpFeedTransport`] blocks on `reqwest` internally, keeping
//! the downloader usable from plain synchronous drivers, while
//! [`test_support::StubTransport`] serves in-memory resources for tests.

mod catalog;
mod downloader;
mod error;
mod events;
mod ranges;
mod transport;

#[doc(hidden)]
pub mod test_support;

pub use catalog::{CatalogError, DEFAULT_ORIGIN, FeedCatalog, FeedPattern, LISTING_PATH};
pub use downloader::{FeedDownloader, FeedPayload};
pub use error::{DiscoveryError, RequestError, TransportBuildError, TransportError};
pub use events::{DownloadEvent, DownloadHandlers};
pub use ranges::{ByteRange, RANGE_PIECES, RangePlan};
pub use transport::{
    DEFAULT_USER_AGENT, FeedResponse, FeedTransport, HttpFeedTransport, HttpFeedTransportConfig,
};

#[cfg(test)]
mod tests;
