//! Retrieval of the Russian numbering registry feeds.
//!
//! Responsibilities:
//! - Locate the current revision of every registry feed on the listing page.
//! - Skip feeds whose published URL has not changed since the last cycle.
//! - Fetch changed feeds with sequential ranged requests and report progress.
//!
//! Boundaries:
//! - No knowledge of the local store; callers pass previously recorded URLs
//!   in and receive downloaded payloads back.
//! - No payload parsing; feeds are returned as decoded text.
//!
//! Invariants:
//! - Requests are issued one at a time, in a deterministic feed order.
//! - A failure abandons only the affected feed.

pub mod feeds;

pub use feeds::{DiscoveryError, FeedCatalog, FeedDownloader, FeedPayload, RequestError};
