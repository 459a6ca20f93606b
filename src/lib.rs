//! Facade crate for the rosnumbase registry cache.
//!
//! This crate re-exports the core record types and exposes the SQLite store
//! and the feed downloader behind feature flags.

#![forbid(unsafe_code)]

pub use rosnumbase_core::{RECORD_FIELDS, RecordError, RegistryRecord, SourceId};

#[cfg(feature = "store-sqlite")]
pub use rosnumbase_store::{RegistryStore, RegistryTransaction, StoreError};

#[cfg(feature = "download")]
pub use rosnumbase_data::feeds::{
    DiscoveryError, DownloadEvent, DownloadHandlers, FeedCatalog, FeedDownloader, FeedPayload,
    FeedTransport, HttpFeedTransport, RANGE_PIECES, RequestError,
};
