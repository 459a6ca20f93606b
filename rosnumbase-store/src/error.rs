//! Error types produced by the registry store.

use std::path::PathBuf;

use rosnumbase_core::{RecordError, SourceId};
use thiserror::Error;

/// Errors raised while reading or writing the registry cache.
///
/// The store never retries or swallows SQLite failures; callers holding a
/// [`RegistryTransaction`](crate::RegistryTransaction) should let it drop (or
/// call `rollback`) when one of these surfaces.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open registry database at {path:?}: {source}")]
    Open {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement against the backing database failed.
    #[error("failed to {operation}: {source}")]
    Sqlite {
        /// Short description of the failed step.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A record violated the range invariants and was not inserted.
    #[error("rejected record for {feed}: {reason}")]
    InvalidRecord {
        /// Feed the record claimed to belong to.
        feed: SourceId,
        /// Validation failure.
        #[source]
        reason: RecordError,
    },
    /// A bulk refresh received a record belonging to another feed.
    #[error("record for {found} supplied while refreshing {expected}")]
    ForeignRecord {
        /// Feed being refreshed.
        expected: SourceId,
        /// Feed named by the offending record.
        found: SourceId,
    },
}

impl StoreError {
    pub(crate) fn sqlite(operation: &'static str) -> impl Fn(rusqlite::Error) -> Self {
        move |source| Self::Sqlite { operation, source }
    }
}
