//! SQLite cache for the numbering registry.
//!
//! Responsibilities:
//! - Hold range rows and the last known location of every feed.
//! - Replace a feed's ranges atomically inside one transaction.
//! - Answer range-containment lookups by numbering-plan code.
//!
//! Boundaries:
//! - Does not download or parse feeds; the driver hands over typed records.
//! - Does not retry; every SQLite failure propagates as [`StoreError`].
#![forbid(unsafe_code)]

mod error;
mod registry;
mod schema;

pub use error::StoreError;
pub use registry::{RegistryStore, RegistryTransaction};
pub use schema::{REGISTRY_TABLE, SOURCES_TABLE};
