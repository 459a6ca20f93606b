//! Core domain types for the rosnumbase numbering registry.
//!
//! These models validate their inputs so malformed feed rows are rejected at
//! the boundary instead of being stored as silently wrong ranges.
#![forbid(unsafe_code)]

mod record;
mod source;

pub use record::{RECORD_FIELDS, RecordError, RegistryRecord};
pub use source::SourceId;
