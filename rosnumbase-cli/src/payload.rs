//! Parsing of downloaded feed payloads into registry records.
//!
//! Feeds are semicolon-separated text with a header line:
//! `code;from;to;capacity;operator;region`, optionally followed by further
//! columns. Rows that do not form a valid record are skipped and counted.

use log::warn;
use rosnumbase_core::{RegistryRecord, SourceId};

/// Records recovered from one feed payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ParsedFeed {
    pub(crate) records: Vec<RegistryRecord>,
    pub(crate) skipped: usize,
}

pub(crate) fn parse_feed(source: &SourceId, data: &str) -> ParsedFeed {
    let mut parsed = ParsedFeed::default();
    let rows = data
        .trim_start_matches('\u{feff}')
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .skip(1);
    for (index, line) in rows {
        let fields: Vec<&str> = line.split(';').collect();
        match RegistryRecord::from_fields(source.clone(), &fields) {
            Ok(record) => parsed.records.push(record),
            Err(err) => {
                warn!("skipping {source} line {}: {err}", index + 1);
                parsed.skipped += 1;
            }
        }
    }
    parsed
}
