//! Numbering-range assignments and their validation.

use thiserror::Error;

use crate::SourceId;

/// Column order expected by [`RegistryRecord::from_fields`].
pub const RECORD_FIELDS: [&str; 6] = ["code", "from", "to", "capacity", "operator", "region"];

/// One row asserting that numbers in `[from, to]` under `code` belong to an
/// operator and region.
///
/// # Examples
/// ```
/// use rosnumbase_core::{RegistryRecord, SourceId};
///
/// # fn main() -> Result<(), rosnumbase_core::RecordError> {
/// let record = RegistryRecord::from_fields(
///     SourceId::from("DEF9XX"),
///     &["912", "3000000", "3999999", "1000000", "Operator", "Region"],
/// )?;
/// assert!(record.contains(3_456_789));
/// assert!(!record.contains(4_000_000));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryRecord {
    /// Feed that published the row.
    pub source: SourceId,
    /// Numbering-plan prefix (ABC or DEF code).
    pub code: i64,
    /// First subscriber number of the range, inclusive.
    pub from: i64,
    /// Last subscriber number of the range, inclusive.
    pub to: i64,
    /// Number of subscriber numbers in the range, as published.
    pub capacity: i64,
    /// Operator holding the range.
    pub operator: String,
    /// Region the range is assigned to.
    pub region: String,
}

/// Errors raised while building or validating a [`RegistryRecord`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    /// A required column was absent from the row.
    #[error("row is missing the {field} column")]
    MissingField {
        /// Name of the absent column.
        field: &'static str,
    },
    /// A numeric column did not hold an integer.
    #[error("{field} value {value:?} is not an integer")]
    InvalidNumber {
        /// Name of the offending column.
        field: &'static str,
        /// Raw value as it appeared in the row.
        value: String,
    },
    /// The range bounds were reversed.
    #[error("range start {from} exceeds range end {to}")]
    InvertedRange {
        /// Declared start of the range.
        from: i64,
        /// Declared end of the range.
        to: i64,
    },
}

impl RegistryRecord {
    /// Build a record from textual columns in [`RECORD_FIELDS`] order.
    ///
    /// Values are trimmed before conversion. Columns beyond the sixth are
    /// ignored so feeds may append extra data.
    pub fn from_fields<S: AsRef<str>>(source: SourceId, fields: &[S]) -> Result<Self, RecordError> {
        let [code, from, to, capacity, operator, region] = RECORD_FIELDS;
        let record = Self {
            source,
            code: parse_number(fields, 0, code)?,
            from: parse_number(fields, 1, from)?,
            to: parse_number(fields, 2, to)?,
            capacity: parse_number(fields, 3, capacity)?,
            operator: text_field(fields, 4, operator)?.to_owned(),
            region: text_field(fields, 5, region)?.to_owned(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the `from <= to` invariant.
    pub const fn validate(&self) -> Result<(), RecordError> {
        if self.from > self.to {
            return Err(RecordError::InvertedRange {
                from: self.from,
                to: self.to,
            });
        }
        Ok(())
    }

    /// Whether `number` falls within the inclusive range.
    #[must_use]
    pub const fn contains(&self, number: i64) -> bool {
        self.from <= number && number <= self.to
    }
}

fn text_field<'a, S: AsRef<str>>(
    fields: &'a [S],
    index: usize,
    field: &'static str,
) -> Result<&'a str, RecordError> {
    fields
        .get(index)
        .map(|value| value.as_ref().trim())
        .ok_or(RecordError::MissingField { field })
}

fn parse_number<S: AsRef<str>>(
    fields: &[S],
    index: usize,
    field: &'static str,
) -> Result<i64, RecordError> {
    let raw = text_field(fields, index, field)?;
    raw.parse().map_err(|_| RecordError::InvalidNumber {
        field,
        value: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn source() -> SourceId {
        SourceId::from("ABC3XX")
    }

    #[rstest]
    fn parses_trimmed_fields(source: SourceId) {
        let record = RegistryRecord::from_fields(
            source.clone(),
            &[" 301 ", "2110000", "2119999 ", "10000", " ПАО Ростелеком ", "Республика Бурятия"],
        )
        .expect("row should parse");
        assert_eq!(
            record,
            RegistryRecord {
                source,
                code: 301,
                from: 2_110_000,
                to: 2_119_999,
                capacity: 10_000,
                operator: "ПАО Ростелеком".to_owned(),
                region: "Республика Бурятия".to_owned(),
            }
        );
    }

    #[rstest]
    fn ignores_trailing_columns(source: SourceId) {
        let record = RegistryRecord::from_fields(
            source,
            &["900", "0", "99", "100", "Op", "Reg", "7707049388"],
        )
        .expect("row should parse");
        assert_eq!(record.region, "Reg");
    }

    #[rstest]
    #[case(&["x", "1", "2", "3", "o", "r"], "code")]
    #[case(&["1", "", "2", "3", "o", "r"], "from")]
    #[case(&["1", "1", "2.5", "3", "o", "r"], "to")]
    #[case(&["1", "1", "2", "many", "o", "r"], "capacity")]
    fn rejects_non_numeric_columns(
        source: SourceId,
        #[case] fields: &[&str],
        #[case] expected: &'static str,
    ) {
        let err = RegistryRecord::from_fields(source, fields).expect_err("row should fail");
        match err {
            RecordError::InvalidNumber { field, .. } => assert_eq!(field, expected),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    fn parses_owned_fields(source: SourceId) {
        let fields: Vec<String> = "912;3000000;3999999;1000000;ПАО МТС;Пермский край"
            .split(';')
            .map(str::to_owned)
            .collect();
        let record = RegistryRecord::from_fields(source, &fields).expect("row should parse");
        assert_eq!((record.code, record.from, record.to), (912, 3_000_000, 3_999_999));
        assert_eq!(record.operator, "ПАО МТС");
    }

    #[rstest]
    fn rejects_short_rows(source: SourceId) {
        let err = RegistryRecord::from_fields(source, &["1", "2", "3", "4", "op"])
            .expect_err("row should fail");
        assert_eq!(err, RecordError::MissingField { field: "region" });
    }

    #[rstest]
    fn rejects_inverted_ranges(source: SourceId) {
        let err = RegistryRecord::from_fields(source, &["1", "20", "10", "0", "o", "r"])
            .expect_err("row should fail");
        assert_eq!(err, RecordError::InvertedRange { from: 20, to: 10 });
    }

    #[rstest]
    #[case(10, true)]
    #[case(15, true)]
    #[case(20, true)]
    #[case(9, false)]
    #[case(21, false)]
    fn containment_is_inclusive(source: SourceId, #[case] number: i64, #[case] inside: bool) {
        let record = RegistryRecord::from_fields(source, &["1", "10", "20", "11", "o", "r"])
            .expect("row should parse");
        assert_eq!(record.contains(number), inside);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn serialises_source_transparently(source: SourceId) {
        let record = RegistryRecord::from_fields(source, &["1", "10", "20", "11", "o", "r"])
            .expect("row should parse");
        let json = serde_json::to_value(&record).expect("record should serialise");
        assert_eq!(json["source"], "ABC3XX");
        assert_eq!(json["to"], 20);
    }
}
