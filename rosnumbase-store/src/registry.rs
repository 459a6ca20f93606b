//! SQLite-backed cache of numbering ranges and feed locations.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use log::debug;
use rosnumbase_core::{RegistryRecord, SourceId};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use crate::{StoreError, schema};

const INSERT_RECORD: &str = r#"INSERT INTO registry (
        source,
        code,
        "from",
        "to",
        capacity,
        operator,
        region
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#;

const FIND_RECORD: &str = r#"SELECT source, code, "from", "to", capacity, operator, region
    FROM registry
    WHERE code = ?1 AND "from" <= ?2 AND "to" >= ?2
    LIMIT 1"#;

const UPSERT_SOURCE: &str = "INSERT INTO sources (source, uri) VALUES (?1, ?2)
    ON CONFLICT(source) DO UPDATE SET uri = excluded.uri";

/// Durable cache of numbering-range assignments and per-feed download
/// locations.
///
/// The store owns a single connection and performs no internal locking; share
/// it across threads only behind external coordination.
///
/// # Examples
/// ```
/// use rosnumbase_core::{RegistryRecord, SourceId};
/// use rosnumbase_store::RegistryStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = RegistryStore::open_in_memory()?;
/// store.initialise_schema()?;
/// let source = SourceId::from("DEF9XX");
/// let record = RegistryRecord::from_fields(
///     source.clone(),
///     &["912", "3000000", "3999999", "1000000", "Operator", "Region"],
/// )?;
/// store.replace_source_records(&source, std::slice::from_ref(&record))?;
/// assert_eq!(store.find_record(912, 3_500_000)?, Some(record));
/// assert_eq!(store.find_record(912, 4_500_000)?, None);
/// # Ok(())
/// # }
/// ```
pub struct RegistryStore {
    connection: Connection,
    location: Option<PathBuf>,
}

impl fmt::Debug for RegistryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl RegistryStore {
    /// Open (or create) the registry database at `path`.
    ///
    /// The schema is not created; call [`Self::initialise_schema`] when
    /// [`Self::schema_exists`] reports `false`, or unconditionally on start.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] when SQLite cannot open the file.
    pub fn open(location: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = location.as_ref();
        let connection = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            connection,
            location: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory registry, mainly useful for tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] when SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self {
            connection,
            location: None,
        })
    }

    /// Location of the backing database, or `None` when held in memory.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Idempotently create both tables and the `code`, `operator` and
    /// `region` indexes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when a statement fails; nothing is
    /// created in that case.
    pub fn initialise_schema(&mut self) -> Result<(), StoreError> {
        schema::initialise_schema(&mut self.connection)
    }

    /// Whether both registry tables are present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when `sqlite_master` cannot be queried.
    pub fn schema_exists(&self) -> Result<bool, StoreError> {
        schema::schema_exists(&self.connection)
    }

    /// Begin an explicit transaction around a bulk-replace cycle.
    ///
    /// The returned handle rolls back when dropped without
    /// [`RegistryTransaction::commit`], so early returns and `?` never leave
    /// a half-applied refresh behind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when SQLite refuses to begin.
    pub fn transaction(&mut self) -> Result<RegistryTransaction<'_>, StoreError> {
        let transaction = self
            .connection
            .transaction()
            .map_err(StoreError::sqlite("begin transaction"))?;
        Ok(RegistryTransaction { transaction })
    }

    /// Insert one range row outside any explicit transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] for an inverted range and
    /// [`StoreError::Sqlite`] when the insert fails.
    pub fn add_record(&self, record: &RegistryRecord) -> Result<(), StoreError> {
        insert_record(&self.connection, record)
    }

    /// Delete every range row published by `source`, returning the count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the delete fails.
    pub fn flush_records(&self, source: &SourceId) -> Result<usize, StoreError> {
        delete_records(&self.connection, source)
    }

    /// Find the first range under `code` containing `number`.
    ///
    /// Overlapping ranges are a data-quality problem; when several rows
    /// match, whichever SQLite yields first is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query or row decoding fails.
    pub fn find_record(
        &self,
        code: i64,
        number: i64,
    ) -> Result<Option<RegistryRecord>, StoreError> {
        self.connection
            .query_row(FIND_RECORD, params![code, number], record_from_row)
            .optional()
            .map_err(StoreError::sqlite("find record"))
    }

    /// Record `uri` as the latest location of `source`, replacing any
    /// previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the upsert fails.
    pub fn add_source(&self, source: &SourceId, uri: &str) -> Result<(), StoreError> {
        upsert_source(&self.connection, source, uri)
    }

    /// Return every recorded feed location.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query or row decoding fails.
    pub fn list_sources(&self) -> Result<BTreeMap<SourceId, String>, StoreError> {
        let mut statement = self
            .connection
            .prepare("SELECT source, uri FROM sources")
            .map_err(StoreError::sqlite("prepare source listing"))?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    SourceId::new(row.get::<_, String>("source")?),
                    row.get::<_, String>("uri")?,
                ))
            })
            .map_err(StoreError::sqlite("list sources"))?;
        rows.collect::<Result<_, _>>()
            .map_err(StoreError::sqlite("read source row"))
    }

    /// Distinct operators across all ranges, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn list_operators(&self) -> Result<Vec<String>, StoreError> {
        self.distinct_values(
            "SELECT DISTINCT operator FROM registry ORDER BY operator ASC",
            "list operators",
        )
    }

    /// Distinct regions across all ranges, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn list_regions(&self) -> Result<Vec<String>, StoreError> {
        self.distinct_values(
            "SELECT DISTINCT region FROM registry ORDER BY region ASC",
            "list regions",
        )
    }

    /// Count stored ranges, optionally restricted to one feed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn count_records(&self, source: Option<&SourceId>) -> Result<u64, StoreError> {
        let outcome: rusqlite::Result<i64> = match source {
            Some(feed) => self.connection.query_row(
                "SELECT COUNT(*) FROM registry WHERE source = ?1",
                [feed.as_str()],
                |row| row.get(0),
            ),
            None => self
                .connection
                .query_row("SELECT COUNT(*) FROM registry", [], |row| row.get(0)),
        };
        let count = outcome.map_err(StoreError::sqlite("count records"))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Replace every range of `source` with `records` in one transaction.
    ///
    /// Either all rows are swapped or, on any failure, the previous rows stay
    /// visible. Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignRecord`] when a record belongs to another
    /// feed, [`StoreError::InvalidRecord`] for an inverted range and
    /// [`StoreError::Sqlite`] for any SQLite failure. The transaction is rolled
    /// back in every case.
    pub fn replace_source_records(
        &mut self,
        source: &SourceId,
        records: &[RegistryRecord],
    ) -> Result<usize, StoreError> {
        let transaction = self.transaction()?;
        let flushed = transaction.flush_records(source)?;
        for record in records {
            if &record.source != source {
                return Err(StoreError::ForeignRecord {
                    expected: source.clone(),
                    found: record.source.clone(),
                });
            }
            transaction.add_record(record)?;
        }
        transaction.commit()?;
        debug!(
            "replaced {flushed} ranges of {source} with {} new ranges",
            records.len()
        );
        Ok(records.len())
    }

    fn distinct_values(
        &self,
        sql: &str,
        operation: &'static str,
    ) -> Result<Vec<String>, StoreError> {
        let mut statement = self
            .connection
            .prepare(sql)
            .map_err(StoreError::sqlite(operation))?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(StoreError::sqlite(operation))?;
        rows.collect::<Result<_, _>>()
            .map_err(StoreError::sqlite(operation))
    }

    #[cfg(test)]
    pub(crate) const fn connection(&self) -> &Connection {
        &self.connection
    }
}

/// Scoped transaction over a [`RegistryStore`].
///
/// Dropping the handle without calling [`Self::commit`] rolls the
/// transaction back.
#[derive(Debug)]
pub struct RegistryTransaction<'store> {
    transaction: Transaction<'store>,
}

impl RegistryTransaction<'_> {
    /// Insert one range row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] for an inverted range and
    /// [`StoreError::Sqlite`] when the insert fails.
    pub fn add_record(&self, record: &RegistryRecord) -> Result<(), StoreError> {
        insert_record(&self.transaction, record)
    }

    /// Delete every range row published by `source`, returning the count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the delete fails.
    pub fn flush_records(&self, source: &SourceId) -> Result<usize, StoreError> {
        delete_records(&self.transaction, source)
    }

    /// Make every change in this transaction durable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the commit fails.
    pub fn commit(self) -> Result<(), StoreError> {
        self.transaction
            .commit()
            .map_err(StoreError::sqlite("commit transaction"))
    }

    /// Discard every change in this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the rollback fails.
    pub fn rollback(self) -> Result<(), StoreError> {
        self.transaction
            .rollback()
            .map_err(StoreError::sqlite("roll back transaction"))
    }
}

fn insert_record(connection: &Connection, record: &RegistryRecord) -> Result<(), StoreError> {
    record
        .validate()
        .map_err(|reason| StoreError::InvalidRecord {
            feed: record.source.clone(),
            reason,
        })?;
    let mut statement = connection
        .prepare_cached(INSERT_RECORD)
        .map_err(StoreError::sqlite("prepare record insert"))?;
    statement
        .execute(params![
            record.source.as_str(),
            record.code,
            record.from,
            record.to,
            record.capacity,
            record.operator,
            record.region,
        ])
        .map(|_| ())
        .map_err(StoreError::sqlite("insert record"))
}

fn delete_records(connection: &Connection, source: &SourceId) -> Result<usize, StoreError> {
    connection
        .execute("DELETE FROM registry WHERE source = ?1", [source.as_str()])
        .map_err(StoreError::sqlite("flush records"))
}

fn upsert_source(connection: &Connection, source: &SourceId, uri: &str) -> Result<(), StoreError> {
    connection
        .execute(UPSERT_SOURCE, params![source.as_str(), uri])
        .map(|_| ())
        .map_err(StoreError::sqlite("record source"))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<RegistryRecord> {
    Ok(RegistryRecord {
        source: SourceId::new(row.get::<_, String>("source")?),
        code: row.get("code")?,
        from: row.get("from")?,
        to: row.get("to")?,
        capacity: row.get("capacity")?,
        operator: row.get("operator")?,
        region: row.get("region")?,
    })
}
