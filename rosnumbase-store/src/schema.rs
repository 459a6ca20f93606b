#![forbid(unsafe_code)]

use rusqlite::{Connection, Transaction};

use crate::StoreError;

/// Name of the table holding numbering-range rows.
pub const REGISTRY_TABLE: &str = "registry";
/// Name of the table holding the last known location of each feed.
pub const SOURCES_TABLE: &str = "sources";

/// Create the registry tables and indexes when they are absent.
///
/// Every statement uses `IF NOT EXISTS`, so running this on each process
/// start leaves an initialised database untouched.
pub(crate) fn initialise_schema(connection: &mut Connection) -> Result<(), StoreError> {
    let transaction = connection
        .transaction()
        .map_err(StoreError::sqlite("begin schema transaction"))?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;

    transaction
        .commit()
        .map_err(StoreError::sqlite("commit schema transaction"))
}

/// Whether both registry tables are present.
pub(crate) fn schema_exists(connection: &Connection) -> Result<bool, StoreError> {
    let present: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2)",
            [REGISTRY_TABLE, SOURCES_TABLE],
            |row| row.get(0),
        )
        .map_err(StoreError::sqlite("inspect schema"))?;
    Ok(present == 2)
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create registry table",
        r#"CREATE TABLE IF NOT EXISTS registry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            code INTEGER NOT NULL,
            "from" INTEGER NOT NULL,
            "to" INTEGER NOT NULL,
            capacity INTEGER NOT NULL,
            operator TEXT NOT NULL,
            region TEXT NOT NULL
        )"#,
    )?;
    run_migration_step(
        transaction,
        "create sources table",
        "CREATE TABLE IF NOT EXISTS sources (
            source TEXT PRIMARY KEY,
            uri TEXT NOT NULL
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "index registry codes",
        "CREATE INDEX IF NOT EXISTS registry_code ON registry (code)",
    )?;
    run_migration_step(
        transaction,
        "index registry operators",
        "CREATE INDEX IF NOT EXISTS registry_operator ON registry (operator)",
    )?;
    run_migration_step(
        transaction,
        "index registry regions",
        "CREATE INDEX IF NOT EXISTS registry_region ON registry (region)",
    )
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(StoreError::sqlite(step))
}
