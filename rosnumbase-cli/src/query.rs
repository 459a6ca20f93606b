//! Read-only commands over the local registry: `find` and the listings.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use rosnumbase_core::RegistryRecord;
use rosnumbase_store::RegistryStore;
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_NUMBER, CliError, ENV_FIND_NUMBER, lookup::PhoneNumber, open_store,
    resolve_database,
};

/// CLI arguments for the `find` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "find",
    about = "Show the operator and region holding a phone number"
)]
#[ortho_config(prefix = "ROSNUMBASE")]
pub(crate) struct FindArgs {
    /// Phone number in any formatting, e.g. "+7 (912) 345-67-89".
    #[arg(value_name = ARG_NUMBER)]
    #[serde(default)]
    pub(crate) number: Option<String>,
    /// Path to the SQLite registry database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Resolved `find` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FindConfig {
    pub(crate) number: PhoneNumber,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<FindArgs> for FindConfig {
    type Error = CliError;

    fn try_from(args: FindArgs) -> Result<Self, Self::Error> {
        let raw = args.number.ok_or(CliError::MissingArgument {
            field: ARG_NUMBER,
            env: ENV_FIND_NUMBER,
        })?;
        Ok(Self {
            number: PhoneNumber::parse(&raw)?,
            database: resolve_database(args.database)?,
        })
    }
}

/// CLI arguments shared by the listing subcommands.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "list", about = "List values stored in the registry")]
#[ortho_config(prefix = "ROSNUMBASE")]
pub(crate) struct ListArgs {
    /// Path to the SQLite registry database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// What a listing subcommand prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Listing {
    Operators,
    Regions,
    Sources,
}

pub(crate) fn run_find(args: FindArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = FindConfig::try_from(merged)?;
    let store = open_store(&config.database)?;
    write_lookup(writer, &store, config.number)
}

pub(crate) fn run_list(
    args: ListArgs,
    listing: Listing,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let store = open_store(&resolve_database(merged.database)?)?;
    write_listing(writer, &store, listing)
}

pub(crate) fn write_lookup(
    writer: &mut dyn Write,
    store: &RegistryStore,
    number: PhoneNumber,
) -> Result<(), CliError> {
    let found = store.find_record(number.code, number.subscriber)?;
    let line = found.as_ref().map_or_else(
        || format!("{} {:07}: not found", number.code, number.subscriber),
        describe,
    );
    writeln!(writer, "{line}").map_err(CliError::WriteOutput)
}

fn describe(record: &RegistryRecord) -> String {
    format!(
        "{} {:07}-{:07}: {}; {} ({})",
        record.code, record.from, record.to, record.operator, record.region, record.source
    )
}

pub(crate) fn write_listing(
    writer: &mut dyn Write,
    store: &RegistryStore,
    listing: Listing,
) -> Result<(), CliError> {
    let lines = match listing {
        Listing::Operators => store.list_operators()?,
        Listing::Regions => store.list_regions()?,
        Listing::Sources => store
            .list_sources()?
            .into_iter()
            .map(|(source, uri)| format!("{source} {uri}"))
            .collect(),
    };
    for line in lines {
        writeln!(writer, "{line}").map_err(CliError::WriteOutput)?;
    }
    Ok(())
}
