//! Command-line interface for the rosnumbase registry cache.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use rosnumbase_store::RegistryStore;

mod error;
mod lookup;
mod payload;
mod query;
mod refresh;

pub use error::CliError;

use query::{FindArgs, ListArgs, Listing};
use refresh::UpdateArgs;

const ARG_DATABASE: &str = "database";
const ARG_ORIGIN: &str = "origin";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_USER_AGENT: &str = "user-agent";
const ARG_FORCE: &str = "force";
const ARG_NUMBER: &str = "number";
const ENV_FIND_NUMBER: &str = "ROSNUMBASE_CMDS_FIND_NUMBER";

/// Database file created in the home directory when none is configured.
pub const DEFAULT_DATABASE_FILE: &str = ".rosnumbase.db";

/// Run the rosnumbase CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Update(args) => refresh::run_update(args, &mut stdout),
        Command::Find(args) => query::run_find(args, &mut stdout),
        Command::Operators(args) => query::run_list(args, Listing::Operators, &mut stdout),
        Command::Regions(args) => query::run_list(args, Listing::Regions, &mut stdout),
        Command::Sources(args) => query::run_list(args, Listing::Sources, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "rosnumbase",
    about = "Local cache of the Russian numbering registry",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download changed registry feeds and refresh the local database.
    Update(UpdateArgs),
    /// Look up the operator and region holding a phone number.
    Find(FindArgs),
    /// List every operator present in the database.
    Operators(ListArgs),
    /// List every region present in the database.
    Regions(ListArgs),
    /// List the recorded feed locations.
    Sources(ListArgs),
}

/// `~/.rosnumbase.db`, when the home directory is known and UTF-8.
fn default_database_path() -> Option<Utf8PathBuf> {
    let home = dirs::home_dir()?;
    Utf8PathBuf::from_path_buf(home)
        .ok()
        .map(|dir| dir.join(DEFAULT_DATABASE_FILE))
}

fn resolve_database(database: Option<Utf8PathBuf>) -> Result<Utf8PathBuf, CliError> {
    database.map_or_else(
        || default_database_path().ok_or(CliError::NoDefaultDatabase),
        Ok,
    )
}

/// Open the registry at `path`, creating the schema on first use.
fn open_store(path: &Utf8Path) -> Result<RegistryStore, CliError> {
    let mut store = RegistryStore::open(path)?;
    store.initialise_schema()?;
    Ok(store)
}

#[cfg(test)]
mod tests;
