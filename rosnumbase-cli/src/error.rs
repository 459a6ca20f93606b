//! Error types emitted by the rosnumbase CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use rosnumbase_data::feeds::{CatalogError, DiscoveryError, TransportBuildError};
use rosnumbase_store::StoreError;
use thiserror::Error;

/// Errors emitted by the rosnumbase CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Name of the missing option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// No database path was configured and the home directory is unknown.
    #[error("cannot locate a home directory for the default database; set --database")]
    NoDefaultDatabase,
    /// The phone number did not reduce to a ten-digit national number.
    #[error("{input:?} is not a ten-digit national number")]
    InvalidPhoneNumber {
        /// Number as supplied.
        input: String,
    },
    /// The registry origin could not be turned into a feed catalogue.
    #[error("invalid registry origin: {0}")]
    Catalog(#[source] CatalogError),
    /// Constructing the HTTP transport failed.
    #[error("failed to build HTTP transport: {0}")]
    BuildTransport(#[source] TransportBuildError),
    /// The listing page could not be read.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Reading or writing the registry database failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
