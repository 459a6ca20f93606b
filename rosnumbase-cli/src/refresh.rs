//! `update` command: refresh the local registry from the published feeds.

use std::{cell::RefCell, collections::BTreeMap, io::Write, time::Duration};

use camino::Utf8PathBuf;
use clap::Parser;
use log::{debug, info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use rosnumbase_core::SourceId;
use rosnumbase_data::feeds::{
    DEFAULT_ORIGIN, DEFAULT_USER_AGENT, DownloadHandlers, FeedCatalog, FeedDownloader,
    FeedTransport, HttpFeedTransport, HttpFeedTransportConfig,
};
use rosnumbase_store::RegistryStore;
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_FORCE, ARG_ORIGIN, ARG_TIMEOUT_SECS, ARG_USER_AGENT, CliError, open_store,
    payload::parse_feed, resolve_database,
};

/// CLI arguments for the `update` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "update",
    long_about = "Discover the current registry feeds, download those whose \
                 published location changed since the last update and \
                 replace their ranges in the local database.",
    about = "Refresh the local registry from the published feeds"
)]
#[ortho_config(prefix = "ROSNUMBASE")]
pub(crate) struct UpdateArgs {
    /// Path to the SQLite registry database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Origin serving the registry listing and feeds.
    #[arg(long = ARG_ORIGIN, value_name = "url")]
    #[serde(default)]
    pub(crate) origin: Option<String>,
    /// Per-request timeout in seconds; unset waits indefinitely.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// User agent sent with every request.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// Download every feed even when its location is unchanged.
    #[arg(long = ARG_FORCE)]
    #[serde(default)]
    pub(crate) force: bool,
}

impl UpdateArgs {
    pub(crate) fn into_config(self) -> Result<UpdateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        UpdateConfig::try_from(merged)
    }
}

/// Resolved `update` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpdateConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) origin: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) user_agent: String,
    pub(crate) force: bool,
}

impl UpdateConfig {
    fn transport_config(&self) -> HttpFeedTransportConfig {
        HttpFeedTransportConfig {
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl TryFrom<UpdateArgs> for UpdateConfig {
    type Error = CliError;

    fn try_from(args: UpdateArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            database: resolve_database(args.database)?,
            origin: args.origin.unwrap_or_else(|| DEFAULT_ORIGIN.to_owned()),
            timeout: args.timeout_secs.map(Duration::from_secs),
            user_agent: args
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            force: args.force,
        })
    }
}

/// Rows written for one refreshed feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FeedRefresh {
    pub(crate) source: SourceId,
    pub(crate) records: usize,
    pub(crate) skipped: usize,
}

/// Outcome of one update cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RefreshReport {
    pub(crate) discovered: usize,
    pub(crate) refreshed: Vec<FeedRefresh>,
    pub(crate) unchanged: Vec<SourceId>,
    pub(crate) failed: Vec<SourceId>,
}

pub(crate) fn run_update(args: UpdateArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let catalog = FeedCatalog::for_origin(&config.origin).map_err(CliError::Catalog)?;
    let transport = HttpFeedTransport::with_config(&config.transport_config())
        .map_err(CliError::BuildTransport)?;
    let mut store = open_store(&config.database)?;
    let report = refresh_registry(&mut store, catalog, &transport, config.force)?;
    write_report(writer, &report)
}

/// Discover, download and store every changed feed.
///
/// Storage failures abort the cycle; download failures only drop the
/// affected feed, which is retried on the next cycle because its location is
/// not recorded.
pub(crate) fn refresh_registry<T: FeedTransport>(
    store: &mut RegistryStore,
    catalog: FeedCatalog,
    transport: T,
    force: bool,
) -> Result<RefreshReport, CliError> {
    let previous = if force {
        BTreeMap::new()
    } else {
        store.list_sources()?
    };
    let unchanged = RefCell::new(Vec::new());
    let failed = RefCell::new(Vec::new());
    let handlers = DownloadHandlers::new()
        .on_request(|source| debug!("checking {source}"))
        .on_no_updates(|source| {
            info!("{source} is up to date");
            unchanged.borrow_mut().push(source.clone());
        })
        .on_http_error(|source, status| {
            warn!("{source} answered HTTP {status}");
            failed.borrow_mut().push(source.clone());
        })
        .on_request_error(|source, error| {
            warn!("{source} failed: {error}");
            failed.borrow_mut().push(source.clone());
        })
        .on_http_range(|source, data| debug!("{source}: received {} bytes", data.len()))
        .on_success(|source, uri, data| info!("{source}: {} bytes from {uri}", data.len()));

    let mut downloader = FeedDownloader::new(catalog, transport)
        .with_handlers(handlers)
        .with_previous_sources(previous);
    let discovered = downloader.discover_sources()?.len();
    let payloads = downloader.download();
    drop(downloader);

    let mut report = RefreshReport {
        discovered,
        unchanged: unchanged.into_inner(),
        failed: failed.into_inner(),
        ..RefreshReport::default()
    };
    for (source, payload) in payloads {
        let parsed = parse_feed(&source, &payload.data);
        if parsed.records.is_empty() {
            warn!("{source} held no usable rows; keeping the stored ranges");
            report.failed.push(source);
            continue;
        }
        let records = store.replace_source_records(&source, &parsed.records)?;
        store.add_source(&source, &payload.uri)?;
        info!("{source}: stored {records} ranges, skipped {} rows", parsed.skipped);
        report.refreshed.push(FeedRefresh {
            source,
            records,
            skipped: parsed.skipped,
        });
    }
    Ok(report)
}

pub(crate) fn write_report(writer: &mut dyn Write, report: &RefreshReport) -> Result<(), CliError> {
    writeln!(writer, "feeds discovered: {}", report.discovered).map_err(CliError::WriteOutput)?;
    for feed in &report.refreshed {
        writeln!(
            writer,
            "{}: {} ranges stored, {} rows skipped",
            feed.source, feed.records, feed.skipped
        )
        .map_err(CliError::WriteOutput)?;
    }
    for source in &report.unchanged {
        writeln!(writer, "{source}: unchanged").map_err(CliError::WriteOutput)?;
    }
    for source in &report.failed {
        writeln!(writer, "{source}: failed").map_err(CliError::WriteOutput)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<UpdateConfig, CliError> {
    let merged = UpdateArgs::merge_from_layers(layers).map_err(CliError::from)?;
    UpdateConfig::try_from(merged)
}
