//! Discovery and change-aware ranged download of registry feeds.

use std::collections::BTreeMap;

use log::{debug, info};
use rosnumbase_core::SourceId;

use super::{
    DiscoveryError, DownloadEvent, DownloadHandlers, FeedCatalog, FeedTransport, RangePlan,
    RequestError,
};

/// A downloaded feed together with the URL it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPayload {
    /// URL of this revision of the feed, as found on the listing page.
    pub uri: String,
    /// Feed contents decoded as UTF-8.
    pub data: String,
}

/// Downloads the feeds of a [`FeedCatalog`] over a [`FeedTransport`].
///
/// A downloader first discovers the current feed URLs with
/// [`discover_sources`](Self::discover_sources) and then fetches the changed
/// ones with [`download`](Self::download). Feeds whose URL matches the
/// previously recorded one are skipped without any request. Every request is
/// issued sequentially and failures only abandon the affected feed.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use rosnumbase_data::feeds::{
///     DownloadHandlers, FeedCatalog, FeedDownloader, test_support::StubTransport,
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = FeedCatalog::for_origin("http://registry.test")?;
/// let feed = "http://registry.test/downloads/ABC-3xx.csv?7";
/// let transport = StubTransport::new()
///     .with_resource(catalog.listing_url(), format!("<a href=\"{feed}\">"))
///     .with_resource(feed, "code;from;to\n301;0;9999999\n");
///
/// let mut downloader = FeedDownloader::new(catalog, &transport)
///     .with_handlers(DownloadHandlers::new())
///     .with_previous_sources(BTreeMap::new());
/// downloader.discover_sources()?;
/// let payloads = downloader.download();
/// assert_eq!(
///     payloads.get("ABC3XX").map(|payload| payload.data.as_str()),
///     Some("code;from;to\n301;0;9999999\n"),
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FeedDownloader<'h, T> {
    catalog: FeedCatalog,
    transport: T,
    handlers: DownloadHandlers<'h>,
    discovered: BTreeMap<SourceId, String>,
    previous: BTreeMap<SourceId, String>,
}

impl<'h, T: FeedTransport> FeedDownloader<'h, T> {
    /// Create a downloader with no handlers and no previous sources.
    #[must_use]
    pub fn new(catalog: FeedCatalog, transport: T) -> Self {
        Self {
            catalog,
            transport,
            handlers: DownloadHandlers::new(),
            discovered: BTreeMap::new(),
            previous: BTreeMap::new(),
        }
    }

    /// Replace the event handlers.
    #[must_use]
    pub fn with_handlers(mut self, handlers: DownloadHandlers<'h>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Feed URLs recorded by the previous cycle, used for change detection.
    #[must_use]
    pub fn with_previous_sources(mut self, previous: BTreeMap<SourceId, String>) -> Self {
        self.previous = previous;
        self
    }

    /// Feed URLs found by the last successful discovery.
    #[must_use]
    pub const fn discovered_sources(&self) -> &BTreeMap<SourceId, String> {
        &self.discovered
    }

    /// Previous feed URLs supplied by the caller.
    #[must_use]
    pub const fn previous_sources(&self) -> &BTreeMap<SourceId, String> {
        &self.previous
    }

    /// Fetch the listing page and extract the current URL of every feed.
    ///
    /// Feeds missing from the page are omitted. The result replaces the
    /// discovered sources used by [`download`](Self::download).
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] when the listing page cannot be fetched or
    /// answers with a non-success status. The previously discovered sources
    /// are kept in that case.
    pub fn discover_sources(&mut self) -> Result<BTreeMap<SourceId, String>, DiscoveryError> {
        let url = self.catalog.listing_url();
        let response = self
            .transport
            .get(url)
            .map_err(|source| DiscoveryError::Transport { source })?;
        if !response.is_success() {
            return Err(DiscoveryError::Status {
                url: url.to_owned(),
                status: response.status,
            });
        }
        let page = String::from_utf8_lossy(&response.body);
        self.discovered = self.catalog.discover(&page);
        info!(
            "discovered {} of {} feeds at {url}",
            self.discovered.len(),
            self.catalog.feeds().len()
        );
        Ok(self.discovered.clone())
    }

    /// Download every discovered feed whose URL changed.
    ///
    /// Feeds that were unchanged or failed are absent from the result; their
    /// outcome is reported through the registered handlers.
    #[must_use]
    pub fn download(&mut self) -> BTreeMap<SourceId, FeedPayload> {
        let mut payloads = BTreeMap::new();
        for (source, uri) in &self.discovered {
            self.handlers.emit(DownloadEvent::Request { source });
            if self.previous.get(source) == Some(uri) {
                debug!("{source} is unchanged at {uri}");
                self.handlers.emit(DownloadEvent::NoUpdates { source });
                continue;
            }
            let Some(bytes) = fetch_feed(&self.transport, &mut self.handlers, source, uri) else {
                continue;
            };
            let data = String::from_utf8_lossy(&bytes).into_owned();
            info!("downloaded {source}: {} bytes from {uri}", bytes.len());
            self.handlers.emit(DownloadEvent::Success {
                source,
                uri,
                data: &data,
            });
            payloads.insert(
                source.clone(),
                FeedPayload {
                    uri: uri.clone(),
                    data,
                },
            );
        }
        payloads
    }
}

/// Fetch one feed piece by piece; `None` once a failure has been reported.
fn fetch_feed<T: FeedTransport>(
    transport: &T,
    handlers: &mut DownloadHandlers<'_>,
    source: &SourceId,
    uri: &str,
) -> Option<Vec<u8>> {
    let head = match transport.head(uri) {
        Ok(head) => head,
        Err(err) => {
            report_request_error(handlers, source, &RequestError::from(err));
            return None;
        }
    };
    if !head.is_success() {
        report_status(handlers, source, head.status);
        return None;
    }
    let Some(plan) = head.content_length.and_then(RangePlan::new) else {
        let error = RequestError::MissingLength {
            url: uri.to_owned(),
        };
        report_request_error(handlers, source, &error);
        return None;
    };
    debug!(
        "{source}: {} bytes in {} pieces of {}",
        plan.length(),
        plan.piece_count(),
        plan.piece_length()
    );

    // Declared lengths are untrusted; grow with the pieces actually received.
    let mut buffer = Vec::new();
    for range in plan.ranges() {
        let piece = match transport.get_range(uri, range) {
            Ok(piece) => piece,
            Err(err) => {
                report_request_error(handlers, source, &RequestError::from(err));
                return None;
            }
        };
        if !piece.is_success() {
            report_status(handlers, source, piece.status);
            return None;
        }
        handlers.emit(DownloadEvent::HttpRange {
            source,
            data: &piece.body,
        });
        buffer.extend_from_slice(&piece.body);
    }
    Some(buffer)
}

fn report_request_error(
    handlers: &mut DownloadHandlers<'_>,
    source: &SourceId,
    error: &RequestError,
) {
    info!("abandoning {source}: {error}");
    handlers.emit(DownloadEvent::RequestError { source, error });
}

fn report_status(handlers: &mut DownloadHandlers<'_>, source: &SourceId, status: u16) {
    info!("abandoning {source}: HTTP {status}");
    handlers.emit(DownloadEvent::HttpError { source, status });
}
