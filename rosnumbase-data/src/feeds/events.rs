//! Progress and failure notifications emitted while downloading feeds.

use rosnumbase_core::SourceId;

use super::RequestError;

/// Every notification the downloader can emit.
#[derive(Debug, Clone, Copy)]
pub enum DownloadEvent<'a> {
    /// Processing of a feed started.
    Request {
        /// Feed being processed.
        source: &'a SourceId,
    },
    /// The feed URL matched the previously recorded one; nothing was fetched.
    NoUpdates {
        /// Unchanged feed.
        source: &'a SourceId,
    },
    /// A HEAD or ranged GET answered with a non-success status.
    HttpError {
        /// Affected feed.
        source: &'a SourceId,
        /// HTTP status code.
        status: u16,
    },
    /// A HEAD or ranged GET failed below HTTP.
    RequestError {
        /// Affected feed.
        source: &'a SourceId,
        /// Failure description.
        error: &'a RequestError,
    },
    /// One ranged piece arrived successfully.
    HttpRange {
        /// Feed the piece belongs to.
        source: &'a SourceId,
        /// Piece body.
        data: &'a [u8],
    },
    /// A feed was downloaded completely.
    Success {
        /// Downloaded feed.
        source: &'a SourceId,
        /// URL the feed was fetched from.
        uri: &'a str,
        /// Decoded payload.
        data: &'a str,
    },
}

type SourceHandler<'h> = Box<dyn FnMut(&SourceId) + 'h>;
type StatusHandler<'h> = Box<dyn FnMut(&SourceId, u16) + 'h>;
type RequestErrorHandler<'h> = Box<dyn FnMut(&SourceId, &RequestError) + 'h>;
type RangeHandler<'h> = Box<dyn FnMut(&SourceId, &[u8]) + 'h>;
type SuccessHandler<'h> = Box<dyn FnMut(&SourceId, &str, &str) + 'h>;

/// One optional callback per [`DownloadEvent`] kind.
///
/// Unset slots ignore their events.
///
/// # Examples
/// ```
/// use std::cell::Cell;
/// use rosnumbase_core::SourceId;
/// use rosnumbase_data::feeds::{DownloadEvent, DownloadHandlers};
///
/// let requests = Cell::new(0);
/// let mut handlers = DownloadHandlers::new().on_request(|_| requests.set(requests.get() + 1));
/// let source = SourceId::from("ABC3XX");
/// handlers.emit(DownloadEvent::Request { source: &source });
/// handlers.emit(DownloadEvent::NoUpdates { source: &source });
/// drop(handlers);
/// assert_eq!(requests.get(), 1);
/// ```
#[derive(Default)]
pub struct DownloadHandlers<'h> {
    request: Option<SourceHandler<'h>>,
    no_updates: Option<SourceHandler<'h>>,
    http_error: Option<StatusHandler<'h>>,
    request_error: Option<RequestErrorHandler<'h>>,
    http_range: Option<RangeHandler<'h>>,
    success: Option<SuccessHandler<'h>>,
}

impl std::fmt::Debug for DownloadHandlers<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadHandlers")
            .field("on_request", &self.request.is_some())
            .field("on_no_updates", &self.no_updates.is_some())
            .field("on_http_error", &self.http_error.is_some())
            .field("on_request_error", &self.request_error.is_some())
            .field("on_http_range", &self.http_range.is_some())
            .field("on_success", &self.success.is_some())
            .finish()
    }
}

impl<'h> DownloadHandlers<'h> {
    /// Handlers with every slot unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when processing of a feed starts.
    #[must_use]
    pub fn on_request(mut self, handler: impl FnMut(&SourceId) + 'h) -> Self {
        self.request = Some(Box::new(handler));
        self
    }

    /// Called when a feed is skipped because its URL is unchanged.
    #[must_use]
    pub fn on_no_updates(mut self, handler: impl FnMut(&SourceId) + 'h) -> Self {
        self.no_updates = Some(Box::new(handler));
        self
    }

    /// Called with the status code of a non-success response.
    #[must_use]
    pub fn on_http_error(mut self, handler: impl FnMut(&SourceId, u16) + 'h) -> Self {
        self.http_error = Some(Box::new(handler));
        self
    }

    /// Called when a request fails below HTTP.
    #[must_use]
    pub fn on_request_error(
        mut self,
        handler: impl FnMut(&SourceId, &RequestError) + 'h,
    ) -> Self {
        self.request_error = Some(Box::new(handler));
        self
    }

    /// Called with the body of every successful ranged piece.
    #[must_use]
    pub fn on_http_range(mut self, handler: impl FnMut(&SourceId, &[u8]) + 'h) -> Self {
        self.http_range = Some(Box::new(handler));
        self
    }

    /// Called with the URL and decoded payload of a completed feed.
    #[must_use]
    pub fn on_success(mut self, handler: impl FnMut(&SourceId, &str, &str) + 'h) -> Self {
        self.success = Some(Box::new(handler));
        self
    }

    /// Dispatch `event` to its slot, if one is registered.
    pub fn emit(&mut self, event: DownloadEvent<'_>) {
        match event {
            DownloadEvent::Request { source } => {
                if let Some(handler) = self.request.as_mut() {
                    handler(source);
                }
            }
            DownloadEvent::NoUpdates { source } => {
                if let Some(handler) = self.no_updates.as_mut() {
                    handler(source);
                }
            }
            DownloadEvent::HttpError { source, status } => {
                if let Some(handler) = self.http_error.as_mut() {
                    handler(source, status);
                }
            }
            DownloadEvent::RequestError { source, error } => {
                if let Some(handler) = self.request_error.as_mut() {
                    handler(source, error);
                }
            }
            DownloadEvent::HttpRange { source, data } => {
                if let Some(handler) = self.http_range.as_mut() {
                    handler(source, data);
                }
            }
            DownloadEvent::Success { source, uri, data } => {
                if let Some(handler) = self.success.as_mut() {
                    handler(source, uri, data);
                }
            }
        }
    }
}
