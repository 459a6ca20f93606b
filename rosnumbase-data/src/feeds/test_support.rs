//! Test utilities for feed downloads.
//!
//! [`StubTransport`] serves in-memory resources, answers ranged requests the
//! way an HTTP server does and records every request it receives, so tests
//! can exercise discovery and downloads without a network.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    io,
};

use super::{ByteRange, FeedResponse, FeedTransport, TransportError};

/// One request received by a [`StubTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    /// Plain GET of the URL.
    Get(String),
    /// HEAD of the URL.
    Head(String),
    /// Ranged GET of the URL.
    Range(String, ByteRange),
}

impl RecordedRequest {
    /// URL the request was sent to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Get(url) | Self::Head(url) | Self::Range(url, _) => url,
        }
    }
}

/// Deterministic in-memory [`FeedTransport`].
///
/// Unknown URLs answer 404. Ranged requests past the end of a resource are
/// clamped to its last byte and answered with 206.
///
/// # Example
///
/// ```
/// use rosnumbase_data::feeds::{ByteRange, FeedTransport, test_support::StubTransport};
///
/// let transport = StubTransport::new().with_resource("http://feeds.test/a.csv", "abcdef");
/// let piece = transport
///     .get_range("http://feeds.test/a.csv", ByteRange { start: 4, end: 6 })
///     .expect("stub never fails unless told to");
/// assert_eq!(piece.status, 206);
/// assert_eq!(piece.body, b"ef");
/// ```
#[derive(Debug, Default)]
pub struct StubTransport {
    resources: BTreeMap<String, Vec<u8>>,
    statuses: BTreeMap<String, u16>,
    piece_statuses: BTreeMap<String, (usize, u16)>,
    lengths: BTreeMap<String, Option<u64>>,
    unreachable: BTreeSet<String>,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl StubTransport {
    /// Transport serving nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`.
    #[must_use]
    pub fn with_resource(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(url.into(), body.into());
        self
    }

    /// Answer every request to `url` with `status` and an empty body.
    #[must_use]
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.statuses.insert(url.into(), status);
        self
    }

    /// Answer the ranged request number `index` (0-based) to `url` with
    /// `status`.
    #[must_use]
    pub fn with_piece_status(mut self, url: impl Into<String>, index: usize, status: u16) -> Self {
        self.piece_statuses.insert(url.into(), (index, status));
        self
    }

    /// Report `length` as the content length of `url` on HEAD; `None` omits
    /// the header.
    #[must_use]
    pub fn with_content_length(mut self, url: impl Into<String>, length: Option<u64>) -> Self {
        self.lengths.insert(url.into(), length);
        self
    }

    /// Fail every request to `url` with a connection error.
    #[must_use]
    pub fn with_unreachable(mut self, url: impl Into<String>) -> Self {
        self.unreachable.insert(url.into());
        self
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    /// Requests received for `url`, in order.
    #[must_use]
    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.url() == url)
            .cloned()
            .collect()
    }

    fn record(&self, request: RecordedRequest) -> Result<(), TransportError> {
        let url = request.url().to_owned();
        self.requests.borrow_mut().push(request);
        if self.unreachable.contains(&url) {
            return Err(TransportError::Network {
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "stub connection refused"),
                url,
            });
        }
        Ok(())
    }

    fn ranges_requested(&self, url: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|request| matches!(request, RecordedRequest::Range(target, _) if target == url))
            .count()
    }

    fn fixed_status(&self, url: &str) -> Option<FeedResponse> {
        if let Some(status) = self.statuses.get(url) {
            return Some(empty(*status, None));
        }
        if self.resources.contains_key(url) {
            None
        } else {
            Some(empty(404, None))
        }
    }
}

impl FeedTransport for StubTransport {
    fn get(&self, url: &str) -> Result<FeedResponse, TransportError> {
        self.record(RecordedRequest::Get(url.to_owned()))?;
        if let Some(response) = self.fixed_status(url) {
            return Ok(response);
        }
        let body = self.resources.get(url).cloned().unwrap_or_default();
        Ok(FeedResponse {
            status: 200,
            content_length: Some(len(&body)),
            body,
        })
    }

    fn head(&self, url: &str) -> Result<FeedResponse, TransportError> {
        self.record(RecordedRequest::Head(url.to_owned()))?;
        if let Some(response) = self.fixed_status(url) {
            return Ok(response);
        }
        let actual = self.resources.get(url).map(|body| len(body));
        let declared = self.lengths.get(url).copied().unwrap_or(actual);
        Ok(empty(200, declared))
    }

    fn get_range(&self, url: &str, range: ByteRange) -> Result<FeedResponse, TransportError> {
        let index = self.ranges_requested(url);
        self.record(RecordedRequest::Range(url.to_owned(), range))?;
        if let Some(response) = self.fixed_status(url) {
            return Ok(response);
        }
        if let Some((failing, status)) = self.piece_statuses.get(url)
            && *failing == index
        {
            return Ok(empty(*status, None));
        }
        let body = self.resources.get(url).map(Vec::as_slice).unwrap_or_default();
        let Some(last) = len(body).checked_sub(1).filter(|last| range.start <= *last) else {
            return Ok(empty(416, None));
        };
        let start = usize::try_from(range.start).unwrap_or(usize::MAX);
        let end = usize::try_from(range.end.min(last)).unwrap_or(usize::MAX);
        let piece = body.get(start..=end).map(<[u8]>::to_vec).unwrap_or_default();
        Ok(FeedResponse {
            status: 206,
            content_length: Some(len(&piece)),
            body: piece,
        })
    }
}

const fn empty(status: u16, content_length: Option<u64>) -> FeedResponse {
    FeedResponse {
        status,
        content_length,
        body: Vec::new(),
    }
}

fn len(body: &[u8]) -> u64 {
    u64::try_from(body.len()).unwrap_or(u64::MAX)
}
