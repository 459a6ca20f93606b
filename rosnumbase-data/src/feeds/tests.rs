//! Tests for discovery and ranged downloads against the stub transport.

use std::{cell::RefCell, collections::BTreeMap};

use rosnumbase_core::SourceId;
use rstest::{fixture, rstest};

use super::test_support::{RecordedRequest, StubTransport};
use super::*;

const ORIGIN: &str = "http://registry.test";
const ABC3: &str = "http://registry.test/downloads/ABC-3xx.csv?1700000001";
const DEF9: &str = "http://registry.test/downloads/DEF-9xx.csv?1700000002";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Request(String),
    NoUpdates(String),
    HttpError(String, u16),
    RequestError(String),
    HttpRange(String, usize),
    Success(String, String),
}

#[derive(Debug, Default)]
struct Recorder {
    events: RefCell<Vec<Seen>>,
}

impl Recorder {
    fn handlers(&self) -> DownloadHandlers<'_> {
        DownloadHandlers::new()
            .on_request(move |source| self.push(Seen::Request(source.to_string())))
            .on_no_updates(move |source| self.push(Seen::NoUpdates(source.to_string())))
            .on_http_error(move |source, status| {
                self.push(Seen::HttpError(source.to_string(), status));
            })
            .on_request_error(move |source, _| self.push(Seen::RequestError(source.to_string())))
            .on_http_range(move |source, data| {
                self.push(Seen::HttpRange(source.to_string(), data.len()));
            })
            .on_success(move |source, uri, _| {
                self.push(Seen::Success(source.to_string(), uri.to_owned()));
            })
    }

    fn push(&self, seen: Seen) {
        self.events.borrow_mut().push(seen);
    }

    fn events(&self) -> Vec<Seen> {
        self.events.borrow().clone()
    }

    fn count(&self, predicate: impl Fn(&Seen) -> bool) -> usize {
        self.events.borrow().iter().filter(|seen| predicate(seen)).count()
    }
}

#[fixture]
fn catalog() -> FeedCatalog {
    FeedCatalog::for_origin(ORIGIN).expect("test origin should parse")
}

#[fixture]
fn recorder() -> Recorder {
    Recorder::default()
}

fn listing(uris: &[&str]) -> String {
    uris.iter()
        .map(|uri| format!("<a href=\"{uri}\">feed</a>\n"))
        .collect()
}

fn payload(length: usize) -> Vec<u8> {
    b"0123456789;\n".iter().copied().cycle().take(length).collect()
}

fn previous(entries: &[(&str, &str)]) -> BTreeMap<SourceId, String> {
    entries
        .iter()
        .map(|(source, uri)| (SourceId::from(*source), (*uri).to_owned()))
        .collect()
}

#[rstest]
fn discovery_records_matching_feeds(catalog: FeedCatalog) {
    let transport = StubTransport::new().with_resource(
        catalog.listing_url().to_owned(),
        listing(&[ABC3, DEF9]),
    );
    let mut downloader = FeedDownloader::new(catalog, &transport);

    let found = downloader.discover_sources().expect("listing is served");

    assert_eq!(found, previous(&[("ABC3XX", ABC3), ("DEF9XX", DEF9)]));
    assert_eq!(downloader.discovered_sources(), &found);
    assert_eq!(
        transport.requests(),
        [RecordedRequest::Get(
            "http://registry.test/registry/numeric/downloads/".to_owned()
        )]
    );
}

#[rstest]
fn discovery_fails_on_error_status(catalog: FeedCatalog) {
    let transport = StubTransport::new().with_status(catalog.listing_url().to_owned(), 503);
    let mut downloader = FeedDownloader::new(catalog, &transport);

    let err = downloader.discover_sources().expect_err("listing is unavailable");

    assert!(matches!(err, DiscoveryError::Status { status: 503, .. }));
    assert!(downloader.discovered_sources().is_empty());
}

#[rstest]
fn discovery_fails_when_listing_is_unreachable(catalog: FeedCatalog) {
    let transport = StubTransport::new().with_unreachable(catalog.listing_url().to_owned());
    let mut downloader = FeedDownloader::new(catalog, &transport);

    let err = downloader.discover_sources().expect_err("listing is unreachable");

    assert!(matches!(
        err,
        DiscoveryError::Transport {
            source: TransportError::Network { .. }
        }
    ));
}

#[rstest]
fn unchanged_feeds_are_not_requested(catalog: FeedCatalog, recorder: Recorder) {
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3]))
        .with_resource(ABC3, payload(150));
    let mut downloader = FeedDownloader::new(catalog, &transport)
        .with_handlers(recorder.handlers())
        .with_previous_sources(previous(&[("ABC3XX", ABC3)]));

    downloader.discover_sources().expect("listing is served");
    let payloads = downloader.download();
    drop(downloader);

    assert!(payloads.is_empty());
    assert!(transport.requests_to(ABC3).is_empty());
    assert_eq!(
        recorder.events(),
        [
            Seen::Request("ABC3XX".to_owned()),
            Seen::NoUpdates("ABC3XX".to_owned()),
        ]
    );
}

#[rstest]
fn changed_stamp_triggers_download(catalog: FeedCatalog, recorder: Recorder) {
    let body = payload(40);
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3]))
        .with_resource(ABC3, body.clone());
    let stale = previous(&[("ABC3XX", "http://registry.test/downloads/ABC-3xx.csv?1")]);
    let mut downloader = FeedDownloader::new(catalog, &transport)
        .with_handlers(recorder.handlers())
        .with_previous_sources(stale.clone());

    downloader.discover_sources().expect("listing is served");
    let payloads = downloader.download();
    assert_eq!(downloader.previous_sources(), &stale);
    drop(downloader);

    let fetched = payloads.get("ABC3XX").expect("feed downloaded");
    assert_eq!(fetched.uri, ABC3);
    assert_eq!(fetched.data.as_bytes(), body.as_slice());
    assert_eq!(recorder.count(|seen| matches!(seen, Seen::NoUpdates(_))), 0);
    assert_eq!(
        recorder.events().last(),
        Some(&Seen::Success("ABC3XX".to_owned(), ABC3.to_owned()))
    );
}

#[rstest]
fn ranged_download_reproduces_resource_exactly(catalog: FeedCatalog, recorder: Recorder) {
    let body = payload(150);
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3]))
        .with_resource(ABC3, body.clone());
    let mut downloader =
        FeedDownloader::new(catalog, &transport).with_handlers(recorder.handlers());

    downloader.discover_sources().expect("listing is served");
    let payloads = downloader.download();
    drop(downloader);

    let requests = transport.requests_to(ABC3);
    assert_eq!(requests.first(), Some(&RecordedRequest::Head(ABC3.to_owned())));
    let ranges: Vec<ByteRange> = requests
        .iter()
        .filter_map(|request| match request {
            RecordedRequest::Range(_, range) => Some(*range),
            _ => None,
        })
        .collect();
    assert_eq!(ranges.len(), 15);
    assert_eq!(ranges.first(), Some(&ByteRange { start: 0, end: 9 }));
    assert_eq!(ranges.last(), Some(&ByteRange { start: 140, end: 150 }));
    assert_eq!(
        payloads.get("ABC3XX").map(|fetched| fetched.data.as_bytes()),
        Some(body.as_slice())
    );
    assert_eq!(recorder.count(|seen| matches!(seen, Seen::HttpRange(_, 10))), 15);
}

#[rstest]
fn multibyte_text_split_across_pieces_survives(catalog: FeedCatalog) {
    let text = "code;from;to;capacity;operator;region\n301;0;999;1000;ПАО МТС;Республика Бурятия\n";
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3]))
        .with_resource(ABC3, text);
    let mut downloader = FeedDownloader::new(catalog, &transport);

    downloader.discover_sources().expect("listing is served");
    let payloads = downloader.download();

    assert_eq!(
        payloads.get("ABC3XX").map(|fetched| fetched.data.as_str()),
        Some(text)
    );
}

#[rstest]
fn failing_piece_abandons_only_its_feed(catalog: FeedCatalog, recorder: Recorder) {
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3, DEF9]))
        .with_resource(ABC3, payload(150))
        .with_piece_status(ABC3, 7, 500)
        .with_resource(DEF9, payload(150));
    let mut downloader =
        FeedDownloader::new(catalog, &transport).with_handlers(recorder.handlers());

    downloader.discover_sources().expect("listing is served");
    let payloads = downloader.download();
    drop(downloader);

    assert!(!payloads.contains_key("ABC3XX"));
    assert!(payloads.contains_key("DEF9XX"));
    assert_eq!(
        recorder.count(|seen| *seen == Seen::HttpError("ABC3XX".to_owned(), 500)),
        1
    );
    assert_eq!(
        recorder.count(|seen| matches!(seen, Seen::Success(source, _) if source == "ABC3XX")),
        0
    );
    assert_eq!(
        recorder.count(|seen| matches!(seen, Seen::HttpRange(source, _) if source == "ABC3XX")),
        7
    );
    // HEAD plus pieces 0..=7; nothing after the failure.
    assert_eq!(transport.requests_to(ABC3).len(), 9);
}

#[rstest]
fn oversized_declared_length_abandons_only_its_feed(catalog: FeedCatalog, recorder: Recorder) {
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3, DEF9]))
        .with_resource(ABC3, payload(150))
        .with_content_length(ABC3, Some(u64::MAX))
        .with_resource(DEF9, payload(30));
    let mut downloader =
        FeedDownloader::new(catalog, &transport).with_handlers(recorder.handlers());

    downloader.discover_sources().expect("listing is served");
    let payloads = downloader.download();
    drop(downloader);

    assert!(!payloads.contains_key("ABC3XX"));
    assert_eq!(
        payloads.get("DEF9XX").map(|fetched| fetched.data.as_bytes().to_vec()),
        Some(payload(30))
    );
    // The first piece is clamped to the real body; the second starts past it.
    assert_eq!(
        recorder.count(|seen| *seen == Seen::HttpError("ABC3XX".to_owned(), 416)),
        1
    );
}

#[rstest]
fn head_error_status_skips_feed(catalog: FeedCatalog, recorder: Recorder) {
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3, DEF9]))
        .with_status(ABC3, 404)
        .with_resource(DEF9, payload(30));
    let mut downloader =
        FeedDownloader::new(catalog, &transport).with_handlers(recorder.handlers());

    downloader.discover_sources().expect("listing is served");
    let payloads = downloader.download();
    drop(downloader);

    assert_eq!(payloads.keys().map(SourceId::as_str).collect::<Vec<_>>(), ["DEF9XX"]);
    assert_eq!(transport.requests_to(ABC3), [RecordedRequest::Head(ABC3.to_owned())]);
    assert_eq!(
        recorder.count(|seen| *seen == Seen::HttpError("ABC3XX".to_owned(), 404)),
        1
    );
}

#[rstest]
fn transport_failure_is_reported_per_feed(catalog: FeedCatalog, recorder: Recorder) {
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3, DEF9]))
        .with_unreachable(ABC3)
        .with_resource(DEF9, payload(30));
    let mut downloader =
        FeedDownloader::new(catalog, &transport).with_handlers(recorder.handlers());

    downloader.discover_sources().expect("listing is served");
    let payloads = downloader.download();
    drop(downloader);

    assert!(payloads.contains_key("DEF9XX"));
    assert!(!payloads.contains_key("ABC3XX"));
    assert_eq!(
        recorder.count(|seen| *seen == Seen::RequestError("ABC3XX".to_owned())),
        1
    );
}

#[rstest]
#[case(None)]
#[case(Some(0))]
fn feeds_without_length_are_abandoned(catalog: FeedCatalog, #[case] length: Option<u64>) {
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3]))
        .with_resource(ABC3, payload(20))
        .with_content_length(ABC3, length);
    let errors = RefCell::new(Vec::new());
    let handlers = DownloadHandlers::new().on_request_error(|source, error| {
        errors
            .borrow_mut()
            .push((source.clone(), matches!(error, RequestError::MissingLength { .. })));
    });
    let mut downloader = FeedDownloader::new(catalog, &transport).with_handlers(handlers);

    downloader.discover_sources().expect("listing is served");
    let payloads = downloader.download();
    drop(downloader);

    assert!(payloads.is_empty());
    assert_eq!(errors.into_inner(), [(SourceId::from("ABC3XX"), true)]);
    assert_eq!(transport.requests_to(ABC3).len(), 1);
}

#[rstest]
fn download_without_discovery_does_nothing(catalog: FeedCatalog) {
    let transport = StubTransport::new();
    let mut downloader = FeedDownloader::new(catalog, &transport);

    assert!(downloader.download().is_empty());
    assert!(transport.requests().is_empty());
}

#[rstest]
fn unregistered_events_are_ignored(catalog: FeedCatalog) {
    let transport = StubTransport::new()
        .with_resource(catalog.listing_url().to_owned(), listing(&[ABC3, DEF9]))
        .with_status(DEF9, 500)
        .with_resource(ABC3, payload(16));
    let mut downloader = FeedDownloader::new(catalog, &transport);

    downloader.discover_sources().expect("listing is served");

    assert_eq!(downloader.download().len(), 1);
}
