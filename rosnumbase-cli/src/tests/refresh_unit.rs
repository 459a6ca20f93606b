//! Update cycles driven against a stub registry and an in-memory store.

use super::helpers::{
    ABC3, ABC3_FEED, ABC3_NEXT, ABC3_NEXT_FEED, DEF9, DEF9_FEED, catalog, memory_store, registry,
};
use super::*;
use crate::refresh::{FeedRefresh, refresh_registry};
use rosnumbase_core::SourceId;
use rosnumbase_data::feeds::{DiscoveryError, test_support::RecordedRequest};
use rstest::rstest;

fn feed_requests(requests: &[RecordedRequest]) -> usize {
    requests
        .iter()
        .filter(|request| !matches!(request, RecordedRequest::Get(_)))
        .count()
}

#[rstest]
fn first_cycle_stores_every_feed() {
    let mut store = memory_store();
    let transport = registry(&[(ABC3, ABC3_FEED), (DEF9, DEF9_FEED)]);

    let report = refresh_registry(&mut store, catalog(), &transport, false).expect("refresh");

    assert_eq!(report.discovered, 2);
    assert_eq!(
        report.refreshed,
        [
            FeedRefresh {
                source: SourceId::from("ABC3XX"),
                records: 2,
                skipped: 0,
            },
            FeedRefresh {
                source: SourceId::from("DEF9XX"),
                records: 2,
                skipped: 0,
            },
        ]
    );
    let sources = store.list_sources().expect("list sources");
    assert_eq!(sources.get("ABC3XX").map(String::as_str), Some(ABC3));
    assert_eq!(sources.get("DEF9XX").map(String::as_str), Some(DEF9));
    let found = store.find_record(912, 3_456_789).expect("lookup");
    assert_eq!(found.map(|record| record.operator), Some("ПАО МТС".to_owned()));
}

#[rstest]
fn second_cycle_skips_unchanged_feeds() {
    let mut store = memory_store();
    let transport = registry(&[(ABC3, ABC3_FEED), (DEF9, DEF9_FEED)]);
    refresh_registry(&mut store, catalog(), &transport, false).expect("first refresh");
    let before = feed_requests(&transport.requests());

    let report =
        refresh_registry(&mut store, catalog(), &transport, false).expect("second refresh");

    assert!(report.refreshed.is_empty());
    assert_eq!(
        report.unchanged,
        [SourceId::from("ABC3XX"), SourceId::from("DEF9XX")]
    );
    assert_eq!(feed_requests(&transport.requests()), before);
}

#[rstest]
fn force_downloads_unchanged_feeds() {
    let mut store = memory_store();
    let transport = registry(&[(ABC3, ABC3_FEED)]);
    refresh_registry(&mut store, catalog(), &transport, false).expect("first refresh");

    let report = refresh_registry(&mut store, catalog(), &transport, true).expect("forced refresh");

    assert!(report.unchanged.is_empty());
    assert_eq!(report.refreshed.len(), 1);
    assert_eq!(store.count_records(None).expect("count"), 2);
}

#[rstest]
fn new_revision_replaces_only_its_feed() {
    let mut store = memory_store();
    refresh_registry(
        &mut store,
        catalog(),
        &registry(&[(ABC3, ABC3_FEED), (DEF9, DEF9_FEED)]),
        false,
    )
    .expect("first refresh");

    let report = refresh_registry(
        &mut store,
        catalog(),
        &registry(&[(ABC3_NEXT, ABC3_NEXT_FEED), (DEF9, DEF9_FEED)]),
        false,
    )
    .expect("second refresh");

    assert_eq!(
        report.refreshed,
        [FeedRefresh {
            source: SourceId::from("ABC3XX"),
            records: 1,
            skipped: 1,
        }]
    );
    assert_eq!(report.unchanged, [SourceId::from("DEF9XX")]);
    assert_eq!(store.find_record(301, 2_115_000).expect("old range"), None);
    assert!(store.find_record(301, 2_120_500).expect("new range").is_some());
    assert_eq!(
        store.count_records(Some(&SourceId::from("DEF9XX"))).expect("count"),
        2
    );
    let sources = store.list_sources().expect("list sources");
    assert_eq!(sources.get("ABC3XX").map(String::as_str), Some(ABC3_NEXT));
}

#[rstest]
fn failed_download_keeps_ranges_and_location() {
    let mut store = memory_store();
    refresh_registry(&mut store, catalog(), &registry(&[(ABC3, ABC3_FEED)]), false)
        .expect("first refresh");
    let transport = registry(&[(ABC3_NEXT, ABC3_NEXT_FEED)]).with_piece_status(ABC3_NEXT, 3, 503);

    let report = refresh_registry(&mut store, catalog(), &transport, false).expect("refresh");

    assert_eq!(report.failed, [SourceId::from("ABC3XX")]);
    assert!(report.refreshed.is_empty());
    assert!(store.find_record(301, 2_115_000).expect("lookup").is_some());
    let sources = store.list_sources().expect("list sources");
    assert_eq!(sources.get("ABC3XX").map(String::as_str), Some(ABC3));
}

#[rstest]
fn feed_without_valid_rows_is_not_recorded() {
    let mut store = memory_store();
    let transport = registry(&[(ABC3, "code;from;to;capacity;operator;region\n301;x;y;z;a;b\n")]);

    let report = refresh_registry(&mut store, catalog(), &transport, false).expect("refresh");

    assert_eq!(report.failed, [SourceId::from("ABC3XX")]);
    assert!(store.list_sources().expect("list sources").is_empty());
}

#[rstest]
fn unavailable_listing_aborts_the_cycle() {
    let mut store = memory_store();
    let transport = registry(&[]).with_status(catalog().listing_url(), 502);

    let err = refresh_registry(&mut store, catalog(), &transport, false)
        .expect_err("discovery should fail");

    match err {
        CliError::Discovery(DiscoveryError::Status { status, .. }) => assert_eq!(status, 502),
        other => panic!("expected a discovery error, found {other:?}"),
    }
}

#[rstest]
fn report_lists_every_outcome() {
    let report = refresh::RefreshReport {
        discovered: 3,
        refreshed: vec![FeedRefresh {
            source: SourceId::from("ABC3XX"),
            records: 2,
            skipped: 1,
        }],
        unchanged: vec![SourceId::from("DEF9XX")],
        failed: vec![SourceId::from("ABC4XX")],
    };
    let mut output = Vec::new();

    refresh::write_report(&mut output, &report).expect("write report");

    assert_eq!(
        String::from_utf8(output).expect("utf-8 output"),
        "feeds discovered: 3\n\
         ABC3XX: 2 ranges stored, 1 rows skipped\n\
         DEF9XX: unchanged\n\
         ABC4XX: failed\n"
    );
}
