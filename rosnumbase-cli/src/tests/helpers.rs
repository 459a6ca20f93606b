//! Test helpers for serving registry feeds from a stub transport.

use rosnumbase_data::feeds::{FeedCatalog, test_support::StubTransport};
use rosnumbase_store::RegistryStore;

pub(super) const ORIGIN: &str = "http://registry.test";
pub(super) const ABC3: &str = "http://registry.test/downloads/ABC-3xx.csv?1712000000";
pub(super) const ABC3_NEXT: &str = "http://registry.test/downloads/ABC-3xx.csv?1713000000";
pub(super) const DEF9: &str = "http://registry.test/downloads/DEF-9xx.csv?1712000001";

pub(super) const ABC3_FEED: &str = "АВС/ DEF;От;До;Емкость;Оператор;Регион\n\
    301;2110000;2119999;10000;ПАО Ростелеком;Республика Бурятия\n\
    301;2200000;2209999;10000;ПАО Ростелеком;Республика Бурятия\n";

pub(super) const ABC3_NEXT_FEED: &str = "АВС/ DEF;От;До;Емкость;Оператор;Регион\n\
    301;2120000;2120999;1000;ООО Телеком;Республика Бурятия\n\
    301;oops;2129999;1000;ООО Телеком;Республика Бурятия\n";

pub(super) const DEF9_FEED: &str = "АВС/ DEF;От;До;Емкость;Оператор;Регион\n\
    912;3000000;3999999;1000000;ПАО МТС;Пермский край\n\
    999;0;99999;100000;ООО Ростелеком;г. Москва\n";

pub(super) fn catalog() -> FeedCatalog {
    FeedCatalog::for_origin(ORIGIN).expect("test origin should parse")
}

pub(super) fn listing(uris: &[&str]) -> String {
    uris.iter()
        .map(|uri| format!("<a href=\"{uri}\">download</a>\n"))
        .collect()
}

/// Stub registry publishing `feeds` as `(uri, body)` pairs.
pub(super) fn registry(feeds: &[(&str, &str)]) -> StubTransport {
    let uris: Vec<&str> = feeds.iter().map(|(uri, _)| *uri).collect();
    feeds.iter().fold(
        StubTransport::new().with_resource(catalog().listing_url(), listing(&uris)),
        |stub, (uri, body)| stub.with_resource(*uri, *body),
    )
}

pub(super) fn memory_store() -> RegistryStore {
    let mut store = RegistryStore::open_in_memory().expect("open in-memory store");
    store.initialise_schema().expect("create schema");
    store
}
