//! The fixed set of registry feeds and how to find them on the listing page.

use std::collections::BTreeMap;

use regex::Regex;
use rosnumbase_core::SourceId;
use thiserror::Error;
use url::Url;

/// Origin serving the listing page and the feed files.
pub const DEFAULT_ORIGIN: &str = "http://opendata.digital.gov.ru";
/// Path of the listing page below the origin.
pub const LISTING_PATH: &str = "/registry/numeric/downloads/";

/// Feed identifiers paired with the file each one is published as.
const STANDARD_FEEDS: [(&str, &str); 4] = [
    ("ABC3XX", "ABC-3xx.csv"),
    ("ABC4XX", "ABC-4xx.csv"),
    ("ABC8XX", "ABC-8xx.csv"),
    ("DEF9XX", "DEF-9xx.csv"),
];

/// Errors raised while building a [`FeedCatalog`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The origin is not an absolute URL.
    #[error("invalid feed origin {origin:?}: {source}")]
    Origin {
        /// Origin as supplied.
        origin: String,
        /// Parse failure.
        source: url::ParseError,
    },
    /// A feed pattern failed to compile.
    #[error("invalid pattern for feed {feed}: {source}")]
    Pattern {
        /// Feed whose pattern was rejected.
        feed: SourceId,
        /// Compilation failure.
        source: regex::Error,
    },
}

/// A feed and the pattern locating its current URL on the listing page.
#[derive(Debug, Clone)]
pub struct FeedPattern {
    source: SourceId,
    pattern: Regex,
}

impl FeedPattern {
    /// Compile `pattern` for `source`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Pattern`] when `pattern` is not a valid regular
    /// expression.
    pub fn new(source: SourceId, pattern: &str) -> Result<Self, CatalogError> {
        let compiled = Regex::new(pattern).map_err(|err| CatalogError::Pattern {
            feed: source.clone(),
            source: err,
        })?;
        Ok(Self {
            source,
            pattern: compiled,
        })
    }

    /// Feed identifier.
    #[must_use]
    pub const fn source(&self) -> &SourceId {
        &self.source
    }

    /// First URL on `page` matching the pattern.
    #[must_use]
    pub fn find<'page>(&self, page: &'page str) -> Option<&'page str> {
        self.pattern.find(page).map(|found| found.as_str())
    }
}

/// Listing page plus the statically known feeds published there.
///
/// The query component of every feed URL changes whenever the publisher
/// refreshes the file, which is what change detection compares.
///
/// # Examples
/// ```
/// use rosnumbase_data::feeds::FeedCatalog;
///
/// # fn main() -> Result<(), rosnumbase_data::feeds::CatalogError> {
/// let catalog = FeedCatalog::standard()?;
/// let page = r#"<a href="http://opendata.digital.gov.ru/downloads/DEF-9xx.csv?1700000000">"#;
/// let found = catalog.discover(page);
/// assert_eq!(found.len(), 1);
/// assert_eq!(
///     found.get("DEF9XX").map(String::as_str),
///     Some("http://opendata.digital.gov.ru/downloads/DEF-9xx.csv?1700000000"),
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FeedCatalog {
    listing_url: String,
    feeds: Vec<FeedPattern>,
}

impl FeedCatalog {
    /// Catalogue for the public registry at [`DEFAULT_ORIGIN`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] only if a built-in pattern fails to compile.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::for_origin(DEFAULT_ORIGIN)
    }

    /// Same feeds served from another origin, such as a mirror.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Origin`] when `origin` is not an absolute URL.
    pub fn for_origin(origin: &str) -> Result<Self, CatalogError> {
        let parsed = Url::parse(origin).map_err(|source| CatalogError::Origin {
            origin: origin.to_owned(),
            source,
        })?;
        let base = parsed.as_str().trim_end_matches('/');
        let feeds = STANDARD_FEEDS
            .iter()
            .map(|(source, file)| {
                let pattern = format!(
                    r"{}/downloads/{}\?\d+",
                    regex::escape(base),
                    regex::escape(file)
                );
                FeedPattern::new(SourceId::from(*source), &pattern)
            })
            .collect::<Result<_, _>>()?;
        Ok(Self::new(format!("{base}{LISTING_PATH}"), feeds))
    }

    /// Catalogue over an explicit listing page and feed set.
    #[must_use]
    pub const fn new(listing_url: String, feeds: Vec<FeedPattern>) -> Self {
        Self { listing_url, feeds }
    }

    /// URL of the listing page.
    #[must_use]
    pub const fn listing_url(&self) -> &str {
        self.listing_url.as_str()
    }

    /// Feeds in catalogue order.
    #[must_use]
    pub const fn feeds(&self) -> &[FeedPattern] {
        self.feeds.as_slice()
    }

    /// Extract the current URL of every feed mentioned on `page`.
    ///
    /// Feeds whose pattern does not match are left out of the result.
    #[must_use]
    pub fn discover(&self, page: &str) -> BTreeMap<SourceId, String> {
        self.feeds
            .iter()
            .filter_map(|feed| {
                feed.find(page)
                    .map(|uri| (feed.source().clone(), uri.to_owned()))
            })
            .collect()
    }
}
