//! Identifier shared by range records and recorded feed locations.

use std::{borrow::Borrow, fmt, ops::Deref};

/// Identifier of a published feed, such as `ABC3XX` or `DEF9XX`.
///
/// The same identifier keys both the range rows and the recorded download
/// location of a feed. The two tables are linked only by convention, so the
/// newtype is the single place where that shared domain is expressed.
///
/// # Examples
/// ```
/// use rosnumbase_core::SourceId;
///
/// let source = SourceId::new("DEF9XX");
/// assert_eq!(source.as_ref(), "DEF9XX");
/// assert_eq!(source.to_string(), "DEF9XX");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SourceId(String);

impl SourceId {
    /// Construct a new [`SourceId`] from an owned or borrowed string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for SourceId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
