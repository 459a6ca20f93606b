//! Splitting a feed into ranged requests.

use std::fmt;

/// Number of ranged requests a feed is split into.
pub const RANGE_PIECES: u64 = 15;

/// Inclusive byte span requested with a `Range` header.
///
/// # Examples
/// ```
/// use rosnumbase_data::feeds::ByteRange;
///
/// let range = ByteRange { start: 140, end: 150 };
/// assert_eq!(range.to_string(), "bytes=140-150");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset, inclusive.
    pub end: u64,
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes={}-{}", self.start, self.end)
    }
}

/// Sequence of byte ranges covering a feed of known length.
///
/// The piece length is `floor(length / RANGE_PIECES)` and the piece count is
/// `ceil(length / piece_length)`. The final range always ends at `length`
/// itself rather than `length - 1`; servers clamp the overshoot to the last
/// byte, so the concatenated pieces still reproduce the resource exactly.
/// Feeds shorter than [`RANGE_PIECES`] bytes fall back to one-byte pieces.
///
/// # Examples
/// ```
/// use rosnumbase_data::feeds::{ByteRange, RangePlan};
///
/// let plan = RangePlan::new(150).expect("non-empty feed");
/// assert_eq!(plan.piece_length(), 10);
/// assert_eq!(plan.piece_count(), 15);
/// assert_eq!(plan.ranges().last(), Some(ByteRange { start: 140, end: 150 }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePlan {
    length: u64,
    piece_length: u64,
    pieces: u64,
}

impl RangePlan {
    /// Plan the ranges for a feed of `length` bytes; `None` for empty feeds.
    #[must_use]
    pub fn new(length: u64) -> Option<Self> {
        if length == 0 {
            return None;
        }
        let piece_length = length.div_euclid(RANGE_PIECES).max(1);
        Some(Self {
            length,
            piece_length,
            pieces: length.div_ceil(piece_length),
        })
    }

    /// Total length the plan covers.
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Length of every piece but the last.
    #[must_use]
    pub const fn piece_length(&self) -> u64 {
        self.piece_length
    }

    /// Number of ranged requests.
    #[must_use]
    pub const fn piece_count(&self) -> u64 {
        self.pieces
    }

    /// Ranges in request order.
    pub fn ranges(&self) -> impl Iterator<Item = ByteRange> + '_ {
        let last = self.pieces.saturating_sub(1);
        (0..self.pieces).map(move |index| {
            let start = index * self.piece_length;
            let end = if index == last {
                self.length
            } else {
                start + self.piece_length - 1
            };
            ByteRange { start, end }
        })
    }
}
