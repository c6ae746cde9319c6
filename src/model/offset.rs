//! Global offset addressing.
//!
//! Every node in a [`Document`](super::Document) is addressed in one shared,
//! monotonically increasing offset space measured in UTF-16 code units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the document's global offset space (UTF-16 code units).
pub type DocumentOffset = usize;

/// A half-open `[start, end)` range in the document's offset space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OffsetRange {
    /// First unit covered by the range
    pub start: DocumentOffset,

    /// One past the last unit covered by the range
    pub end: DocumentOffset,
}

impl OffsetRange {
    /// Create a new range. `end` is clamped so the range is never inverted.
    pub fn new(start: DocumentOffset, end: DocumentOffset) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Create a range of `len` units starting at `start`.
    pub fn with_len(start: DocumentOffset, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// Number of units covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the range covers no units.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if an offset falls inside the range.
    pub fn contains(&self, offset: DocumentOffset) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Check if `other` lies entirely inside this range.
    pub fn encloses(&self, other: &OffsetRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Check if two ranges share at least one unit.
    pub fn overlaps(&self, other: &OffsetRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The shared part of two ranges, if any.
    pub fn intersection(&self, other: &OffsetRange) -> Option<OffsetRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(OffsetRange { start, end })
    }
}

impl fmt::Display for OffsetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Length of a string in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Convert a UTF-16 unit position inside `s` to a byte index.
///
/// Returns `None` when `units` is past the end of the string or falls in the
/// middle of a surrogate pair.
pub fn utf16_to_byte(s: &str, units: usize) -> Option<usize> {
    let mut seen = 0;
    for (byte, ch) in s.char_indices() {
        if seen == units {
            return Some(byte);
        }
        seen += ch.len_utf16();
        if seen > units {
            return None;
        }
    }
    (seen == units).then_some(s.len())
}
