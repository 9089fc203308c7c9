//! Types for use as [crate::Read::Cfg].

use core::ops::{Bound, RangeBounds};

/// Configuration for limiting the length of a variable-length type or collection.
///
/// # Examples
///
/// ```
/// use yoso_codec::RangeCfg;
///
/// let cfg = RangeCfg::from(0..=1024);
/// assert!(cfg.contains(500));
/// assert!(!cfg.contains(2000));
///
/// let exact = RangeCfg::exact(12);
/// assert!(exact.contains(12));
/// assert!(!exact.contains(11));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeCfg {
    start: Bound<usize>,
    end: Bound<usize>,
}

impl RangeCfg {
    /// Creates a new `RangeCfg` from any range of `usize`.
    pub fn new(range: impl RangeBounds<usize>) -> Self {
        Self {
            start: range.start_bound().cloned(),
            end: range.end_bound().cloned(),
        }
    }

    /// Only accept a length of exactly `len`.
    pub fn exact(len: usize) -> Self {
        Self::new(len..=len)
    }

    /// Returns whether `len` falls inside the configured range.
    pub fn contains(&self, len: usize) -> bool {
        (self.start, self.end).contains(&len)
    }
}

impl From<core::ops::Range<usize>> for RangeCfg {
    fn from(r: core::ops::Range<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeInclusive<usize>> for RangeCfg {
    fn from(r: core::ops::RangeInclusive<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeFrom<usize>> for RangeCfg {
    fn from(r: core::ops::RangeFrom<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeTo<usize>> for RangeCfg {
    fn from(r: core::ops::RangeTo<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeToInclusive<usize>> for RangeCfg {
    fn from(r: core::ops::RangeToInclusive<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeFull> for RangeCfg {
    fn from(_: core::ops::RangeFull) -> Self {
        Self::new(..)
    }
}
