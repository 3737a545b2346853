//! `CountMetric`: a running integer total, such as the reads a gene received
//! in one sample.

use crate::Metric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An `i64` total whose merge is addition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Ord, PartialOrd)]
#[serde(transparent)]
pub struct CountMetric {
    pub(crate) count: i64,
}

/// Adding to a [`CountMetric`] would exceed `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("count overflow: {total} + {added} does not fit in a 64-bit integer")]
pub struct CountOverflow {
    /// The total before the addition.
    pub total: i64,
    /// The value that could not be added.
    pub added: i64,
}

impl Metric for CountMetric {
    /// Plain `i64` addition. Totals built from tool output go through
    /// [`CountMetric::checked_merge`] instead.
    ///
    /// ```rust
    /// use metric::{Metric, CountMetric};
    /// let mut total = CountMetric::from(5);
    /// total.merge(CountMetric::from(3));
    /// assert_eq!(total.count(), 8);
    /// ```
    fn merge(&mut self, other: Self) {
        self.count += other.count;
    }
}

impl CountMetric {
    /// Add `val` to the total, failing instead of wrapping.
    pub fn checked_increment_by(&mut self, val: i64) -> Result<(), CountOverflow> {
        self.count = self.count.checked_add(val).ok_or(CountOverflow {
            total: self.count,
            added: val,
        })?;
        Ok(())
    }

    /// [`Metric::merge`] that reports overflow.
    pub fn checked_merge(&mut self, other: Self) -> Result<(), CountOverflow> {
        self.checked_increment_by(other.count)
    }

    /// The total so far.
    pub fn count(self) -> i64 {
        self.count
    }
}

impl<T: Into<i64>> From<T> for CountMetric {
    fn from(val: T) -> Self {
        CountMetric { count: val.into() }
    }
}

impl ::std::iter::Sum for CountMetric {
    fn sum<I: Iterator<Item = CountMetric>>(iter: I) -> CountMetric {
        CountMetric::from_chunks(iter)
    }
}
