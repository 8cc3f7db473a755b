use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::RangeError;

/// Inclusive pair of day offsets relative to a reference date.
///
/// Offset `0` is the reference date itself, so `(0, 0)` covers one full day
/// and `(-3, 10)` covers the three days before it through ten days after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: i64,
    end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The single day at `offset`.
    pub const fn day(offset: i64) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Compile-time constructor for literal windows; `start <= end` is on the caller.
    pub(crate) const fn ordered(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Convex hull of both windows.
    ///
    /// Disjoint windows are bridged: `(2, 4) ∪ (6, 8) == (2, 8)`.
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Resolve the window against `reference` into absolute dates.
    pub fn resolve(&self, reference: NaiveDate) -> Result<(NaiveDate, NaiveDate), RangeError> {
        let at = |offset| {
            offset_date(reference, offset).ok_or(RangeError::OutOfCalendar { reference, offset })
        };
        Ok((at(self.start)?, at(self.end)?))
    }
}

/// Union accumulator; starts unset so the first window wins outright.
pub(crate) fn widen(current: Option<TimeWindow>, window: TimeWindow) -> TimeWindow {
    match current {
        Some(held) => held.union(window),
        None => window,
    }
}

pub(crate) fn offset_date(reference: NaiveDate, offset: i64) -> Option<NaiveDate> {
    let days = Days::new(offset.unsigned_abs());
    if offset >= 0 {
        reference.checked_add_days(days)
    } else {
        reference.checked_sub_days(days)
    }
}
