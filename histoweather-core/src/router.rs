use chrono::{Days, Local, NaiveDate};

use crate::{error::RangeError, params::Source};

/// Days the historical archive lags behind today.
pub const HISTORICAL_LAG_DAYS: u64 = 5;

/// Inclusive absolute date span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Decides which upstream source serves which part of a date span.
///
/// The cutover is fixed when the router is built and is not re-evaluated,
/// so a long-lived session keeps routing consistently across midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRouter {
    historical_end: NaiveDate,
}

impl SourceRouter {
    /// Router whose archive ends `lag_days` before `today`.
    pub fn new(today: NaiveDate, lag_days: u64) -> Self {
        let historical_end = today
            .checked_sub_days(Days::new(lag_days))
            .unwrap_or(NaiveDate::MIN);
        Self { historical_end }
    }

    /// Router anchored on the local wall-clock date.
    pub fn from_now(lag_days: u64) -> Self {
        Self::new(Local::now().date_naive(), lag_days)
    }

    /// Last date served by the historical archive.
    pub fn historical_end(&self) -> NaiveDate {
        self.historical_end
    }

    /// True iff the span reaches into the archive.
    pub fn is_historical(&self, start: NaiveDate, _end: NaiveDate) -> bool {
        start <= self.historical_end
    }

    /// True iff the span reaches past the archive.
    pub fn is_forecast(&self, _start: NaiveDate, end: NaiveDate) -> bool {
        end > self.historical_end
    }

    /// Clamp the span to its archive part.
    ///
    /// Precondition: [`is_historical`](Self::is_historical).
    pub fn split_historical(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRange, RangeError> {
        if start > end {
            return Err(RangeError::InvertedDates { start, end });
        }
        if start > self.historical_end {
            return Err(self.invalid(start, end));
        }
        Ok(DateRange::new(start, end.min(self.historical_end)))
    }

    /// Clamp the span to its forecast part.
    ///
    /// Precondition: `end >= historical_end`. A span ending exactly on the
    /// cutover is accepted and yields an inverted range that callers should
    /// only request after checking [`is_forecast`](Self::is_forecast).
    pub fn split_forecast(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRange, RangeError> {
        if start > end {
            return Err(RangeError::InvertedDates { start, end });
        }
        if end < self.historical_end {
            return Err(self.invalid(start, end));
        }
        let first_forecast = self.historical_end.succ_opt().unwrap_or(self.historical_end);
        Ok(DateRange::new(start.max(first_forecast), end))
    }

    /// Every (source, sub-span) needed to cover `start..=end`, archive first.
    ///
    /// A span straddling the cutover yields two adjacent sub-spans.
    pub fn plan(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(Source, DateRange)>, RangeError> {
        if start > end {
            return Err(RangeError::InvertedDates { start, end });
        }

        let mut parts = Vec::with_capacity(2);
        if self.is_historical(start, end) {
            parts.push((Source::Historical, self.split_historical(start, end)?));
        }
        if self.is_forecast(start, end) {
            parts.push((Source::Forecast, self.split_forecast(start, end)?));
        }

        tracing::debug!(
            %start,
            %end,
            cutover = %self.historical_end,
            parts = parts.len(),
            "planned date span"
        );
        Ok(parts)
    }

    fn invalid(&self, start: NaiveDate, end: NaiveDate) -> RangeError {
        RangeError::InvalidRange {
            start,
            end,
            cutover: self.historical_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 20).expect("valid date")
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).expect("in range")
    }

    fn router() -> SourceRouter {
        SourceRouter::new(today(), HISTORICAL_LAG_DAYS)
    }

    #[test]
    fn cutover_is_five_days_back() {
        assert_eq!(router().historical_end(), days_ago(5));
    }

    #[test]
    fn window_wholly_before_cutover_is_historical_only() {
        let r = router();
        assert!(r.is_historical(days_ago(8), days_ago(6)));
        assert!(!r.is_forecast(days_ago(8), days_ago(6)));
    }

    #[test]
    fn window_after_cutover_is_forecast_only() {
        let r = router();
        assert!(!r.is_historical(days_ago(4), days_ago(3)));
        assert!(r.is_forecast(days_ago(4), days_ago(3)));
    }

    #[test]
    fn split_historical_clamps_end_to_cutover() {
        let range = router()
            .split_historical(days_ago(8), days_ago(2))
            .expect("historical");
        assert_eq!(range, DateRange::new(days_ago(8), days_ago(5)));
    }

    #[test]
    fn straddling_split_is_adjacent() {
        let r = router();
        let start = days_ago(8);
        let end = today();

        let hist = r.split_historical(start, end).expect("historical part");
        let fore = r.split_forecast(start, end).expect("forecast part");

        assert_eq!(hist, DateRange::new(start, r.historical_end()));
        assert_eq!(fore, DateRange::new(days_ago(4), end));
        assert_eq!(hist.end.succ_opt(), Some(fore.start));
    }

    #[test]
    fn split_historical_rejects_future_span() {
        let err = router().split_historical(days_ago(4), days_ago(3)).unwrap_err();
        assert!(matches!(err, RangeError::InvalidRange { .. }));
    }

    #[test]
    fn split_forecast_rejects_past_span() {
        let err = router().split_forecast(days_ago(11), days_ago(10)).unwrap_err();
        assert!(matches!(err, RangeError::InvalidRange { .. }));
    }

    #[test]
    fn splits_reject_inverted_dates() {
        let r = router();
        assert!(matches!(
            r.split_historical(days_ago(6), days_ago(8)),
            Err(RangeError::InvertedDates { .. })
        ));
        assert!(matches!(
            r.split_forecast(days_ago(1), days_ago(2)),
            Err(RangeError::InvertedDates { .. })
        ));
    }

    #[test]
    fn plan_straddling_yields_archive_then_forecast() {
        let r = router();
        let parts = r.plan(days_ago(8), days_ago(2)).expect("valid span");

        assert_eq!(
            parts,
            vec![
                (Source::Historical, DateRange::new(days_ago(8), days_ago(5))),
                (Source::Forecast, DateRange::new(days_ago(4), days_ago(2))),
            ]
        );
    }

    #[test]
    fn plan_ending_on_cutover_is_archive_only() {
        let parts = router().plan(days_ago(7), days_ago(5)).expect("valid span");
        assert_eq!(
            parts,
            vec![(Source::Historical, DateRange::new(days_ago(7), days_ago(5)))]
        );
    }

    #[test]
    fn single_day_on_cutover_is_archive_only() {
        let r = router();
        let cutover = r.historical_end();

        assert!(r.is_historical(cutover, cutover));
        assert!(!r.is_forecast(cutover, cutover));
        assert_eq!(
            r.split_historical(cutover, cutover).expect("historical"),
            DateRange::new(cutover, cutover)
        );
        assert_eq!(
            r.plan(cutover, cutover).expect("valid span"),
            vec![(Source::Historical, DateRange::new(cutover, cutover))]
        );
    }

    #[test]
    fn split_forecast_ending_on_cutover_is_inverted() {
        let r = router();
        let range = r
            .split_forecast(days_ago(7), days_ago(5))
            .expect("accepted on the cutover");

        assert_eq!(range, DateRange::new(days_ago(4), days_ago(5)));
        assert!(range.start > range.end);
        assert!(!r.is_forecast(days_ago(7), days_ago(5)));
    }
}
