//! Per-place weather record built by folding upstream responses together.
//!
//! Responses are appended in caller order and transposed from columns into
//! rows. The merge never sorts or de-duplicates: callers must append
//! non-overlapping responses in chronological order (archive before
//! forecast) if they want ordered, unique rows.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    error::{MergeError, NoDataInRange},
    response::{Columns, RawResponse},
    window::{TimeWindow, offset_date},
};

/// Freshest current-conditions snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Current {
    pub time: NaiveDateTime,
    pub properties: HashMap<String, String>,
}

/// One hourly row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hour {
    pub time: NaiveDateTime,
    pub properties: HashMap<String, String>,
}

/// One daily row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Day {
    pub date: NaiveDate,
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceWeatherAggregate {
    query_date: NaiveDate,
    latitude: Option<String>,
    longitude: Option<String>,
    current: Option<Current>,
    hours: Vec<Hour>,
    days: Vec<Day>,
    valid: bool,
}

impl PlaceWeatherAggregate {
    pub fn new(query_date: NaiveDate) -> Self {
        Self {
            query_date,
            latitude: None,
            longitude: None,
            current: None,
            hours: Vec::new(),
            days: Vec::new(),
            valid: false,
        }
    }

    /// Aggregate of `responses`, appended in iteration order.
    pub fn from_responses<'a, I>(query_date: NaiveDate, responses: I) -> Result<Self, MergeError>
    where
        I: IntoIterator<Item = &'a RawResponse>,
    {
        let mut aggregate = Self::new(query_date);
        for raw in responses {
            aggregate.append_response(raw)?;
        }
        Ok(aggregate)
    }

    /// Fold one response into the aggregate.
    ///
    /// Coordinates are adopted from the first response only; later responses
    /// are assumed to describe the same place. The current snapshot is
    /// replaced only by a strictly newer one. Hourly and daily rows are
    /// appended as-is. On error nothing is modified.
    pub fn append_response(&mut self, raw: &RawResponse) -> Result<(), MergeError> {
        let current = raw.current.as_ref().map(parse_current).transpose()?;
        let hours = match &raw.hourly {
            Some(columns) => transpose(columns, "hourly", parse_timestamp, |time, properties| Hour {
                time,
                properties,
            })?,
            None => Vec::new(),
        };
        let days = match &raw.daily {
            Some(columns) => transpose(columns, "daily", parse_date, |date, properties| Day {
                date,
                properties,
            })?,
            None => Vec::new(),
        };

        if self.latitude.is_none() || self.longitude.is_none() {
            self.latitude = Some(raw.latitude.clone());
            self.longitude = Some(raw.longitude.clone());
        }

        if let Some(candidate) = current {
            let newer = self
                .current
                .as_ref()
                .is_none_or(|held| held.time < candidate.time);
            if newer {
                self.current = Some(candidate);
            }
        }

        tracing::debug!(
            hours = hours.len(),
            days = days.len(),
            query_date = %self.query_date,
            "appended weather response"
        );
        self.hours.extend(hours);
        self.days.extend(days);
        self.refresh_validity();

        Ok(())
    }

    fn refresh_validity(&mut self) -> bool {
        self.valid = self.current.is_some() || !self.hours.is_empty() || !self.days.is_empty();
        self.valid
    }

    pub fn query_date(&self) -> NaiveDate {
        self.query_date
    }

    pub fn latitude(&self) -> Option<&str> {
        self.latitude.as_deref()
    }

    pub fn longitude(&self) -> Option<&str> {
        self.longitude.as_deref()
    }

    pub fn current(&self) -> Option<&Current> {
        self.current.as_ref()
    }

    /// Hourly rows in ingestion order.
    pub fn hours(&self) -> &[Hour] {
        &self.hours
    }

    /// Daily rows in ingestion order.
    pub fn days(&self) -> &[Day] {
        &self.days
    }

    /// Whether any data at all was merged.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Hours whose calendar date falls in `window`, in ingestion order.
    pub fn relative_hourly(&self, window: TimeWindow) -> Result<Vec<&Hour>, NoDataInRange> {
        let (from, to) = self.absolute(window);
        let rows: Vec<&Hour> = self
            .hours
            .iter()
            .filter(|hour| (from..=to).contains(&hour.time.date()))
            .collect();

        if rows.is_empty() {
            return Err(NoDataInRange { from, to });
        }
        Ok(rows)
    }

    /// Days falling in `window`, in ingestion order.
    pub fn relative_daily(&self, window: TimeWindow) -> Result<Vec<&Day>, NoDataInRange> {
        let (from, to) = self.absolute(window);
        let rows: Vec<&Day> = self
            .days
            .iter()
            .filter(|day| (from..=to).contains(&day.date))
            .collect();

        if rows.is_empty() {
            return Err(NoDataInRange { from, to });
        }
        Ok(rows)
    }

    /// First day row for `date`.
    pub fn day(&self, date: NaiveDate) -> Option<&Day> {
        self.days.iter().find(|day| day.date == date)
    }

    /// First hour row for `time`.
    pub fn hour(&self, time: NaiveDateTime) -> Option<&Hour> {
        self.hours.iter().find(|hour| hour.time == time)
    }

    fn absolute(&self, window: TimeWindow) -> (NaiveDate, NaiveDate) {
        (
            clamped_offset(self.query_date, window.start()),
            clamped_offset(self.query_date, window.end()),
        )
    }
}

/// Offsets past the calendar clamp to the end they overflow towards.
fn clamped_offset(reference: NaiveDate, offset: i64) -> NaiveDate {
    offset_date(reference, offset).unwrap_or(if offset < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

fn parse_current(snapshot: &HashMap<String, String>) -> Result<Current, MergeError> {
    let raw_time = snapshot.get("time").ok_or(MergeError::MissingCurrentTime)?;
    let time = parse_timestamp(raw_time).ok_or_else(|| MergeError::BadTimestamp {
        section: "current",
        value: raw_time.clone(),
    })?;

    let properties = snapshot
        .iter()
        .filter(|(key, _)| key.as_str() != "time")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(Current { time, properties })
}

/// Zip every non-`time` column into one row per `time` entry.
fn transpose<K, R>(
    columns: &Columns,
    section: &'static str,
    parse_key: impl Fn(&str) -> Option<K>,
    make_row: impl Fn(K, HashMap<String, String>) -> R,
) -> Result<Vec<R>, MergeError> {
    let Some(times) = columns.get("time") else {
        return Ok(Vec::new());
    };

    for (column, values) in columns {
        if values.len() != times.len() {
            return Err(MergeError::RaggedColumn {
                section,
                column: column.clone(),
                expected: times.len(),
                actual: values.len(),
            });
        }
    }

    times
        .iter()
        .enumerate()
        .map(|(index, raw_key)| {
            let key = parse_key(raw_key).ok_or_else(|| MergeError::BadTimestamp {
                section,
                value: raw_key.clone(),
            })?;
            let properties = columns
                .iter()
                .filter(|(name, _)| name.as_str() != "time")
                .map(|(name, values)| (name.clone(), values[index].clone()))
                .collect();
            Ok(make_row(key, properties))
        })
        .collect()
}

/// Upstream uses minute precision (`2024-01-01T13:00`); seconds are tolerated.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).expect("valid time")
    }

    fn window(start: i64, end: i64) -> TimeWindow {
        TimeWindow::new(start, end).expect("ordered window")
    }

    fn response(value: serde_json::Value) -> RawResponse {
        serde_json::from_value(value).expect("valid response fixture")
    }

    fn full_response() -> RawResponse {
        response(json!({
            "latitude": "52.52",
            "longitude": "13.41",
            "current": {"time": "2024-01-01T13:15", "temperature": "20.5"},
            "hourly": {
                "time": ["2024-01-01T13:00", "2024-01-01T14:00"],
                "temperature": ["21", "22"]
            },
            "daily": {
                "time": ["2024-01-01", "2024-01-02"],
                "temperature_2m_max": ["23", "24"]
            }
        }))
    }

    #[test]
    fn empty_aggregate_is_invalid() {
        let agg = PlaceWeatherAggregate::new(date(2024, 1, 1));

        assert_eq!(agg.latitude(), None);
        assert_eq!(agg.longitude(), None);
        assert!(agg.current().is_none());
        assert!(agg.hours().is_empty());
        assert!(agg.days().is_empty());
        assert!(!agg.is_valid());
    }

    #[test]
    fn hourly_columns_become_rows_in_order() {
        let raw = response(json!({
            "latitude": "52.52",
            "longitude": "13.41",
            "hourly": {
                "time": ["2024-01-01T13:00", "2024-01-01T14:00"],
                "temperature": ["21", "22"]
            }
        }));

        let agg = PlaceWeatherAggregate::from_responses(date(2024, 1, 1), [&raw]).expect("merge");

        assert_eq!(agg.hours().len(), 2);
        assert_eq!(agg.hours()[0].time, at(2024, 1, 1, 13));
        assert_eq!(agg.hours()[0].properties["temperature"], "21");
        assert_eq!(agg.hours()[1].properties["temperature"], "22");
        assert!(!agg.hours()[0].properties.contains_key("time"));
        assert!(agg.is_valid());
    }

    #[test]
    fn current_drops_time_key() {
        let agg = PlaceWeatherAggregate::from_responses(date(2024, 1, 1), [&full_response()])
            .expect("merge");
        let current = agg.current().expect("current present");

        assert_eq!(current.time, date(2024, 1, 1).and_hms_opt(13, 15, 0).expect("valid"));
        assert_eq!(current.properties.len(), 1);
        assert_eq!(current.properties["temperature"], "20.5");
    }

    #[test]
    fn appending_twice_duplicates_rows_only() {
        let raw = full_response();
        let mut agg = PlaceWeatherAggregate::new(date(2024, 1, 1));

        agg.append_response(&raw).expect("first append");
        let current = agg.current().cloned();
        agg.append_response(&raw).expect("second append");

        assert_eq!(agg.hours().len(), 4);
        assert_eq!(agg.days().len(), 4);
        assert_eq!(agg.current().cloned(), current);
        assert_eq!(agg.latitude(), Some("52.52"));
    }

    #[test]
    fn coordinates_come_from_first_response() {
        let mut agg = PlaceWeatherAggregate::new(date(2024, 1, 1));
        agg.append_response(&response(json!({"latitude": "1", "longitude": "2"})))
            .expect("append");
        agg.append_response(&response(json!({"latitude": "3", "longitude": "4"})))
            .expect("append");

        assert_eq!(agg.latitude(), Some("1"));
        assert_eq!(agg.longitude(), Some("2"));
        // coordinates alone carry no weather
        assert!(!agg.is_valid());
    }

    #[test]
    fn newer_current_replaces_and_tie_keeps_first() {
        let snapshot = |time: &str, temp: &str| {
            response(json!({
                "latitude": "0",
                "longitude": "0",
                "current": {"time": time, "temperature_2m": temp}
            }))
        };
        let mut agg = PlaceWeatherAggregate::new(date(2024, 1, 1));

        agg.append_response(&snapshot("2024-01-01T10:00", "1")).expect("append");
        agg.append_response(&snapshot("2024-01-01T10:00", "2")).expect("append");
        assert_eq!(agg.current().expect("current").properties["temperature_2m"], "1");

        agg.append_response(&snapshot("2024-01-01T09:45", "3")).expect("append");
        assert_eq!(agg.current().expect("current").properties["temperature_2m"], "1");

        agg.append_response(&snapshot("2024-01-01T10:15", "4")).expect("append");
        assert_eq!(agg.current().expect("current").properties["temperature_2m"], "4");
    }

    #[test]
    fn malformed_response_leaves_aggregate_untouched() {
        let mut agg = PlaceWeatherAggregate::new(date(2024, 1, 1));
        agg.append_response(&full_response()).expect("append");
        let before = agg.clone();

        let ragged = response(json!({
            "latitude": "9",
            "longitude": "9",
            "hourly": {"time": ["2024-01-03T00:00", "2024-01-03T01:00"], "temperature": ["1"]}
        }));
        let err = agg.append_response(&ragged).unwrap_err();
        assert!(matches!(err, MergeError::RaggedColumn { actual: 1, expected: 2, .. }));

        let bad_time = response(json!({
            "latitude": "9",
            "longitude": "9",
            "daily": {"time": ["January 3rd"], "sunrise": ["x"]}
        }));
        let err = agg.append_response(&bad_time).unwrap_err();
        assert!(matches!(err, MergeError::BadTimestamp { section: "daily", .. }));

        assert_eq!(agg, before);
    }

    #[test]
    fn current_without_time_is_rejected() {
        let mut agg = PlaceWeatherAggregate::new(date(2024, 1, 1));
        let raw = response(json!({"latitude": "0", "longitude": "0", "current": {"rain": "0"}}));

        assert_eq!(agg.append_response(&raw), Err(MergeError::MissingCurrentTime));
        assert!(!agg.is_valid());
    }

    #[test]
    fn relative_hourly_filters_by_calendar_date() {
        let raw = response(json!({
            "latitude": "0",
            "longitude": "0",
            "hourly": {
                "time": ["2024-01-01T23:00", "2024-01-02T00:00", "2024-01-03T00:00"],
                "rain": ["0", "1", "2"]
            }
        }));
        let agg = PlaceWeatherAggregate::from_responses(date(2024, 1, 1), [&raw]).expect("merge");

        let rows = agg.relative_hourly(window(1, 1)).expect("rows on day 1");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].properties["rain"], "1");

        let rows = agg.relative_hourly(window(0, 2)).expect("all rows");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn relative_lookup_reports_empty_span() {
        let agg = PlaceWeatherAggregate::from_responses(date(2024, 1, 1), [&full_response()])
            .expect("merge");

        let err = agg.relative_daily(window(5, 6)).unwrap_err();
        assert_eq!(
            err,
            NoDataInRange {
                from: date(2024, 1, 6),
                to: date(2024, 1, 7)
            }
        );
        assert!(agg.relative_hourly(window(-2, -1)).is_err());
    }

    #[test]
    fn windows_beyond_the_calendar_find_nothing() {
        let agg = PlaceWeatherAggregate::from_responses(date(2024, 1, 1), [&full_response()])
            .expect("merge");
        let far = 1_000_000_000;

        let err = agg.relative_daily(window(far, far)).unwrap_err();
        assert_eq!(err.from, NaiveDate::MAX);
        assert_eq!(err.to, NaiveDate::MAX);

        let err = agg.relative_hourly(window(-far, -far)).unwrap_err();
        assert_eq!(err.from, NaiveDate::MIN);
        assert_eq!(err.to, NaiveDate::MIN);

        // a window spanning the whole calendar still sees every row
        let rows = agg.relative_daily(window(-far, far)).expect("rows");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn relative_daily_keeps_ingestion_order() {
        let later = response(json!({
            "latitude": "0",
            "longitude": "0",
            "daily": {"time": ["2024-01-03"], "rain_sum": ["3"]}
        }));
        let earlier = response(json!({
            "latitude": "0",
            "longitude": "0",
            "daily": {"time": ["2024-01-02"], "rain_sum": ["2"]}
        }));
        let agg = PlaceWeatherAggregate::from_responses(date(2024, 1, 1), [&later, &earlier])
            .expect("merge");

        let dates: Vec<NaiveDate> = agg
            .relative_daily(window(0, 5))
            .expect("rows")
            .iter()
            .map(|day| day.date)
            .collect();
        assert_eq!(dates, vec![date(2024, 1, 3), date(2024, 1, 2)]);
    }

    #[test]
    fn point_lookups_return_first_match() {
        let mut agg = PlaceWeatherAggregate::new(date(2024, 1, 1));
        agg.append_response(&full_response()).expect("append");
        agg.append_response(&full_response()).expect("append");

        let day = agg.day(date(2024, 1, 2)).expect("day present");
        assert_eq!(day.properties["temperature_2m_max"], "24");
        assert!(std::ptr::eq(day, &agg.days()[1]));

        let hour = agg.hour(at(2024, 1, 1, 14)).expect("hour present");
        assert!(std::ptr::eq(hour, &agg.hours()[1]));

        assert!(agg.day(date(2024, 2, 1)).is_none());
        assert!(agg.hour(at(2024, 1, 1, 15)).is_none());
    }
}
