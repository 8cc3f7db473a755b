//! Error types shared across the engine.
//!
//! Component-level errors (`RangeError`, `MergeError`, `NoDataInRange`) are
//! returned synchronously to the direct caller. Batch-level failures
//! (`FetchError`) are only observed by the orchestrator, which folds them into
//! a [`FetchStatus`](crate::orchestrator::FetchStatus).

use chrono::NaiveDate;
use thiserror::Error;

/// A window or router split was asked to act outside its precondition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("window start offset {start} is after end offset {end}")]
    InvertedWindow { start: i64, end: i64 },

    #[error("start date {start} is after end date {end}")]
    InvertedDates { start: NaiveDate, end: NaiveDate },

    #[error("offset {offset} from {reference} leaves the calendar")]
    OutOfCalendar { reference: NaiveDate, offset: i64 },

    #[error("range {start}..={end} lies entirely on the wrong side of cutover {cutover}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
        cutover: NaiveDate,
    },
}

/// A windowed lookup on an aggregate matched zero rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no data between {from} and {to}")]
pub struct NoDataInRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// A response could not be folded into an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("cannot parse {section} time '{value}'")]
    BadTimestamp { section: &'static str, value: String },

    #[error("{section} column '{column}' has {actual} values, expected {expected}")]
    RaggedColumn {
        section: &'static str,
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("current snapshot has no 'time' field")]
    MissingCurrentTime,
}

/// Failure while talking to an upstream HTTP service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("cannot decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Why a single location/date fetch did not produce an aggregate.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch exceeded {0} ms")]
    Timeout(u64),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Range(#[from] RangeError),
}
