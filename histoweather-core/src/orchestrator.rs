//! Batch fetching for a page of co-displayed widgets.
//!
//! A batch is one `(locations, dates)` tuple. Pairs are fetched sequentially
//! in input order under a per-pair timeout; the first failure aborts the
//! batch and discards anything already fetched.

use chrono::NaiveDate;
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::watch;

use crate::{
    aggregate::PlaceWeatherAggregate,
    config::Config,
    error::FetchError,
    geocoding::Place,
    request::{RequestBuilder, UnitSystem},
    requirements::RequirementSet,
    router::SourceRouter,
    transport::WeatherTransport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    /// No location chosen, or the unselected placeholder is among the inputs.
    NoLocation,
    /// Waiting for the device location to resolve.
    LocationPending,
    Loading,
    Success,
    Timeout,
    Error,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::NoLocation => "no_location",
            FetchStatus::LocationPending => "location_pending",
            FetchStatus::Loading => "loading",
            FetchStatus::Success => "success",
            FetchStatus::Timeout => "timeout",
            FetchStatus::Error => "error",
        }
    }

    /// Whether an explicit retry may re-run the batch from here.
    pub fn is_retriable(&self) -> bool {
        matches!(self, FetchStatus::Timeout | FetchStatus::Error)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locations paired index-wise with reference dates.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchInput {
    pub locations: Vec<Place>,
    pub dates: Vec<NaiveDate>,
    pub units: UnitSystem,
}

impl FetchInput {
    pub fn new(locations: Vec<Place>, dates: Vec<NaiveDate>, units: UnitSystem) -> Self {
        Self {
            locations,
            dates,
            units,
        }
    }

    pub fn single(place: Place, date: NaiveDate, units: UnitSystem) -> Self {
        Self::new(vec![place], vec![date], units)
    }
}

/// Final state of one batch. `results` is empty unless `status` is
/// [`FetchStatus::Success`], in which case it follows input order.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub status: FetchStatus,
    pub results: Vec<Arc<PlaceWeatherAggregate>>,
}

impl BatchOutcome {
    fn empty(status: FetchStatus) -> Self {
        Self {
            status,
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    transport: Arc<dyn WeatherTransport>,
    builder: RequestBuilder,
    pair_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn WeatherTransport>,
        builder: RequestBuilder,
        pair_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            builder,
            pair_timeout,
        }
    }

    /// Orchestrator routing against today's local date.
    pub fn from_config(transport: Arc<dyn WeatherTransport>, config: &Config) -> Self {
        let router = SourceRouter::from_now(config.historical_lag_days);
        Self::new(transport, RequestBuilder::new(router), config.fetch_timeout())
    }

    pub fn pair_timeout(&self) -> Duration {
        self.pair_timeout
    }

    /// Terminal status for inputs that must not be fetched, if any.
    pub fn validate(input: &FetchInput) -> Option<FetchStatus> {
        if input.locations.is_empty() || input.locations.iter().any(Place::is_unselected) {
            return Some(FetchStatus::NoLocation);
        }
        if input.locations.iter().any(Place::is_pending_current) {
            return Some(FetchStatus::LocationPending);
        }
        if input.locations.len() != input.dates.len() {
            tracing::warn!(
                locations = input.locations.len(),
                dates = input.dates.len(),
                "location and date counts differ"
            );
            return Some(FetchStatus::Error);
        }
        None
    }

    /// Validate, then fetch every pair.
    pub async fn run(&self, requirements: &RequirementSet, input: &FetchInput) -> BatchOutcome {
        match Self::validate(input) {
            Some(status) => BatchOutcome::empty(status),
            None => self.fetch_all(requirements, input).await,
        }
    }

    /// Fetch every pair of an already validated input.
    pub async fn fetch_all(
        &self,
        requirements: &RequirementSet,
        input: &FetchInput,
    ) -> BatchOutcome {
        let mut results = Vec::with_capacity(input.locations.len());

        for (place, &date) in input.locations.iter().zip(&input.dates) {
            let fetched = tokio::time::timeout(
                self.pair_timeout,
                self.fetch_pair(requirements, place, date, input.units),
            )
            .await
            .unwrap_or_else(|_| Err(FetchError::Timeout(self.timeout_ms())));

            match fetched {
                Ok(aggregate) => results.push(Arc::new(aggregate)),
                Err(err) => {
                    let status = match err {
                        FetchError::Timeout(_) => FetchStatus::Timeout,
                        _ => FetchStatus::Error,
                    };
                    tracing::warn!(
                        place = %place.name,
                        %date,
                        error = %err,
                        %status,
                        "batch aborted"
                    );
                    return BatchOutcome::empty(status);
                }
            }
        }

        let complete = results.len() == input.locations.len();
        if !complete || results.iter().any(|agg| !agg.is_valid()) {
            tracing::info!("batch finished without usable data");
            return BatchOutcome::empty(FetchStatus::Error);
        }

        tracing::info!(pairs = results.len(), "batch succeeded");
        BatchOutcome {
            status: FetchStatus::Success,
            results,
        }
    }

    /// Build, send and merge every request for one location/date pair.
    pub async fn fetch_pair(
        &self,
        requirements: &RequirementSet,
        place: &Place,
        date: NaiveDate,
        units: UnitSystem,
    ) -> Result<PlaceWeatherAggregate, FetchError> {
        let requests = self
            .builder
            .build(place.coordinates(), requirements, date, units)?;

        let mut aggregate = PlaceWeatherAggregate::new(date);
        for request in &requests {
            let raw = self.transport.fetch(request).await?;
            aggregate.append_response(&raw)?;
        }

        Ok(aggregate)
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.pair_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Holds the input of one consuming page and publishes status transitions.
///
/// Status changes are observable through [`FetchSession::subscribe`]; the
/// aggregates of the last successful batch stay readable via
/// [`FetchSession::results`].
#[derive(Debug)]
pub struct FetchSession {
    orchestrator: Orchestrator,
    requirements: RequirementSet,
    input: FetchInput,
    status: watch::Sender<FetchStatus>,
    results: Vec<Arc<PlaceWeatherAggregate>>,
}

impl FetchSession {
    /// Session starting in [`FetchStatus::Loading`]; call
    /// [`refresh`](Self::refresh) to run the first batch.
    pub fn new(
        orchestrator: Orchestrator,
        requirements: RequirementSet,
        input: FetchInput,
    ) -> Self {
        let (status, _) = watch::channel(FetchStatus::Loading);
        Self {
            orchestrator,
            requirements,
            input,
            status,
            results: Vec::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> FetchStatus {
        *self.status.borrow()
    }

    pub fn input(&self) -> &FetchInput {
        &self.input
    }

    pub fn results(&self) -> &[Arc<PlaceWeatherAggregate>] {
        &self.results
    }

    /// Re-run from validation with the current input.
    pub async fn refresh(&mut self) -> FetchStatus {
        self.results.clear();

        if let Some(status) = Orchestrator::validate(&self.input) {
            self.publish(status);
            return status;
        }

        self.publish(FetchStatus::Loading);
        let outcome = self
            .orchestrator
            .fetch_all(&self.requirements, &self.input)
            .await;
        self.results = outcome.results;
        self.publish(outcome.status);
        outcome.status
    }

    /// Replace the input and re-run.
    pub async fn set_input(&mut self, input: FetchInput) -> FetchStatus {
        self.input = input;
        self.refresh().await
    }

    pub async fn set_units(&mut self, units: UnitSystem) -> FetchStatus {
        self.input.units = units;
        self.refresh().await
    }

    /// Re-run with the same input; ignored unless the last batch timed out
    /// or failed.
    pub async fn retry(&mut self) -> Option<FetchStatus> {
        let current = self.status();
        if !current.is_retriable() {
            tracing::debug!(status = %current, "retry ignored");
            return None;
        }
        Some(self.refresh().await)
    }

    fn publish(&self, status: FetchStatus) {
        tracing::debug!(%status, "fetch status");
        self.status.send_replace(status);
    }
}
