//! Serialization of requirements into upstream request descriptors.
//!
//! Nothing here touches the network. Descriptors are deterministic: variables
//! keep their registration order and parameters are emitted in a fixed order,
//! so two builds from the same inputs render byte-identical URLs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    config::Endpoints,
    error::RangeError,
    params::{Granularity, Source},
    requirements::RequirementSet,
    router::{DateRange, SourceRouter},
};

/// Unit bundle applied to every quantity of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn temperature_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "celsius",
            UnitSystem::Imperial => "fahrenheit",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "kmh",
            UnitSystem::Imperial => "mph",
        }
    }

    pub fn precipitation_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "mm",
            UnitSystem::Imperial => "inch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Upstream API surface a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    ForecastHourly,
    ForecastDaily,
    HistoricalHourly,
    HistoricalDaily,
}

impl Endpoint {
    pub fn windowed(source: Source, granularity: Granularity) -> Self {
        match (source, granularity) {
            (_, Granularity::Current) => Endpoint::Current,
            (Source::Forecast, Granularity::Hourly) => Endpoint::ForecastHourly,
            (Source::Forecast, Granularity::Daily) => Endpoint::ForecastDaily,
            (Source::Historical, Granularity::Hourly) => Endpoint::HistoricalHourly,
            (Source::Historical, Granularity::Daily) => Endpoint::HistoricalDaily,
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Endpoint::Current => Granularity::Current,
            Endpoint::ForecastHourly | Endpoint::HistoricalHourly => Granularity::Hourly,
            Endpoint::ForecastDaily | Endpoint::HistoricalDaily => Granularity::Daily,
        }
    }

    pub fn base_url<'a>(&self, endpoints: &'a Endpoints) -> &'a str {
        match self {
            Endpoint::Current => &endpoints.current,
            Endpoint::ForecastHourly | Endpoint::ForecastDaily => &endpoints.forecast,
            Endpoint::HistoricalHourly | Endpoint::HistoricalDaily => &endpoints.historical,
        }
    }
}

/// Fully specified upstream request.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    pub endpoint: Endpoint,
    pub coordinates: Coordinates,
    /// Absent for current conditions.
    pub range: Option<DateRange>,
    pub variables: Vec<String>,
    pub units: UnitSystem,
}

impl WeatherRequest {
    /// Query parameters in their canonical order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("latitude", self.coordinates.latitude.to_string()),
            ("longitude", self.coordinates.longitude.to_string()),
        ];

        if let Some(range) = self.range {
            pairs.push(("start_date", range.start.to_string()));
            pairs.push(("end_date", range.end.to_string()));
        }

        pairs.push(("timezone", "auto".to_string()));
        pairs.push((
            self.endpoint.granularity().as_str(),
            self.variables.iter().map(|v| format!("{v},")).collect(),
        ));
        pairs.push(("temperature_unit", self.units.temperature_unit().to_string()));
        pairs.push(("wind_speed_unit", self.units.wind_speed_unit().to_string()));
        pairs.push(("precipitation_unit", self.units.precipitation_unit().to_string()));

        pairs
    }

    pub fn url(&self, endpoints: &Endpoints) -> Result<Url, url::ParseError> {
        Url::parse_with_params(self.endpoint.base_url(endpoints), self.query_pairs())
    }
}

/// Turns a [`RequirementSet`] into the requests that cover it.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder {
    router: SourceRouter,
}

impl RequestBuilder {
    pub fn new(router: SourceRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &SourceRouter {
        &self.router
    }

    /// Every request needed for one place and reference date.
    ///
    /// Order: current, hourly (archive then forecast), daily (archive then
    /// forecast). A source is skipped when it has no variables to ask for; a
    /// granularity is skipped when no window was registered for it.
    pub fn build(
        &self,
        coordinates: Coordinates,
        requirements: &RequirementSet,
        query_date: NaiveDate,
        units: UnitSystem,
    ) -> Result<Vec<WeatherRequest>, RangeError> {
        let mut requests = Vec::new();

        if !requirements.current_variables().is_empty() {
            requests.push(WeatherRequest {
                endpoint: Endpoint::Current,
                coordinates,
                range: None,
                variables: requirements.current_variables().to_vec(),
                units,
            });
        }

        for granularity in [Granularity::Hourly, Granularity::Daily] {
            let Some(window) = requirements.window(granularity) else {
                continue;
            };
            let (start, end) = window.resolve(query_date)?;

            for (source, range) in self.router.plan(start, end)? {
                let variables = requirements.variables(source, granularity);
                if variables.is_empty() {
                    continue;
                }
                requests.push(WeatherRequest {
                    endpoint: Endpoint::windowed(source, granularity),
                    coordinates,
                    range: Some(range),
                    variables: variables.to_vec(),
                    units,
                });
            }
        }

        tracing::debug!(
            count = requests.len(),
            %query_date,
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            "built weather requests"
        );
        Ok(requests)
    }
}
