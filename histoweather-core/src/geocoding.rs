use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    hash::{Hash, Hasher},
};
use url::Url;

use crate::{config::Config, error::TransportError, request::Coordinates, transport::get_json};

/// Id carried by [`Place::unselected`].
pub const UNSELECTED_ID: i64 = -1;
/// Id carried by [`Place::pending_current`].
pub const PENDING_CURRENT_ID: i64 = -2;
/// Id carried by a resolved device location.
pub const CURRENT_ID: i64 = 0;

/// A named location. Identity is the geocoding id alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: Option<f32>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub admin1: Option<String>,
}

impl Place {
    pub fn new(id: i64, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
            elevation: None,
            timezone: None,
            country_code: None,
            country: None,
            admin1: None,
        }
    }

    /// Placeholder for "no location chosen yet".
    pub fn unselected() -> Self {
        Self::new(UNSELECTED_ID, "Select", 0.0, 0.0)
    }

    /// Placeholder for a device location that is not known yet.
    pub fn pending_current() -> Self {
        Self::new(PENDING_CURRENT_ID, "Current", 0.0, 0.0)
    }

    /// Resolved device location.
    pub fn current(latitude: f64, longitude: f64) -> Self {
        Self::new(CURRENT_ID, "Current", latitude, longitude)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn is_unselected(&self) -> bool {
        self.id == UNSELECTED_ID
    }

    pub fn is_pending_current(&self) -> bool {
        self.id == PENDING_CURRENT_ID
    }

    /// Whether this place tracks the device location, resolved or not.
    pub fn follows_device(&self) -> bool {
        self.id == CURRENT_ID || self.id == PENDING_CURRENT_ID
    }
}

impl PartialEq for Place {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Place {}

impl Hash for Place {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Upstream omits the key entirely when nothing matched.
    #[serde(default)]
    pub results: Vec<Place>,
}

#[async_trait]
pub trait GeocodingClient: Send + Sync + Debug {
    async fn search_by_name(&self, name: &str) -> Result<SearchResults, TransportError>;

    async fn get_by_id(&self, id: i64) -> Result<Place, TransportError>;
}

/// Client for the Open-Meteo geocoding service.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoding {
    http: Client,
    search_url: String,
    get_url: String,
    result_count: u8,
    language: String,
}

impl OpenMeteoGeocoding {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            http: Client::new(),
            search_url: config.endpoints.geocoding_search.clone(),
            get_url: config.endpoints.geocoding_get.clone(),
            result_count: config.geocoding_result_count,
            language: config.language.clone(),
        }
    }
}

impl Default for OpenMeteoGeocoding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeocodingClient for OpenMeteoGeocoding {
    async fn search_by_name(&self, name: &str) -> Result<SearchResults, TransportError> {
        let count = self.result_count.to_string();
        let url = Url::parse_with_params(
            &self.search_url,
            [
                ("name", name),
                ("count", count.as_str()),
                ("language", self.language.as_str()),
                ("format", "json"),
            ],
        )?;

        let found: SearchResults = get_json(&self.http, url).await?;
        tracing::debug!(query = name, hits = found.results.len(), "geocoding search");
        Ok(found)
    }

    async fn get_by_id(&self, id: i64) -> Result<Place, TransportError> {
        let url = Url::parse_with_params(&self.get_url, [("id", id.to_string())])?;
        get_json(&self.http, url).await
    }
}
