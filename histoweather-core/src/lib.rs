//! Core library for the histoweather app.
//!
//! This crate defines:
//! - Requirement collection for widgets (variables plus relative day windows)
//! - Routing of date spans between the historical archive and the forecast
//! - Request building, HTTP transport and lenient response decoding
//! - Merging of responses into one per-place aggregate
//! - Batch orchestration with per-pair timeouts and a status state machine
//! - Geocoding, device location and the persisted user profile
//!
//! Presentation code declares its needs, hands the resulting
//! [`RequirementSet`] to an [`Orchestrator`] and reads back immutable
//! [`PlaceWeatherAggregate`]s.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod location;
pub mod orchestrator;
pub mod params;
pub mod request;
pub mod requirements;
pub mod response;
pub mod router;
pub mod store;
pub mod transport;
pub mod window;

pub use aggregate::{Current, Day, Hour, PlaceWeatherAggregate};
pub use config::{Config, Endpoints};
pub use error::{FetchError, MergeError, NoDataInRange, RangeError, TransportError};
pub use geocoding::{GeocodingClient, OpenMeteoGeocoding, Place, SearchResults};
pub use location::{LocationProvider, resolve_current_place};
pub use orchestrator::{BatchOutcome, FetchInput, FetchSession, FetchStatus, Orchestrator};
pub use params::{Granularity, Source};
pub use request::{Coordinates, Endpoint, RequestBuilder, UnitSystem, WeatherRequest};
pub use requirements::{Rejected, RequirementSet, WidgetNeeds};
pub use response::RawResponse;
pub use router::{DateRange, SourceRouter};
pub use store::{
    Favourite, ProfileStore, RecentSearch, Settings, StoreError, Theme, TomlProfileStore,
};
pub use transport::{OpenMeteoTransport, WeatherTransport};
pub use window::TimeWindow;
