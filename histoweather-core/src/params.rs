//! Static Open-Meteo parameter tables.
//!
//! A variable is only requestable if it appears in the table for its
//! granularity and source. Many hourly and daily variables are valid for both
//! the forecast and the historical archive and are then tracked for both.

use serde::{Deserialize, Serialize};

/// Time resolution of a requested variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Current,
    Hourly,
    Daily,
}

impl Granularity {
    /// Query parameter key carrying the variable list.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Current => "current",
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream capability a windowed variable is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Forecast,
    Historical,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Forecast => "forecast",
            Source::Historical => "historical",
        }
    }
}

/// Whether `name` is requestable for `granularity` from `source`.
///
/// Current conditions only come from the forecast service; asking for the
/// historical current table always yields `false`.
pub fn supports(source: Source, granularity: Granularity, name: &str) -> bool {
    table(source, granularity).contains(&name)
}

/// Whether `name` is a valid current-conditions variable.
pub fn supports_current(name: &str) -> bool {
    CURRENT.contains(&name)
}

fn table(source: Source, granularity: Granularity) -> &'static [&'static str] {
    match (source, granularity) {
        (Source::Forecast, Granularity::Hourly) => FORECAST_HOURLY,
        (Source::Forecast, Granularity::Daily) => FORECAST_DAILY,
        (Source::Historical, Granularity::Hourly) => HISTORICAL_HOURLY,
        (Source::Historical, Granularity::Daily) => HISTORICAL_DAILY,
        (Source::Forecast, Granularity::Current) => CURRENT,
        (Source::Historical, Granularity::Current) => &[],
    }
}

/// Display glyph for a WMO weather code as delivered in `weather_code`.
pub fn weather_symbol(code: &str) -> Option<&'static str> {
    let symbol = match code {
        "0" => "\u{2600}",
        "1" => "\u{1F324}",
        "2" => "\u{26C5}",
        "3" => "\u{2601}",
        "45" | "48" => "\u{1F32B}",
        "51" | "53" | "55" => "\u{1F327}",
        "56" | "57" | "66" | "67" | "77" => "\u{2744}",
        "61" | "63" | "65" | "80" | "81" | "82" => "\u{1F326}",
        "71" | "73" | "75" | "85" | "86" => "\u{1F328}",
        "95" | "96" | "99" => "\u{26A1}",
        _ => return None,
    };
    Some(symbol)
}

pub const HISTORICAL_HOURLY: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "dew_point_2m",
    "apparent_temperature",
    "precipitation",
    "rain",
    "snowfall",
    "snow_depth",
    "weather_code",
    "pressure_msl",
    "surface_pressure",
    "cloud_cover",
    "cloud_cover_low",
    "cloud_cover_mid",
    "cloud_cover_high",
    "et0_fao_evapotranspiration",
    "vapour_pressure_deficit",
    "wind_speed_10m",
    "wind_speed_100m",
    "wind_direction_10m",
    "wind_direction_100m",
    "wind_gusts_10m",
    "soil_temperature_0_to_7cm",
    "soil_temperature_7_to_28cm",
    "soil_temperature_28_to_100cm",
    "soil_temperature_100_to_255cm",
    "soil_moisture_0_to_7cm",
    "soil_moisture_7_to_28cm",
    "soil_moisture_28_to_100cm",
    "soil_moisture_100_to_255cm",
    "boundary_layer_height",
    "wet_bulb_temperature_2m",
    "total_column_integrated_water_vapour",
    "is_day",
    "sunshine_duration",
    "shortwave_radiation",
    "direct_radiation",
    "diffuse_radiation",
    "direct_normal_irradiance",
    "global_tilted_irradiance",
    "terrestrial_radiation",
    "shortwave_radiation_instant",
    "direct_radiation_instant",
    "diffuse_radiation_instant",
    "direct_normal_irradiance_instant",
    "global_tilted_irradiance_instant",
    "terrestrial_radiation_instant",
    // ERA5 ensemble spread
    "temperature_2m_spread",
    "dew_point_2m_spread",
    "precipitation_spread",
    "snowfall_spread",
    "shortwave_radiation_spread",
    "direct_radiation_spread",
    "pressure_msl_spread",
    "cloud_cover_low_spread",
    "cloud_cover_mid_spread",
    "cloud_cover_high_spread",
    "wind_speed_10m_spread",
    "wind_speed_100m_spread",
    "wind_direction_10m_spread",
    "wind_direction_100m_spread",
    "wind_gusts_10m_spread",
    "soil_temperature_0_to_7cm_spread",
    "soil_temperature_7_to_28cm_spread",
    "soil_temperature_28_to_100cm_spread",
    "soil_temperature_100_to_255cm_spread",
    "soil_moisture_0_to_7cm_spread",
    "soil_moisture_7_to_28cm_spread",
    "soil_moisture_28_to_100cm_spread",
    "soil_moisture_100_to_255cm_spread",
];

pub const HISTORICAL_DAILY: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "temperature_2m_mean",
    "apparent_temperature_max",
    "apparent_temperature_min",
    "apparent_temperature_mean",
    "sunrise",
    "sunset",
    "daylight_duration",
    "sunshine_duration",
    "precipitation_sum",
    "rain_sum",
    "snowfall_sum",
    "precipitation_hours",
    "wind_speed_10m_max",
    "wind_gusts_10m_max",
    "wind_direction_10m_dominant",
    "shortwave_radiation_sum",
    "et0_fao_evapotranspiration",
];

pub const FORECAST_HOURLY: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "dew_point_2m",
    "apparent_temperature",
    "precipitation_probability",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "snow_depth",
    "weather_code",
    "pressure_msl",
    "surface_pressure",
    "cloud_cover",
    "cloud_cover_low",
    "cloud_cover_mid",
    "cloud_cover_high",
    "visibility",
    "evapotranspiration",
    "et0_fao_evapotranspiration",
    "vapour_pressure_deficit",
    "wind_speed_10m",
    "wind_speed_80m",
    "wind_speed_120m",
    "wind_speed_180m",
    "wind_direction_10m",
    "wind_direction_80m",
    "wind_direction_120m",
    "wind_direction_180m",
    "wind_gusts_10m",
    "temperature_80m",
    "temperature_120m",
    "temperature_180m",
    "soil_temperature_0cm",
    "soil_temperature_6cm",
    "soil_temperature_18cm",
    "soil_temperature_54cm",
    "soil_moisture_0_to_1cm",
    "soil_moisture_1_to_3cm",
    "soil_moisture_3_to_9cm",
    "soil_moisture_9_to_27cm",
    "soil_moisture_27_to_81cm",
    "uv_index",
    "uv_index_clear_sky",
    "is_day",
    "sunshine_duration",
    "wet_bulb_temperature_2m",
    "total_column_integrated_water_vapour",
    "cape",
    "lifted_index",
    "convective_inhibition",
    "freezing_level_height",
    "boundary_layer_height",
    "shortwave_radiation",
    "direct_radiation",
    "diffuse_radiation",
    "direct_normal_irradiance",
    "global_tilted_irradiance",
    "terrestrial_radiation",
    "shortwave_radiation_instant",
    "direct_radiation_instant",
    "diffuse_radiation_instant",
    "direct_normal_irradiance_instant",
    "global_tilted_irradiance_instant",
    "terrestrial_radiation_instant",
];

pub const FORECAST_DAILY: &[&str] = HISTORICAL_DAILY;

pub const CURRENT: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "is_day",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "weather_code",
    "cloud_cover",
    "pressure_msl",
    "surface_pressure",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
];
