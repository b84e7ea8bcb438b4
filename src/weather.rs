//! Weather lookup for log entries
//!
//! One GET against Open-Meteo's current-conditions endpoint. The lookup is
//! decoration: when it fails for any reason the service hands back a fixed
//! fallback reading and notes that it did so.

use crate::config::WeatherConfig;
use crate::model::WeatherOrigin;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("kilnlog/", env!("CARGO_PKG_VERSION"));
const HPA_TO_INHG: f64 = 0.029_529_983;

/// Reading substituted when the lookup fails
pub const FALLBACK_TEMPERATURE_F: f64 = 65.0;
pub const FALLBACK_HUMIDITY_PCT: f64 = 50.0;
pub const FALLBACK_PRESSURE_INHG: f64 = 30.0;
pub const FALLBACK_WIND_SPEED_MPH: f64 = 5.0;
pub const FALLBACK_WIND_DIRECTION: &str = "N";
pub const FALLBACK_CONDITIONS: &str = "Unknown";

/// Weather lookup errors
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather lookup disabled")]
    Disabled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Weather API error {0}")]
    Api(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Conditions at the kiln site, attached to log entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_f: f64,
    pub humidity_pct: f64,
    pub pressure_inhg: f64,
    pub wind_speed_mph: f64,
    pub wind_direction: String,
    pub conditions: String,
    pub source: WeatherOrigin,
    /// Which source was used and why
    pub note: String,
}

impl WeatherSnapshot {
    pub fn fallback(reason: &str) -> Self {
        Self {
            temperature_f: FALLBACK_TEMPERATURE_F,
            humidity_pct: FALLBACK_HUMIDITY_PCT,
            pressure_inhg: FALLBACK_PRESSURE_INHG,
            wind_speed_mph: FALLBACK_WIND_SPEED_MPH,
            wind_direction: FALLBACK_WIND_DIRECTION.to_string(),
            conditions: FALLBACK_CONDITIONS.to_string(),
            source: WeatherOrigin::Fallback,
            note: format!("fallback values ({})", reason),
        }
    }
}

/// Anything that can produce a live weather reading
pub trait WeatherProvider {
    fn fetch(&self) -> Result<WeatherSnapshot, WeatherError>;

    /// Short name recorded in the snapshot note
    fn name(&self) -> &str;
}

/// Wraps a provider and never fails
pub struct WeatherService<P: WeatherProvider> {
    provider: P,
}

impl<P: WeatherProvider> WeatherService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Live reading if the provider answers, fallback values otherwise
    pub fn current(&self) -> WeatherSnapshot {
        match self.provider.fetch() {
            Ok(mut snapshot) => {
                snapshot.source = WeatherOrigin::Live;
                snapshot.note = format!("live from {}", self.provider.name());
                debug!(provider = self.provider.name(), "fetched live weather");
                snapshot
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "weather lookup failed, using fallback");
                WeatherSnapshot::fallback(&e.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    surface_pressure: f64,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
    weather_code: u16,
}

/// Open-Meteo current conditions client
pub struct OpenMeteoClient {
    http: reqwest::blocking::Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
    enabled: bool,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            latitude: config.latitude,
            longitude: config.longitude,
            enabled: config.enabled,
        })
    }
}

impl WeatherProvider for OpenMeteoClient {
    fn fetch(&self) -> Result<WeatherSnapshot, WeatherError> {
        if !self.enabled {
            return Err(WeatherError::Disabled);
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", self.latitude.to_string()),
                ("longitude", self.longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,surface_pressure,wind_speed_10m,wind_direction_10m,weather_code"
                        .to_string(),
                ),
                ("temperature_unit", "fahrenheit".to_string()),
                ("wind_speed_unit", "mph".to_string()),
            ])
            .send()
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Api(status.as_u16()));
        }

        let body: ForecastResponse = response
            .json()
            .map_err(|e| WeatherError::Parse(e.to_string()))?;
        let c = body.current;

        Ok(WeatherSnapshot {
            temperature_f: c.temperature_2m,
            humidity_pct: c.relative_humidity_2m,
            pressure_inhg: (c.surface_pressure * HPA_TO_INHG * 100.0).round() / 100.0,
            wind_speed_mph: c.wind_speed_10m,
            wind_direction: compass_point(c.wind_direction_10m).to_string(),
            conditions: describe_weather_code(c.weather_code).to_string(),
            source: WeatherOrigin::Live,
            note: String::new(),
        })
    }

    fn name(&self) -> &str {
        "open-meteo"
    }
}

/// Nearest of the eight compass points for a bearing in degrees
pub fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let normalized = degrees.rem_euclid(360.0);
    let idx = ((normalized + 22.5) / 45.0) as usize % 8;
    POINTS[idx]
}

/// WMO weather interpretation code to a short description
pub fn describe_weather_code(code: u16) -> &'static str {
    match code {
        0 => "Clear",
        1..=3 => "Partly cloudy",
        45 | 48 => "Fog",
        51..=57 => "Drizzle",
        61..=67 => "Rain",
        71..=77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95..=99 => "Thunderstorm",
        _ => FALLBACK_CONDITIONS,
    }
}
