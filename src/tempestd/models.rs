use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Unit system requested from the backend; tempestd performs the conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    #[must_use]
    pub const fn is_metric(self) -> bool {
        matches!(self, Self::Metric)
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(ValidationError::UnknownUnits(other.to_string())),
        }
    }
}

/// Response from `/api/v1/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub stations: Vec<StationHealth>,
    #[serde(default)]
    pub database: Option<DatabaseHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationHealth {
    pub station_id: u32,
    #[serde(default)]
    pub name: String,
    /// Backend's websocket link to the station ("connected", ...)
    #[serde(default)]
    pub websocket: Option<String>,
    #[serde(default)]
    pub last_observation: Option<DateTime<Utc>>,
    #[serde(default)]
    pub observation_age_seconds: Option<f64>,
    #[serde(default)]
    pub data_range_oldest: Option<String>,
    #[serde(default)]
    pub data_range_newest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealth {
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_observations: u64,
}

/// A weather station as listed by `/api/v1/stations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: u32,
    #[serde(default)]
    pub device_id: Option<u32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
    /// "online" / "offline"; absent on the single-station endpoint
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_observation: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Station {
    /// Name shown in the station selector.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Station {}", self.station_id)
        } else {
            self.name.clone()
        }
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status.as_deref() == Some("online")
    }
}

/// One timestamped reading. Values are already in the requested unit system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub station_id: Option<u32>,
    #[serde(default)]
    pub wind_lull: Option<f64>,
    #[serde(default)]
    pub wind_avg: Option<f64>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub station_pressure: Option<f64>,
    #[serde(default)]
    pub air_temperature: Option<f64>,
    #[serde(default)]
    pub relative_humidity: Option<f64>,
    #[serde(default)]
    pub uv_index: Option<f64>,
    #[serde(default)]
    pub solar_radiation: Option<f64>,
    #[serde(default)]
    pub rain_accumulation: Option<f64>,
    /// 0 = none, 1 = rain, 2 = hail
    #[serde(default)]
    pub precipitation_type: Option<i32>,
    #[serde(default)]
    pub lightning_avg_distance: Option<f64>,
    #[serde(default)]
    pub lightning_strike_count: Option<u32>,
    #[serde(default)]
    pub battery: Option<f64>,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub dew_point: Option<f64>,
}

/// Response from `/api/v1/stations/{id}/current`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentObservation {
    #[serde(flatten)]
    pub observation: Observation,
    #[serde(default)]
    pub wind_direction_cardinal: Option<String>,
    #[serde(default)]
    pub units: UnitSystem,
}

/// Response from `/api/v1/stations/{id}/observations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationPage {
    #[serde(default)]
    pub station_id: Option<u32>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub units: UnitSystem,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
    /// Ascending time order
    #[serde(default)]
    pub observations: Vec<Observation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighLowAvg {
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub avg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindStats {
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub avg: Option<f64>,
}

/// Response from `/api/v1/stations/{id}/summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    #[serde(default)]
    pub station_id: Option<u32>,
    pub date: NaiveDate,
    #[serde(default)]
    pub units: UnitSystem,
    pub temperature: HighLowAvg,
    pub humidity: HighLowAvg,
    pub wind: WindStats,
    pub pressure: HighLowAvg,
    #[serde(default)]
    pub rain_total: Option<f64>,
    #[serde(default)]
    pub uv_max: Option<f64>,
    #[serde(default)]
    pub solar_radiation_max: Option<f64>,
    #[serde(default)]
    pub lightning_total: Option<u32>,
    #[serde(default)]
    pub observation_count: u64,
}

/// Response from `/api/v1/stations/{id}/range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRange {
    #[serde(default)]
    pub station_id: Option<u32>,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_observations: u64,
}

/// Error body returned by tempestd: `{"error": message, "code": status}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub code: Option<u16>,
}
