//! Core data types for multi-source weather series

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Timestamp type (Unix epoch seconds, UTC)
pub type Timestamp = i64;

/// Canonical weather parameter vocabulary.
///
/// Every series that leaves the normalizer speaks this vocabulary and these
/// units; unknown provider fields never survive normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Air temperature, degrees Celsius
    TemperatureC,
    /// Relative humidity, percent
    HumidityPct,
    /// Wind speed, meters per second
    WindSpeedMs,
    /// Wind direction, degrees from north
    WindDirDeg,
    /// Surface pressure, hectopascals
    PressureHpa,
    /// Precipitation, millimeters
    PrecipitationMm,
}

impl Parameter {
    /// All parameters, in the order algorithms walk them.
    pub const ALL: [Parameter; 6] = [
        Parameter::TemperatureC,
        Parameter::HumidityPct,
        Parameter::WindSpeedMs,
        Parameter::WindDirDeg,
        Parameter::PressureHpa,
        Parameter::PrecipitationMm,
    ];

    /// Parse a canonical name back into the vocabulary
    pub fn from_canonical(name: &str) -> Option<Parameter> {
        Parameter::ALL.iter().copied().find(|p| p.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::TemperatureC => "temperature_c",
            Parameter::HumidityPct => "humidity_pct",
            Parameter::WindSpeedMs => "wind_speed_ms",
            Parameter::WindDirDeg => "wind_dir_deg",
            Parameter::PressureHpa => "pressure_hpa",
            Parameter::PrecipitationMm => "precipitation_mm",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a series carries observed (past) or predicted (future) data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Historical,
    Forecast,
}

/// WGS84 point location, passed through unmodified
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Same point up to coordinate noise well below grid resolution
    pub fn approx_eq(&self, other: &Location) -> bool {
        (self.latitude - other.latitude).abs() < 1e-6
            && (self.longitude - other.longitude).abs() < 1e-6
    }
}

/// One sampled instant of a normalized series.
///
/// A parameter absent from `values` was not reported at this instant,
/// which is distinct from a reported zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: Timestamp,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub values: HashMap<Parameter, f64>,
}

impl Observation {
    pub fn new(time: Timestamp) -> Self {
        Self {
            time,
            values: HashMap::new(),
        }
    }

    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(&parameter).copied()
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }
}

/// One source's ordered time series for one location.
///
/// Invariant: observation timestamps are strictly increasing. A series is
/// constructed once from provider output and never mutated afterwards;
/// every pipeline stage produces a fresh instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Source identifier (e.g. "aifs", "graphcast", "eumetsat")
    pub source: String,

    pub kind: SourceKind,

    pub location: Location,

    /// Nominal sampling interval in seconds; actual spacing may be irregular
    pub interval_secs: i64,

    /// Reliability weight in [0, 1]
    pub weight: f64,

    pub observations: Vec<Observation>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_time(&self) -> Option<Timestamp> {
        self.observations.first().map(|o| o.time)
    }

    pub fn last_time(&self) -> Option<Timestamp> {
        self.observations.last().map(|o| o.time)
    }

    /// First timestamp that breaks strict ascending order, if any
    pub fn monotonic_violation(&self) -> Option<Timestamp> {
        self.observations
            .windows(2)
            .find(|w| w[1].time <= w[0].time)
            .map(|w| w[1].time)
    }

    /// New series with the same identity/metadata but different samples
    pub fn with_observations(&self, observations: Vec<Observation>, interval_secs: i64) -> Series {
        Series {
            source: self.source.clone(),
            kind: self.kind,
            location: self.location,
            interval_secs,
            weight: self.weight,
            observations,
        }
    }
}

/// A raw field value as providers report it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One sampled instant as fetched, before normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawPoint {
    pub time: Timestamp,

    /// Provider field name -> value, in the provider's own vocabulary
    #[serde(flatten)]
    pub fields: HashMap<String, FieldValue>,
}

/// A source's output exactly as the client layer resolved it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawSeries {
    pub source: String,
    pub kind: SourceKind,
    pub location: Location,
    pub interval_secs: i64,
    pub weight: f64,
    pub points: Vec<RawPoint>,
}
