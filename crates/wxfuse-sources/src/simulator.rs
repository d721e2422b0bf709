//! Simulated providers for development and fixtures
//!
//! Values are derived from the timestamp alone, so a given range always
//! produces the same series and tests stay reproducible.

use crate::{FetchRange, ProviderResult, WeatherProvider};
use std::collections::HashMap;
use tracing::debug;
use wxfuse_core::{FieldValue, Location, RawPoint, RawSeries, SourceKind, Timestamp};

const HOUR: i64 = 3600;

/// Pseudo-variation in [-5, 5), a deterministic stand-in for weather noise
fn variation(time: Timestamp) -> f64 {
    ((time / HOUR % 100) as f64 / 10.0) - 5.0
}

/// Simulated satellite-derived historical observations, 6-hourly
pub struct SimulatedHistory {
    id: String,
    base_temp: f64,
}

impl SimulatedHistory {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            base_temp: 15.0,
        }
    }

    fn generate_point(&self, time: Timestamp) -> RawPoint {
        let v = variation(time);

        let mut fields = HashMap::new();
        fields.insert(
            "temperature".to_string(),
            FieldValue::Float(self.base_temp + v),
        );
        fields.insert("humidity".to_string(), FieldValue::Float(60.0 + 2.0 * v));
        fields.insert(
            "pressure".to_string(),
            FieldValue::Float(1013.25 + 3.0 * v),
        );
        fields.insert(
            "wind_speed".to_string(),
            FieldValue::Float(8.0 + v.abs()),
        );
        fields.insert(
            "precipitation".to_string(),
            FieldValue::Float(if v > 4.0 { v - 4.0 } else { 0.0 }),
        );

        RawPoint { time, fields }
    }
}

#[async_trait::async_trait]
impl WeatherProvider for SimulatedHistory {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Historical
    }

    async fn fetch(&self, location: Location, range: FetchRange) -> ProviderResult<RawSeries> {
        let interval = 6 * HOUR;
        let points: Vec<RawPoint> = (range.start..=range.end)
            .step_by(interval as usize)
            .map(|t| self.generate_point(t))
            .collect();

        debug!(source = %self.id, points = points.len(), "simulated historical fetch");

        Ok(RawSeries {
            source: self.id.clone(),
            kind: SourceKind::Historical,
            location,
            interval_secs: interval,
            weight: 1.0,
            points,
        })
    }
}

/// Simulated AI forecast model output, hourly, ECMWF-style field names
pub struct SimulatedForecast {
    id: String,
    base_temp: f64,
    /// Constant offset distinguishing one simulated model from another
    bias: f64,
}

impl SimulatedForecast {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            base_temp: 15.0,
            bias: 0.0,
        }
    }

    /// Same simulated weather shifted by a constant, to make ensemble
    /// spread visible between two simulated models
    pub fn with_bias(id: &str, bias: f64) -> Self {
        Self {
            id: id.to_string(),
            base_temp: 15.0,
            bias,
        }
    }

    fn generate_point(&self, time: Timestamp) -> RawPoint {
        let v = variation(time);

        let mut fields = HashMap::new();
        fields.insert(
            "temperature_2m".to_string(),
            FieldValue::Float(self.base_temp + v + self.bias),
        );
        fields.insert(
            "relative_humidity_2m".to_string(),
            FieldValue::Float(60.0 + 2.0 * v),
        );
        fields.insert(
            "surface_pressure".to_string(),
            FieldValue::Float(1013.25 + 3.0 * v),
        );
        fields.insert(
            "wind_speed_10m".to_string(),
            FieldValue::Float(8.0 + v.abs() + self.bias.abs() / 2.0),
        );
        fields.insert(
            "wind_direction_10m".to_string(),
            FieldValue::Float(((time / HOUR) % 360) as f64),
        );
        fields.insert(
            "precipitation".to_string(),
            FieldValue::Float(if v > 4.0 { v - 4.0 } else { 0.0 }),
        );

        RawPoint { time, fields }
    }
}

#[async_trait::async_trait]
impl WeatherProvider for SimulatedForecast {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Forecast
    }

    async fn fetch(&self, location: Location, range: FetchRange) -> ProviderResult<RawSeries> {
        let points: Vec<RawPoint> = (range.start..=range.end)
            .step_by(HOUR as usize)
            .map(|t| self.generate_point(t))
            .collect();

        debug!(source = %self.id, points = points.len(), "simulated forecast fetch");

        Ok(RawSeries {
            source: self.id.clone(),
            kind: SourceKind::Forecast,
            location,
            interval_secs: HOUR,
            weight: 0.9,
            points,
        })
    }
}
