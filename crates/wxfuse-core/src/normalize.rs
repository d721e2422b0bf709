//! Parameter normalization
//!
//! Maps provider-specific field names and units onto the canonical
//! vocabulary, and replaces implausible values with missing.

use crate::types::{Observation, Parameter, RawSeries, Series, Timestamp};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Why a raw value was replaced with missing
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WarningReason {
    #[error("value outside plausible range [{min}, {max}]")]
    OutOfRange { min: f64, max: f64 },

    #[error("value is not a finite number")]
    NotANumber,

    #[error("timestamp not after the previous point, dropped")]
    NonMonotonic,
}

/// Non-fatal diagnostic produced while normalizing one series.
///
/// The offending value is already replaced with missing by the time the
/// warning is surfaced; the rest of the observation is unaffected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub source: String,
    pub time: Timestamp,
    pub field: String,
    pub value: Option<f64>,
    pub reason: WarningReason,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = DateTime::from_timestamp(self.time, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| self.time.to_string());
        match self.value {
            Some(v) => write!(
                f,
                "{} @ {}: {} = {}: {}",
                self.source, when, self.field, v, self.reason
            ),
            None => write!(f, "{} @ {}: {}: {}", self.source, when, self.field, self.reason),
        }
    }
}

/// Per-parameter plausible value ranges, inclusive on both ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityTable {
    ranges: HashMap<Parameter, (f64, f64)>,
}

impl Default for PlausibilityTable {
    fn default() -> Self {
        let mut ranges = HashMap::new();
        ranges.insert(Parameter::TemperatureC, (-90.0, 60.0));
        ranges.insert(Parameter::HumidityPct, (0.0, 100.0));
        ranges.insert(Parameter::WindSpeedMs, (0.0, 115.0));
        ranges.insert(Parameter::WindDirDeg, (0.0, 360.0));
        ranges.insert(Parameter::PressureHpa, (850.0, 1090.0));
        ranges.insert(Parameter::PrecipitationMm, (0.0, 400.0));
        Self { ranges }
    }
}

impl PlausibilityTable {
    pub fn range(&self, parameter: Parameter) -> Option<(f64, f64)> {
        self.ranges.get(&parameter).copied()
    }

    /// Override one parameter's plausible range
    pub fn set_range(&mut self, parameter: Parameter, min: f64, max: f64) {
        self.ranges.insert(parameter, (min, max));
    }
}

/// Unit conversion applied while mapping a field onto the vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitConversion {
    Identity,
    KelvinToCelsius,
    KmhToMs,
    PaToHpa,
}

impl UnitConversion {
    fn apply(&self, value: f64) -> f64 {
        match self {
            UnitConversion::Identity => value,
            UnitConversion::KelvinToCelsius => value - 273.15,
            UnitConversion::KmhToMs => value / 3.6,
            UnitConversion::PaToHpa => value / 100.0,
        }
    }
}

/// Map a provider field name onto the canonical vocabulary.
///
/// Covers the canonical names themselves plus the field vocabularies of the
/// known provider families (ECMWF-style `*_2m`/`*_10m` names, plain names,
/// and unit-suffixed variants). Unknown names map to `None` and are dropped.
fn canonical_field(name: &str) -> Option<(Parameter, UnitConversion)> {
    use UnitConversion::*;

    match name {
        "temperature_c" | "temperature" | "temperature_2m" | "air_temperature" | "temp" => {
            Some((Parameter::TemperatureC, Identity))
        }
        "temperature_k" | "temperature_2m_k" => Some((Parameter::TemperatureC, KelvinToCelsius)),
        "humidity_pct" | "humidity" | "relative_humidity" | "relative_humidity_2m" => {
            Some((Parameter::HumidityPct, Identity))
        }
        "wind_speed_ms" | "wind_speed" | "wind_speed_10m" => {
            Some((Parameter::WindSpeedMs, Identity))
        }
        "wind_speed_kmh" => Some((Parameter::WindSpeedMs, KmhToMs)),
        "wind_dir_deg" | "wind_dir" | "wind_direction" | "wind_direction_10m" => {
            Some((Parameter::WindDirDeg, Identity))
        }
        "pressure_hpa" | "pressure" | "surface_pressure" | "pressure_msl" | "barometer" => {
            Some((Parameter::PressureHpa, Identity))
        }
        "pressure_pa" => Some((Parameter::PressureHpa, PaToHpa)),
        "precipitation_mm" | "precipitation" | "precip" | "rain" => {
            Some((Parameter::PrecipitationMm, Identity))
        }
        _ => None,
    }
}

/// Normalize one raw series onto the canonical vocabulary and units.
///
/// Unknown fields are dropped without comment. Unparseable or implausible
/// values become missing, each surfaced as one [`ValidationWarning`]; the
/// remaining fields of the same point are preserved. Raw points that do not
/// advance the clock are dropped with a warning so the series invariant
/// holds downstream.
pub fn normalize(
    raw: &RawSeries,
    plausibility: &PlausibilityTable,
) -> (Series, Vec<ValidationWarning>) {
    let mut warnings = Vec::new();
    let mut observations: Vec<Observation> = Vec::with_capacity(raw.points.len());
    let mut last_time: Option<Timestamp> = None;

    for point in &raw.points {
        if last_time.is_some_and(|prev| point.time <= prev) {
            warnings.push(ValidationWarning {
                source: raw.source.clone(),
                time: point.time,
                field: "time".to_string(),
                value: None,
                reason: WarningReason::NonMonotonic,
            });
            continue;
        }

        // Sorted walk keeps output and warning order deterministic
        let mut names: Vec<&String> = point.fields.keys().collect();
        names.sort();

        let mut values: HashMap<Parameter, f64> = HashMap::new();
        for name in names {
            let Some((parameter, conversion)) = canonical_field(name) else {
                continue;
            };

            let field = &point.fields[name];
            if field.is_null() {
                // Null means not reported, same as an absent field
                continue;
            }

            let numeric = match field.as_f64() {
                Some(v) if v.is_finite() => v,
                other => {
                    warnings.push(ValidationWarning {
                        source: raw.source.clone(),
                        time: point.time,
                        field: name.clone(),
                        value: other.filter(|v| !v.is_nan()),
                        reason: WarningReason::NotANumber,
                    });
                    continue;
                }
            };

            let converted = conversion.apply(numeric);
            if let Some((min, max)) = plausibility.range(parameter) {
                if converted < min || converted > max {
                    warnings.push(ValidationWarning {
                        source: raw.source.clone(),
                        time: point.time,
                        field: name.clone(),
                        value: Some(converted),
                        reason: WarningReason::OutOfRange { min, max },
                    });
                    continue;
                }
            }

            values.entry(parameter).or_insert(converted);
        }

        observations.push(Observation {
            time: point.time,
            values,
        });
        last_time = Some(point.time);
    }

    let series = Series {
        source: raw.source.clone(),
        kind: raw.kind,
        location: raw.location,
        interval_secs: raw.interval_secs,
        weight: raw.weight.clamp(0.0, 1.0),
        observations,
    };

    (series, warnings)
}
