//! Timeline assembly
//!
//! Stitches one source's historical segment and another's forecast segment
//! into a single continuous view around a transition instant. This is a
//! pure structural merge: no resampling happens here. Callers wanting a
//! uniform grid run [`crate::align`] on the merged result afterwards.

use crate::MalformedSeriesError;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wxfuse_core::{Location, Observation, Series, SourceKind, Timestamp};

/// A merged historical + forecast view for one location.
///
/// Strictly increasing, no duplicate timestamps. Every observation at or
/// after `transition` is forecast-origin; everything before it is observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub location: Location,

    /// The caller-supplied "as of" instant separating the two segments
    pub transition: Timestamp,

    pub historical_source: String,
    pub forecast_source: String,

    /// Nominal interval of the forecast segment, inherited by merged views
    pub interval_secs: i64,

    /// Reliability weight of the forecast segment
    pub weight: f64,

    pub observations: Vec<Observation>,
}

impl Timeline {
    /// Number of observations before the transition
    pub fn historical_len(&self) -> usize {
        self.observations
            .partition_point(|o| o.time < self.transition)
    }

    /// Number of observations at or after the transition
    pub fn forecast_len(&self) -> usize {
        self.observations.len() - self.historical_len()
    }

    /// The merged view as a plain series, for feeding back into the aligner.
    ///
    /// The combined series carries the forecast segment's weight and nominal
    /// interval under a `"<historical>+<forecast>"` source id; the transition
    /// instant stays on the timeline itself.
    pub fn to_series(&self) -> Series {
        Series {
            source: format!("{}+{}", self.historical_source, self.forecast_source),
            kind: SourceKind::Forecast,
            location: self.location,
            interval_secs: self.interval_secs,
            weight: self.weight,
            observations: self.observations.clone(),
        }
    }
}

/// Merge a historical and a forecast series around `as_of`.
///
/// Historical observations at or after `as_of` and forecast observations
/// strictly before it are discarded, which guarantees timestamp uniqueness
/// for well-formed inputs. Any remaining ordering violation means the inputs
/// themselves were malformed and fails the assembly outright.
pub fn assemble_timeline(
    historical: &Series,
    forecast: &Series,
    as_of: Timestamp,
) -> Result<Timeline, MalformedSeriesError> {
    if historical.kind != SourceKind::Historical {
        return Err(MalformedSeriesError::KindMismatch {
            source: historical.source.clone(),
            expected: SourceKind::Historical,
            actual: historical.kind,
        });
    }
    if forecast.kind != SourceKind::Forecast {
        return Err(MalformedSeriesError::KindMismatch {
            source: forecast.source.clone(),
            expected: SourceKind::Forecast,
            actual: forecast.kind,
        });
    }
    if !historical.location.approx_eq(&forecast.location) {
        return Err(MalformedSeriesError::LocationMismatch {
            historical: historical.source.clone(),
            forecast: forecast.source.clone(),
        });
    }
    for segment in [historical, forecast] {
        if let Some(time) = segment.monotonic_violation() {
            return Err(MalformedSeriesError::NonMonotonic {
                source: segment.source.clone(),
                time,
            });
        }
    }

    let mut observations: Vec<Observation> = historical
        .observations
        .iter()
        .filter(|o| o.time < as_of)
        .cloned()
        .collect();
    observations.extend(
        forecast
            .observations
            .iter()
            .filter(|o| o.time >= as_of)
            .cloned(),
    );

    // Trimming two sorted segments around as_of makes this unreachable for
    // well-formed inputs; it firing means the inputs lied about themselves.
    if let Some(window) = observations.windows(2).find(|w| w[1].time <= w[0].time) {
        return Err(MalformedSeriesError::NonMonotonic {
            source: format!("{}+{}", historical.source, forecast.source),
            time: window[1].time,
        });
    }

    debug!(
        historical = %historical.source,
        forecast = %forecast.source,
        transition = %DateTime::from_timestamp(as_of, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| as_of.to_string()),
        points = observations.len(),
        "assembled timeline"
    );

    Ok(Timeline {
        location: historical.location,
        transition: as_of,
        historical_source: historical.source.clone(),
        forecast_source: forecast.source.clone(),
        interval_secs: forecast.interval_secs,
        weight: forecast.weight,
        observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wxfuse_core::Parameter;

    const HOUR: i64 = 3600;
    const AS_OF: Timestamp = 1_700_000_000;

    fn obs(time: Timestamp, temperature: f64) -> Observation {
        let mut values = HashMap::new();
        values.insert(Parameter::TemperatureC, temperature);
        Observation { time, values }
    }

    fn historical(observations: Vec<Observation>) -> Series {
        Series {
            source: "eumetsat".to_string(),
            kind: SourceKind::Historical,
            location: Location::new(28.29, -16.63),
            interval_secs: 6 * HOUR,
            weight: 1.0,
            observations,
        }
    }

    fn forecast(observations: Vec<Observation>) -> Series {
        Series {
            source: "aifs".to_string(),
            kind: SourceKind::Forecast,
            location: Location::new(28.29, -16.63),
            interval_secs: HOUR,
            weight: 0.9,
            observations,
        }
    }

    #[test]
    fn test_abutting_segments_merge_cleanly() {
        let hist = historical(vec![obs(AS_OF - 2 * HOUR, 14.0), obs(AS_OF - HOUR, 15.0)]);
        let fc = forecast(vec![obs(AS_OF, 16.0), obs(AS_OF + HOUR, 17.0)]);

        let timeline = assemble_timeline(&hist, &fc, AS_OF).unwrap();

        assert_eq!(timeline.observations.len(), 4);
        assert_eq!(timeline.transition, AS_OF);
        assert_eq!(timeline.historical_len(), 2);
        assert_eq!(timeline.forecast_len(), 2);

        let times: Vec<_> = timeline.observations.iter().map(|o| o.time).collect();
        let mut sorted = times.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(times, sorted);
    }

    #[test]
    fn test_overlap_is_trimmed_not_an_error() {
        // historical extends two hours past the transition
        let hist = historical(vec![
            obs(AS_OF - HOUR, 14.0),
            obs(AS_OF, 15.0),
            obs(AS_OF + HOUR, 15.5),
            obs(AS_OF + 2 * HOUR, 16.0),
        ]);
        let fc = forecast(vec![
            obs(AS_OF - HOUR, 15.8),
            obs(AS_OF, 16.0),
            obs(AS_OF + HOUR, 17.0),
        ]);

        let timeline = assemble_timeline(&hist, &fc, AS_OF).unwrap();

        // historical keeps t < as_of only, forecast keeps t >= as_of only
        assert_eq!(timeline.observations.len(), 3);
        assert_eq!(timeline.observations[0].time, AS_OF - HOUR);
        assert_eq!(timeline.observations[0].value(Parameter::TemperatureC), Some(14.0));
        assert_eq!(timeline.observations[1].time, AS_OF);
        assert_eq!(timeline.observations[1].value(Parameter::TemperatureC), Some(16.0));
    }

    #[test]
    fn test_kind_mismatch_is_fatal() {
        let hist = historical(vec![obs(AS_OF - HOUR, 14.0)]);
        let fc = forecast(vec![obs(AS_OF, 16.0)]);

        let swapped = assemble_timeline(&fc, &hist, AS_OF);
        assert!(matches!(
            swapped,
            Err(MalformedSeriesError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_location_mismatch_is_fatal() {
        let hist = historical(vec![obs(AS_OF - HOUR, 14.0)]);
        let mut fc = forecast(vec![obs(AS_OF, 16.0)]);
        fc.location = Location::new(52.52, 13.4);

        assert!(matches!(
            assemble_timeline(&hist, &fc, AS_OF),
            Err(MalformedSeriesError::LocationMismatch { .. })
        ));
    }

    #[test]
    fn test_unsorted_input_is_fatal() {
        let hist = historical(vec![obs(AS_OF - HOUR, 14.0), obs(AS_OF - 2 * HOUR, 13.0)]);
        let fc = forecast(vec![obs(AS_OF, 16.0)]);

        let result = assemble_timeline(&hist, &fc, AS_OF);
        match result {
            Err(MalformedSeriesError::NonMonotonic { source, time }) => {
                assert_eq!(source, "eumetsat");
                assert_eq!(time, AS_OF - 2 * HOUR);
            }
            other => panic!("expected NonMonotonic, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_segments_are_fine() {
        let hist = historical(vec![]);
        let fc = forecast(vec![obs(AS_OF, 16.0)]);

        let timeline = assemble_timeline(&hist, &fc, AS_OF).unwrap();
        assert_eq!(timeline.historical_len(), 0);
        assert_eq!(timeline.forecast_len(), 1);
    }

    #[test]
    fn test_to_series_metadata() {
        let hist = historical(vec![obs(AS_OF - HOUR, 14.0)]);
        let fc = forecast(vec![obs(AS_OF, 16.0)]);

        let timeline = assemble_timeline(&hist, &fc, AS_OF).unwrap();
        let merged = timeline.to_series();

        assert_eq!(merged.source, "eumetsat+aifs");
        assert_eq!(merged.kind, SourceKind::Forecast);
        assert_eq!(merged.interval_secs, HOUR);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.monotonic_violation(), None);
    }
}
