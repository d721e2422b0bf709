//! Weighted ensemble aggregation

use crate::EnsembleConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use wxfuse_core::{Observation, Parameter, Series, Timestamp};

/// Source identifier -> reliability weight.
///
/// Weights need not sum to one; aggregation renormalizes over the sources
/// actually contributing at each timestep.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnsembleConfig {
    pub weights: HashMap<String, f64>,
}

impl EnsembleConfig {
    pub fn new(weights: HashMap<String, f64>) -> Self {
        Self { weights }
    }

    pub fn weight(&self, source: &str) -> Option<f64> {
        self.weights.get(source).copied()
    }
}

/// Weighted statistics for one (timestamp, parameter) cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamStats {
    /// Weighted mean over contributing sources
    pub mean: f64,
    /// Population-weighted variance; 0 with a single contributor
    pub variance: f64,
    /// Number of sources that reported a value
    pub count: usize,
}

/// Like an observation, with each value replaced by its ensemble statistics.
/// A parameter absent from `values` had no contributing source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedObservation {
    pub time: Timestamp,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub values: HashMap<Parameter, ParamStats>,
}

impl AggregatedObservation {
    pub fn stats(&self, parameter: Parameter) -> Option<ParamStats> {
        self.values.get(&parameter).copied()
    }
}

/// The ensemble result on the shared canonical grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    /// Sources that participated, in input order
    pub sources: Vec<String>,
    pub interval_secs: i64,
    pub observations: Vec<AggregatedObservation>,
}

/// Combine aligned, normalized series into a weighted ensemble.
///
/// Per timestamp and parameter, the weighted mean and population-weighted
/// variance are computed over the sources reporting a value there, with
/// weights renormalized over exactly those sources. Sources absent from the
/// weight map are excluded (and logged); a source with weight zero never
/// contributes. Fails before any computation when the input set or the
/// configuration leaves nothing to aggregate.
pub fn aggregate(
    inputs: &[Series],
    config: &EnsembleConfig,
) -> Result<AggregatedSeries, EnsembleConfigError> {
    let mut seen = HashSet::new();
    for series in inputs {
        if !seen.insert(series.source.as_str()) {
            return Err(EnsembleConfigError::DuplicateSource(series.source.clone()));
        }
    }

    for (source, weight) in &config.weights {
        if *weight < 0.0 {
            return Err(EnsembleConfigError::NegativeWeight {
                source: source.clone(),
                weight: *weight,
            });
        }
    }

    let mut matched_any = false;
    let mut participants: Vec<(&Series, f64)> = Vec::new();
    for series in inputs {
        match config.weight(&series.source) {
            Some(weight) => {
                matched_any = true;
                if weight > 0.0 {
                    participants.push((series, weight));
                }
            }
            None => {
                warn!(source = %series.source, "source has no configured weight, excluded from ensemble");
            }
        }
    }

    if participants.is_empty() {
        return Err(if matched_any {
            EnsembleConfigError::AllWeightsZero
        } else {
            EnsembleConfigError::NoMatchingSource
        });
    }

    let by_time: Vec<HashMap<Timestamp, &Observation>> = participants
        .iter()
        .map(|(series, _)| {
            series
                .observations
                .iter()
                .map(|o| (o.time, o))
                .collect()
        })
        .collect();

    let mut times: Vec<Timestamp> = participants
        .iter()
        .flat_map(|(series, _)| series.observations.iter().map(|o| o.time))
        .collect();
    times.sort_unstable();
    times.dedup();

    let mut observations = Vec::with_capacity(times.len());
    for time in times {
        let mut values = HashMap::new();

        for parameter in Parameter::ALL {
            let mut contributors: Vec<(f64, f64)> = Vec::new();
            for ((_, weight), lookup) in participants.iter().zip(&by_time) {
                if let Some(value) = lookup.get(&time).and_then(|o| o.value(parameter)) {
                    contributors.push((*weight, value));
                }
            }

            let stats = match contributors.as_slice() {
                [] => continue,
                // single contributor: its own value exactly, spread undefined -> 0
                [(_, value)] => ParamStats {
                    mean: *value,
                    variance: 0.0,
                    count: 1,
                },
                _ => {
                    let weight_sum: f64 = contributors.iter().map(|(w, _)| w).sum();
                    let mean =
                        contributors.iter().map(|(w, v)| w * v).sum::<f64>() / weight_sum;
                    let variance = contributors
                        .iter()
                        .map(|(w, v)| w * (v - mean).powi(2))
                        .sum::<f64>()
                        / weight_sum;
                    ParamStats {
                        mean,
                        variance,
                        count: contributors.len(),
                    }
                }
            };
            values.insert(parameter, stats);
        }

        observations.push(AggregatedObservation { time, values });
    }

    debug!(
        sources = participants.len(),
        points = observations.len(),
        "aggregated ensemble"
    );

    Ok(AggregatedSeries {
        sources: participants
            .iter()
            .map(|(series, _)| series.source.clone())
            .collect(),
        interval_secs: participants[0].0.interval_secs,
        observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wxfuse_core::{Location, SourceKind};

    const HOUR: i64 = 3600;

    fn obs(time: Timestamp, temperature: Option<f64>) -> Observation {
        let mut o = Observation::new(time);
        if let Some(t) = temperature {
            o.values.insert(Parameter::TemperatureC, t);
        }
        o
    }

    fn series(source: &str, weight_hint: f64, observations: Vec<Observation>) -> Series {
        // weight on the series itself is informational here; aggregation
        // weights come from the EnsembleConfig
        Series {
            source: source.to_string(),
            kind: SourceKind::Forecast,
            location: Location::new(28.29, -16.63),
            interval_secs: HOUR,
            weight: weight_hint,
            observations,
        }
    }

    fn config(entries: &[(&str, f64)]) -> EnsembleConfig {
        EnsembleConfig::new(
            entries
                .iter()
                .map(|(s, w)| (s.to_string(), *w))
                .collect(),
        )
    }

    #[test]
    fn test_weighted_mean_renormalizes_over_present_sources() {
        let a = series("a", 0.6, vec![obs(0, Some(10.0)), obs(HOUR, Some(10.0))]);
        // b reports nothing at the second timestep
        let b = series("b", 0.4, vec![obs(0, Some(20.0)), obs(HOUR, None)]);

        let result = aggregate(&[a, b], &config(&[("a", 0.6), ("b", 0.4)])).unwrap();

        let both = result.observations[0].stats(Parameter::TemperatureC).unwrap();
        assert!((both.mean - 14.0).abs() < 1e-12);
        assert_eq!(both.count, 2);

        // absent b: exactly a's value, renormalized weight 1.0
        let only_a = result.observations[1].stats(Parameter::TemperatureC).unwrap();
        assert_eq!(only_a.mean, 10.0);
        assert_eq!(only_a.variance, 0.0);
        assert_eq!(only_a.count, 1);
    }

    #[test]
    fn test_variance_is_population_weighted() {
        let a = series("a", 0.6, vec![obs(0, Some(10.0))]);
        let b = series("b", 0.4, vec![obs(0, Some(20.0))]);

        let result = aggregate(&[a, b], &config(&[("a", 0.6), ("b", 0.4)])).unwrap();
        let stats = result.observations[0].stats(Parameter::TemperatureC).unwrap();

        // mean 14; 0.6*(10-14)^2 + 0.4*(20-14)^2 = 9.6 + 14.4 = 24
        assert!((stats.variance - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_contributor_variance_zero() {
        let a = series("a", 1.0, vec![obs(0, Some(-3.7))]);

        let result = aggregate(&[a], &config(&[("a", 0.25)])).unwrap();
        let stats = result.observations[0].stats(Parameter::TemperatureC).unwrap();

        assert_eq!(stats.mean, -3.7);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_no_contributors_is_missing_not_zero() {
        let a = series("a", 1.0, vec![obs(0, None)]);

        let result = aggregate(&[a], &config(&[("a", 1.0)])).unwrap();

        assert_eq!(result.observations.len(), 1);
        assert!(result.observations[0].values.is_empty());
        assert_eq!(result.observations[0].stats(Parameter::TemperatureC), None);
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let a1 = series("a", 1.0, vec![obs(0, Some(10.0))]);
        let a2 = series("a", 1.0, vec![obs(0, Some(11.0))]);

        let result = aggregate(&[a1, a2], &config(&[("a", 1.0)]));
        assert!(matches!(
            result,
            Err(EnsembleConfigError::DuplicateSource(s)) if s == "a"
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let a = series("a", 1.0, vec![obs(0, Some(10.0))]);

        let result = aggregate(&[a], &config(&[("a", -0.1)]));
        assert!(matches!(
            result,
            Err(EnsembleConfigError::NegativeWeight { .. })
        ));
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let a = series("a", 1.0, vec![obs(0, Some(10.0))]);

        let result = aggregate(&[a], &config(&[("a", 0.0)]));
        assert!(matches!(result, Err(EnsembleConfigError::AllWeightsZero)));
    }

    #[test]
    fn test_no_matching_source_rejected() {
        let a = series("a", 1.0, vec![obs(0, Some(10.0))]);

        let result = aggregate(&[a], &config(&[("somebody_else", 1.0)]));
        assert!(matches!(result, Err(EnsembleConfigError::NoMatchingSource)));

        let empty = aggregate(&[], &config(&[("a", 1.0)]));
        assert!(matches!(empty, Err(EnsembleConfigError::NoMatchingSource)));
    }

    #[test]
    fn test_unconfigured_source_excluded_from_counts() {
        let a = series("a", 1.0, vec![obs(0, Some(10.0))]);
        let stray = series("stray", 1.0, vec![obs(0, Some(99.0))]);

        let result = aggregate(&[a, stray], &config(&[("a", 1.0)])).unwrap();

        assert_eq!(result.sources, vec!["a".to_string()]);
        let stats = result.observations[0].stats(Parameter::TemperatureC).unwrap();
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_per_parameter_independence() {
        let mut left = obs(0, Some(10.0));
        left.values.insert(Parameter::HumidityPct, 60.0);
        let right = obs(0, Some(20.0)); // no humidity

        let a = series("a", 0.6, vec![left]);
        let b = series("b", 0.4, vec![right]);

        let result = aggregate(&[a, b], &config(&[("a", 0.6), ("b", 0.4)])).unwrap();
        let point = &result.observations[0];

        assert_eq!(point.stats(Parameter::TemperatureC).unwrap().count, 2);
        let humidity = point.stats(Parameter::HumidityPct).unwrap();
        assert_eq!(humidity.count, 1);
        assert_eq!(humidity.mean, 60.0);
    }
}
