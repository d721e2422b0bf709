//! Inter-model agreement analysis

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use wxfuse_core::{Parameter, Series, Timestamp};

/// Agreement for one (timestamp, parameter) cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgreementPoint {
    /// Score in [0, 1]; 1 means the contributing values are identical
    pub score: f64,
    pub contributors: usize,
}

/// Per-timestep agreement scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAgreement {
    pub time: Timestamp,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub scores: HashMap<Parameter, AgreementPoint>,
}

/// Agreement summary for one run, the basis for model comparison reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementReport {
    /// Sources examined, in input order
    pub sources: Vec<String>,

    pub steps: Vec<StepAgreement>,

    /// Mean score over all cells with at least two contributors; `None`
    /// when no cell had two (agreement is undefined for a single source)
    pub overall: Option<f64>,
}

/// Score how closely the aligned sources agree.
///
/// Per timestamp and parameter the score is derived from the coefficient of
/// variation of the contributing values: `1 / (1 + stddev / mean_abs)` when
/// the mean of absolute values is non-zero, else 1 for zero spread and 0
/// otherwise. Weights play no role here; every reporting source counts the
/// same.
pub fn agreement(inputs: &[Series]) -> AgreementReport {
    let mut times: Vec<Timestamp> = inputs
        .iter()
        .flat_map(|series| series.observations.iter().map(|o| o.time))
        .collect();
    times.sort_unstable();
    times.dedup();

    let by_time: Vec<HashMap<Timestamp, &wxfuse_core::Observation>> = inputs
        .iter()
        .map(|series| series.observations.iter().map(|o| (o.time, o)).collect())
        .collect();

    let mut steps = Vec::with_capacity(times.len());
    let mut aggregate_sum = 0.0;
    let mut aggregate_cells = 0usize;

    for time in times {
        let mut scores = HashMap::new();

        for parameter in Parameter::ALL {
            let values: Vec<f64> = by_time
                .iter()
                .filter_map(|lookup| lookup.get(&time).and_then(|o| o.value(parameter)))
                .collect();
            if values.is_empty() {
                continue;
            }

            let score = agreement_score(&values);
            if values.len() >= 2 {
                aggregate_sum += score;
                aggregate_cells += 1;
            }
            scores.insert(
                parameter,
                AgreementPoint {
                    score,
                    contributors: values.len(),
                },
            );
        }

        steps.push(StepAgreement { time, scores });
    }

    let overall = (aggregate_cells > 0).then(|| aggregate_sum / aggregate_cells as f64);

    debug!(
        sources = inputs.len(),
        cells = aggregate_cells,
        overall = ?overall,
        "computed agreement report"
    );

    AgreementReport {
        sources: inputs.iter().map(|s| s.source.clone()).collect(),
        steps,
        overall,
    }
}

fn agreement_score(values: &[f64]) -> f64 {
    // identical values agree perfectly, bit-for-bit, with no rounding noise
    if values.iter().all(|v| *v == values[0]) {
        return 1.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let mean_abs = values.iter().map(|v| v.abs()).sum::<f64>() / n;

    if mean_abs > 0.0 {
        1.0 / (1.0 + stddev / mean_abs)
    } else if stddev == 0.0 {
        1.0
    } else {
        0.0
    }
}
