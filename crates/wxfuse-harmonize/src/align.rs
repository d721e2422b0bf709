//! Temporal alignment onto a canonical grid

use crate::AlignmentError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use wxfuse_core::{Observation, Parameter, Series, Timestamp};

/// The evenly spaced target timeline all sources are aligned onto.
///
/// Both ends are inclusive; `end` is the last grid point when it lands on a
/// step boundary, otherwise the grid stops at the last boundary before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalGrid {
    pub start: Timestamp,
    pub end: Timestamp,
    pub step_secs: i64,
}

impl CanonicalGrid {
    pub fn new(start: Timestamp, end: Timestamp, step_secs: i64) -> Result<Self, AlignmentError> {
        let grid = Self {
            start,
            end,
            step_secs,
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        if self.step_secs <= 0 {
            return Err(AlignmentError::NonPositiveStep(self.step_secs));
        }
        if self.end < self.start {
            return Err(AlignmentError::ReversedRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Grid timestamps in ascending order
    pub fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
        (self.start..=self.end).step_by(self.step_secs as usize)
    }

    /// Number of grid points; a validated grid always has at least one
    pub fn len(&self) -> usize {
        ((self.end - self.start) / self.step_secs + 1) as usize
    }
}

/// Interpolation policy for [`align`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignConfig {
    /// Largest bracketing gap (seconds) interpolation may span. Grid points
    /// whose neighbors are further apart come back missing.
    pub max_gap_secs: i64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        // 6 hours: one missed satellite pass, but never across a day of silence
        Self {
            max_gap_secs: 21_600,
        }
    }
}

/// Resample a series onto the canonical grid.
///
/// Grid points that coincide with a source observation are copied. Points
/// bracketed by observations no more than `max_gap_secs` apart are linearly
/// interpolated per parameter; a parameter missing on either side is missing
/// in the result. Points outside the observed span, or inside a gap wider
/// than the limit, are missing for all parameters. Nothing is extrapolated.
pub fn align(
    series: &Series,
    grid: &CanonicalGrid,
    config: &AlignConfig,
) -> Result<Series, AlignmentError> {
    grid.validate()?;
    if config.max_gap_secs <= 0 {
        return Err(AlignmentError::NonPositiveMaxGap(config.max_gap_secs));
    }

    let observations = &series.observations;
    let mut aligned = Vec::with_capacity(grid.len());

    for t in grid.timestamps() {
        let idx = observations.partition_point(|o| o.time < t);

        let point = if idx < observations.len() && observations[idx].time == t {
            observations[idx].clone()
        } else {
            let before = idx.checked_sub(1).map(|i| &observations[i]);
            let after = observations.get(idx);
            match (before, after) {
                (Some(b), Some(a)) if a.time - b.time <= config.max_gap_secs => {
                    interpolate(b, a, t)
                }
                _ => Observation::new(t),
            }
        };
        aligned.push(point);
    }

    debug!(
        source = %series.source,
        grid_points = aligned.len(),
        source_points = observations.len(),
        "aligned series onto canonical grid"
    );

    Ok(series.with_observations(aligned, grid.step_secs))
}

/// Per-parameter linear interpolation between two bracketing observations
fn interpolate(before: &Observation, after: &Observation, t: Timestamp) -> Observation {
    let span = (after.time - before.time) as f64;
    let fraction = (t - before.time) as f64 / span;

    let mut values = HashMap::new();
    for parameter in Parameter::ALL {
        if let (Some(b), Some(a)) = (before.value(parameter), after.value(parameter)) {
            values.insert(parameter, b + (a - b) * fraction);
        }
    }

    Observation { time: t, values }
}
