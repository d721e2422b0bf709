//! Multi-model ensemble aggregation and agreement analysis
//!
//! Operates on normalized, grid-aligned series: combines them into weighted
//! mean/variance values per timestamp and parameter, and quantifies how
//! closely the contributing models agree.

pub mod aggregate;
pub mod agreement;

pub use aggregate::*;
pub use agreement::*;

use thiserror::Error;

/// No usable weighted source. The caller must retry with a different
/// configuration or accept the failure; nothing was computed.
#[derive(Debug, Error)]
pub enum EnsembleConfigError {
    #[error("duplicate source id in aggregation input: {0}")]
    DuplicateSource(String),

    #[error("negative weight {weight} configured for source {source}")]
    NegativeWeight { source: String, weight: f64 },

    #[error("no configured source matches any input series")]
    NoMatchingSource,

    #[error("every matching source weight is zero")]
    AllWeightsZero,
}
