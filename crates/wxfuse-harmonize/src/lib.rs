//! Temporal harmonization
//!
//! Resamples source series onto a canonical time grid and stitches
//! historical and forecast segments into one continuous timeline.

pub mod align;
pub mod timeline;

pub use align::*;
pub use timeline::*;

use thiserror::Error;
use wxfuse_core::{SourceKind, Timestamp};

/// Bad grid parameters. Always a caller-side programming error.
#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("non-positive grid step: {0}s")]
    NonPositiveStep(i64),

    #[error("grid end {end} precedes start {start}")]
    ReversedRange { start: Timestamp, end: Timestamp },

    #[error("non-positive interpolation gap limit: {0}s")]
    NonPositiveMaxGap(i64),
}

/// Timeline assembly invariant violated. Indicates corrupt upstream data
/// and is never silently repaired.
#[derive(Debug, Error)]
pub enum MalformedSeriesError {
    #[error("{source}: expected a {expected:?} series, got {actual:?}")]
    KindMismatch {
        source: String,
        expected: SourceKind,
        actual: SourceKind,
    },

    #[error("location mismatch between {historical} and {forecast}")]
    LocationMismatch {
        historical: String,
        forecast: String,
    },

    #[error("{source}: timestamps not strictly increasing at {time}")]
    NonMonotonic { source: String, time: Timestamp },
}
