//! Ensemble engine facade
//!
//! The surface the RPC/transport layer calls: the five core operations
//! re-exported from their home crates, plus [`EnsembleEngine`], which runs
//! the whole harmonization pipeline over a resolved set of sources.

pub mod engine;

pub use engine::*;

pub use wxfuse_core::{
    normalize, FieldValue, Location, Observation, Parameter, PlausibilityTable, RawPoint,
    RawSeries, Series, SourceKind, Timestamp, ValidationWarning, WarningReason,
};
pub use wxfuse_ensemble::{
    aggregate, agreement, AggregatedObservation, AggregatedSeries, AgreementPoint,
    AgreementReport, EnsembleConfig, EnsembleConfigError, ParamStats, StepAgreement,
};
pub use wxfuse_harmonize::{
    align, assemble_timeline, AlignConfig, AlignmentError, CanonicalGrid, MalformedSeriesError,
    Timeline,
};
pub use wxfuse_sources::{ProviderError, ProviderResult};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error(transparent)]
    MalformedSeries(#[from] MalformedSeriesError),

    #[error(transparent)]
    EnsembleConfig(#[from] EnsembleConfigError),

    #[error("required source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("per-source transform task failed: {0}")]
    Join(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
