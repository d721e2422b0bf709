//! Weather source adapters
//!
//! This crate defines the contract between the harmonization core and the
//! client layer that fetches raw data from each provider: a provider either
//! produces a labeled raw series or fails with a typed error. Simulated
//! providers stand in for the real network clients during development and
//! in fixtures.

pub mod provider;
pub mod simulator;

pub use provider::*;
pub use simulator::*;

use thiserror::Error;

/// Typed per-source fetch failure. The core treats a failed source exactly
/// like an absent one; these never abort a whole run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{source}: request timed out after {seconds}s")]
    Timeout { source: String, seconds: u64 },

    #[error("{source}: transport failure: {message}")]
    Transport { source: String, message: String },

    #[error("{source}: malformed provider payload: {message}")]
    Decode { source: String, message: String },

    #[error("{source}: provider unavailable: {message}")]
    Unavailable { source: String, message: String },
}

impl ProviderError {
    /// The source this failure belongs to
    pub fn source(&self) -> &str {
        match self {
            ProviderError::Timeout { source, .. }
            | ProviderError::Transport { source, .. }
            | ProviderError::Decode { source, .. }
            | ProviderError::Unavailable { source, .. } => source,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
