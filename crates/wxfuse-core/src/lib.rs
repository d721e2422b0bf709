//! Core data model and parameter normalization for wxfuse
//!
//! This crate provides the shared value objects for multi-source weather
//! harmonization: the canonical parameter vocabulary, raw provider-shaped
//! series, normalized series, and the validation warnings produced while
//! mapping one onto the other.

pub mod normalize;
pub mod types;

pub use normalize::*;
pub use types::*;
