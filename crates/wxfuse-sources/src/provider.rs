//! Provider trait and concurrent fan-out

use crate::{ProviderError, ProviderResult};
use std::sync::Arc;
use tracing::{info, warn};
use wxfuse_core::{Location, RawSeries, SourceKind, Timestamp};

/// Inclusive time range a fetch should cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl FetchRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }
}

/// Trait for all weather data providers
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Source identifier, stable across fetches (e.g. "aifs")
    fn id(&self) -> &str;

    /// Whether this provider serves observed or predicted data
    fn kind(&self) -> SourceKind;

    /// Fetch the raw series for a point location over a time range
    async fn fetch(&self, location: Location, range: FetchRange) -> ProviderResult<RawSeries>;
}

/// Resolve every provider concurrently.
///
/// Failures come back as values in the result set, one outcome per
/// provider in input order; nothing here panics or short-circuits on a
/// single bad source.
pub async fn fetch_all(
    providers: &[Arc<dyn WeatherProvider>],
    location: Location,
    range: FetchRange,
) -> Vec<ProviderResult<RawSeries>> {
    let mut handles = Vec::with_capacity(providers.len());
    for provider in providers {
        let provider = Arc::clone(provider);
        handles.push((
            provider.id().to_string(),
            tokio::spawn(async move { provider.fetch(location, range).await }),
        ));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        match handle.await {
            Ok(outcome) => {
                if let Err(ref e) = outcome {
                    warn!(source = %id, error = %e, "provider fetch failed");
                }
                outcomes.push(outcome);
            }
            Err(join_error) => {
                warn!(source = %id, error = %join_error, "provider fetch task aborted");
                outcomes.push(Err(ProviderError::Unavailable {
                    source: id,
                    message: join_error.to_string(),
                }));
            }
        }
    }

    info!(
        total = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.is_err()).count(),
        "resolved providers"
    );

    outcomes
}
