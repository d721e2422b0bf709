//! Pipeline orchestration over resolved sources

use crate::{EngineError, EngineResult};
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};
use wxfuse_config::AppConfig;
use wxfuse_core::{
    normalize, Parameter, PlausibilityTable, RawSeries, Series, Timestamp, ValidationWarning,
};
use wxfuse_ensemble::{aggregate, agreement, AggregatedSeries, AgreementReport, EnsembleConfig};
use wxfuse_harmonize::{align, assemble_timeline, AlignConfig, CanonicalGrid, Timeline};
use wxfuse_sources::ProviderError;

/// One complete ensemble run over a resolved source set
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleRun {
    pub aggregated: AggregatedSeries,
    pub agreement: AgreementReport,
    pub warnings: Vec<ValidationWarning>,
    /// Sources that failed to fetch and were treated as absent
    pub failed_sources: Vec<String>,
}

/// A merged historical + forecast view, optionally resampled
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRun {
    pub timeline: Timeline,
    pub warnings: Vec<ValidationWarning>,
}

/// Drives the harmonization pipeline: filter failed sources, normalize and
/// align each remaining one in parallel, then reduce the aligned set into
/// the ensemble and agreement outputs.
///
/// The engine holds only configuration; every run works on its own inputs
/// and owns its own outputs, so one engine can serve concurrent requests.
pub struct EnsembleEngine {
    plausibility: PlausibilityTable,
    align: AlignConfig,
    ensemble: EnsembleConfig,
}

impl EnsembleEngine {
    pub fn new(ensemble: EnsembleConfig) -> Self {
        Self {
            plausibility: PlausibilityTable::default(),
            align: AlignConfig::default(),
            ensemble,
        }
    }

    pub fn with_plausibility(mut self, plausibility: PlausibilityTable) -> Self {
        self.plausibility = plausibility;
        self
    }

    pub fn with_align_config(mut self, align: AlignConfig) -> Self {
        self.align = align;
        self
    }

    /// Build an engine from loaded application configuration.
    ///
    /// Plausibility overrides naming an unknown parameter are skipped with
    /// a warning; they are operator input, not data.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let mut plausibility = PlausibilityTable::default();
        for range in config.plausibility_overrides() {
            match Parameter::from_canonical(&range.parameter) {
                Some(parameter) => plausibility.set_range(parameter, range.min, range.max),
                None => {
                    warn!(parameter = %range.parameter, "unknown parameter in plausibility override, skipped");
                }
            }
        }

        Self {
            plausibility,
            align: AlignConfig {
                max_gap_secs: config.max_gap_secs(),
            },
            ensemble: EnsembleConfig::new(config.model_weights()),
        }
    }

    /// Run the full pipeline over resolved per-source outcomes.
    ///
    /// Fetch failures are logged and reported, never propagated; the run
    /// proceeds with whatever sources remain. Per-source transforms run as
    /// independent tasks over immutable inputs and are joined before the
    /// single-pass reductions.
    #[instrument(skip(self, outcomes), fields(sources = outcomes.len()))]
    pub async fn run(
        &self,
        outcomes: Vec<Result<RawSeries, ProviderError>>,
        grid: CanonicalGrid,
    ) -> EngineResult<EnsembleRun> {
        grid.validate()?;

        let mut failed_sources = Vec::new();
        let mut raws = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(raw) => raws.push(raw),
                Err(error) => {
                    warn!(source = error.source(), %error, "source unavailable, treated as absent");
                    failed_sources.push(error.source().to_string());
                }
            }
        }

        let mut tasks = JoinSet::new();
        for (index, raw) in raws.into_iter().enumerate() {
            let plausibility = self.plausibility.clone();
            let align_config = self.align;
            tasks.spawn(async move {
                let (series, warnings) = normalize(&raw, &plausibility);
                let aligned = align(&series, &grid, &align_config)?;
                Ok::<_, EngineError>((index, aligned, warnings))
            });
        }

        let mut transformed: Vec<(usize, Series, Vec<ValidationWarning>)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| EngineError::Join(e.to_string()))??;
            transformed.push(outcome);
        }
        // tasks join in completion order; restore input order for reproducible output
        transformed.sort_by_key(|(index, _, _)| *index);

        let mut warnings = Vec::new();
        let mut aligned = Vec::with_capacity(transformed.len());
        for (_, series, mut series_warnings) in transformed {
            warnings.append(&mut series_warnings);
            aligned.push(series);
        }

        let aggregated = aggregate(&aligned, &self.ensemble)?;
        let agreement_report = agreement(&aligned);

        info!(
            sources = aggregated.sources.len(),
            failed = failed_sources.len(),
            points = aggregated.observations.len(),
            warnings = warnings.len(),
            "ensemble run complete"
        );

        Ok(EnsembleRun {
            aggregated,
            agreement: agreement_report,
            warnings,
            failed_sources,
        })
    }

    /// Merge one source's historical segment with another's forecast around
    /// `as_of`, optionally resampling the merged view onto a grid.
    ///
    /// Unlike [`EnsembleEngine::run`], both segments are required: there is
    /// no meaningful timeline with either side missing.
    pub fn merged_timeline(
        &self,
        historical: Result<RawSeries, ProviderError>,
        forecast: Result<RawSeries, ProviderError>,
        as_of: Timestamp,
        grid: Option<CanonicalGrid>,
    ) -> EngineResult<TimelineRun> {
        let historical = historical.map_err(|e| EngineError::SourceUnavailable(e.to_string()))?;
        let forecast = forecast.map_err(|e| EngineError::SourceUnavailable(e.to_string()))?;

        let mut warnings = Vec::new();
        let (historical_series, mut w) = normalize(&historical, &self.plausibility);
        warnings.append(&mut w);
        let (forecast_series, mut w) = normalize(&forecast, &self.plausibility);
        warnings.append(&mut w);

        let mut timeline = assemble_timeline(&historical_series, &forecast_series, as_of)?;

        if let Some(grid) = grid {
            let resampled = align(&timeline.to_series(), &grid, &self.align)?;
            timeline.interval_secs = grid.step_secs;
            timeline.observations = resampled.observations;
        }

        Ok(TimelineRun { timeline, warnings })
    }
}
