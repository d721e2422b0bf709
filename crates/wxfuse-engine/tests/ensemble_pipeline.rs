//! End-to-end pipeline tests: simulated providers through the full
//! normalize -> align -> aggregate -> agreement flow.

use anyhow::Result;
use std::sync::Arc;
use wxfuse_config::AppConfig;
use wxfuse_engine::{
    CanonicalGrid, EnsembleEngine, EngineError, Parameter, ProviderError, SourceKind,
};
use wxfuse_sources::{fetch_all, FetchRange, SimulatedForecast, SimulatedHistory, WeatherProvider};

const HOUR: i64 = 3600;
// on an hour boundary so simulated points land on the grid
const AS_OF: i64 = 1_700_006_400;

fn tenerife() -> wxfuse_engine::Location {
    wxfuse_engine::Location::new(28.2916, -16.6291)
}

#[tokio::test]
async fn ensemble_run_with_partial_source_failure() -> Result<()> {
    let providers: Vec<Arc<dyn WeatherProvider>> = vec![
        Arc::new(SimulatedForecast::new("aifs")),
        Arc::new(SimulatedForecast::with_bias("graphcast", 0.6)),
    ];
    let range = FetchRange::new(AS_OF, AS_OF + 6 * HOUR);
    let mut outcomes = fetch_all(&providers, tenerife(), range).await;

    // the historical source timed out this run
    outcomes.push(Err(ProviderError::Timeout {
        source: "eumetsat".to_string(),
        seconds: 60,
    }));

    let engine = EnsembleEngine::from_app_config(&AppConfig::default());
    let grid = CanonicalGrid::new(AS_OF, AS_OF + 6 * HOUR, HOUR)?;
    let run = engine.run(outcomes, grid).await?;

    assert_eq!(run.failed_sources, vec!["eumetsat".to_string()]);
    assert_eq!(
        run.aggregated.sources,
        vec!["aifs".to_string(), "graphcast".to_string()]
    );
    assert!(run.warnings.is_empty());
    assert_eq!(run.aggregated.observations.len(), 7);

    // both models report everywhere; spread is bounded by the 0.6 bias
    for point in &run.aggregated.observations {
        let stats = point.stats(Parameter::TemperatureC).expect("temperature");
        assert_eq!(stats.count, 2);
        assert!(stats.variance > 0.0);
        assert!(stats.variance < 0.36, "variance {} exceeds bias^2", stats.variance);
    }

    // a 0.6 degree spread between otherwise identical models agrees well
    let overall = run.agreement.overall.expect("two contributors everywhere");
    assert!(overall > 0.9, "expected strong agreement, got {overall}");

    Ok(())
}

#[tokio::test]
async fn ensemble_run_single_surviving_source() -> Result<()> {
    let providers: Vec<Arc<dyn WeatherProvider>> =
        vec![Arc::new(SimulatedForecast::new("aifs"))];
    let range = FetchRange::new(AS_OF, AS_OF + 2 * HOUR);
    let outcomes = fetch_all(&providers, tenerife(), range).await;

    let engine = EnsembleEngine::from_app_config(&AppConfig::default());
    let grid = CanonicalGrid::new(AS_OF, AS_OF + 2 * HOUR, HOUR)?;
    let run = engine.run(outcomes, grid).await?;

    // a lone source still yields a complete result, not a failure
    for point in &run.aggregated.observations {
        let stats = point.stats(Parameter::TemperatureC).expect("temperature");
        assert_eq!(stats.count, 1);
        assert_eq!(stats.variance, 0.0);
    }

    // agreement over one source is undefined
    assert_eq!(run.agreement.overall, None);

    Ok(())
}

#[tokio::test]
async fn merged_timeline_resamples_across_the_seam() -> Result<()> {
    let history = SimulatedHistory::new("eumetsat");
    let forecast = SimulatedForecast::new("aifs");

    let historical = history
        .fetch(tenerife(), FetchRange::new(AS_OF - 24 * HOUR, AS_OF))
        .await?;
    let predicted = forecast
        .fetch(tenerife(), FetchRange::new(AS_OF, AS_OF + 12 * HOUR))
        .await?;

    let engine = EnsembleEngine::from_app_config(&AppConfig::default());

    // structural merge only
    let run = engine.merged_timeline(Ok(historical.clone()), Ok(predicted.clone()), AS_OF, None)?;
    let timeline = &run.timeline;

    assert_eq!(timeline.transition, AS_OF);
    // the simulated historical point at exactly AS_OF is forecast territory and was trimmed
    assert_eq!(timeline.historical_len(), 4);
    assert_eq!(timeline.forecast_len(), 13);
    assert_eq!(timeline.to_series().monotonic_violation(), None);
    assert_eq!(timeline.to_series().kind, SourceKind::Forecast);

    // resampled onto an hourly grid spanning the transition
    let grid = CanonicalGrid::new(AS_OF - 6 * HOUR, AS_OF + 6 * HOUR, HOUR)?;
    let resampled = engine.merged_timeline(Ok(historical), Ok(predicted), AS_OF, Some(grid))?;
    let timeline = &resampled.timeline;

    assert_eq!(timeline.interval_secs, HOUR);
    assert_eq!(timeline.observations.len(), 13);
    // 6-hourly history bridged by interpolation right up to the hourly forecast
    for observation in &timeline.observations {
        assert!(
            observation.value(Parameter::TemperatureC).is_some(),
            "missing temperature at {}",
            observation.time
        );
    }

    Ok(())
}

#[tokio::test]
async fn merged_timeline_requires_both_segments() -> Result<()> {
    let forecast = SimulatedForecast::new("aifs");
    let predicted = forecast
        .fetch(tenerife(), FetchRange::new(AS_OF, AS_OF + 2 * HOUR))
        .await;

    let engine = EnsembleEngine::from_app_config(&AppConfig::default());
    let result = engine.merged_timeline(
        Err(ProviderError::Unavailable {
            source: "eumetsat".to_string(),
            message: "maintenance window".to_string(),
        }),
        predicted,
        AS_OF,
        None,
    );

    assert!(matches!(result, Err(EngineError::SourceUnavailable(_))));
    Ok(())
}
