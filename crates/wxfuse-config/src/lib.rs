use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub step_secs: Option<i64>,
    pub max_gap_secs: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlausibilityRange {
    /// Canonical parameter name, e.g. "temperature_c"
    pub parameter: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Source identifier -> ensemble weight
    pub weights: Option<HashMap<String, f64>>,
    pub grid: Option<GridConfig>,
    pub plausibility: Option<Vec<PlausibilityRange>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppConfig {
    /// Load configuration from WXFUSE_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WXFUSE_CONFIG").unwrap_or_else(|_| "wxfuse.toml".to_string());
        Self::load_from(&path)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let cfg = if path.as_ref().exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Ensemble weights; defaults match the shipped model mix
    pub fn model_weights(&self) -> HashMap<String, f64> {
        self.weights.clone().unwrap_or_else(|| {
            HashMap::from([
                ("aifs".to_string(), 0.4),
                ("graphcast".to_string(), 0.35),
                ("eumetsat".to_string(), 0.25),
            ])
        })
    }

    /// Canonical grid step (default hourly)
    pub fn grid_step_secs(&self) -> i64 {
        self.grid
            .as_ref()
            .and_then(|g| g.step_secs)
            .unwrap_or(3600)
    }

    /// Widest gap interpolation may span (default 6 hours)
    pub fn max_gap_secs(&self) -> i64 {
        self.grid
            .as_ref()
            .and_then(|g| g.max_gap_secs)
            .unwrap_or(21_600)
    }

    pub fn plausibility_overrides(&self) -> &[PlausibilityRange] {
        self.plausibility.as_deref().unwrap_or(&[])
    }
}
