//! Engine configuration and per-request options.
//!
//! `EngineConfig` is read once by the caller (JSON file or defaults) and owned
//! by the `ReportEngine`. `Options` travel with each request.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "PLANTATION_REPORT_CONFIG";

/// A4 width (595.28pt) minus two 2cm margins.
pub const DEFAULT_CONTENT_WIDTH: f64 = 481.89;

/// Baseline yield (t/ha) used when the analysis carries no current yield.
pub const DEFAULT_BASELINE_YIELD: f64 = 22.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Usable page width in points; table columns always sum to this.
    pub content_width: f64,

    /// Year-0 yield (t/ha) when none can be resolved from the analysis.
    pub default_baseline_yield: f64,

    /// Optional ceiling applied to displayed ROI percentages.
    pub roi_cap_pct: Option<f64>,

    /// Optional JSON standards table replacing the built-in defaults.
    pub standards_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            content_width: DEFAULT_CONTENT_WIDTH,
            default_baseline_yield: DEFAULT_BASELINE_YIELD,
            roi_cap_pct: None,
            standards_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `PLANTATION_REPORT_CONFIG` if set, defaults otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.content_width.is_finite() || self.content_width <= 0.0 {
            anyhow::bail!("content_width must be a positive number, got {}", self.content_width);
        }
        if !self.default_baseline_yield.is_finite() || self.default_baseline_yield < 0.0 {
            anyhow::bail!(
                "default_baseline_yield must be non-negative, got {}",
                self.default_baseline_yield
            );
        }
        if let Some(cap) = self.roi_cap_pct {
            if !cap.is_finite() || cap <= 0.0 {
                anyhow::bail!("roi_cap_pct must be positive when set, got {}", cap);
            }
        }
        Ok(())
    }
}

/// Flags collected by the host UI. Each gates one or more section builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub include_summary: bool,
    pub include_charts: bool,
    pub include_forecast: bool,
    pub include_references: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_charts: true,
            include_forecast: true,
            include_references: true,
        }
    }
}
