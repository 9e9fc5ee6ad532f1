//! Configuration module for gridexport.
//!
//! Environment configuration is organized by concern (provider, export
//! engine); export plans are loaded from TOML or JSON files.

mod export_env_config;
pub mod export_plan;
mod provider_config;

pub use export_env_config::{DEFAULT_MAX_CANDLES_LIMIT, ExportEnvConfig};
pub use export_plan::{ExportPlan, FramePlan, IndicatorConfig, PlanRejected, RawExportPlan};
pub use provider_config::{PolygonConfig, ProviderEnvConfig};

use crate::domain::market::clock::ReferenceZone;
use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Provider (from ProviderEnvConfig)
    pub polygon_api_key: String,
    pub polygon_base_url: String,
    pub source_label: String,

    // Export (from ExportEnvConfig)
    pub zone: ReferenceZone,
    pub max_candles_limit: usize,
    pub warmup_bars: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let provider = ProviderEnvConfig::from_env();
        let export = ExportEnvConfig::from_env().context("Failed to load export config")?;

        Ok(Self {
            polygon_api_key: provider.polygon.api_key,
            polygon_base_url: provider.polygon.base_url,
            source_label: provider.source_label,

            zone: export.zone,
            max_candles_limit: export.max_candles_limit,
            warmup_bars: export.warmup_bars,
        })
    }

    /// Export defaults applied to plans that leave them out
    pub fn export_defaults(&self) -> ExportEnvConfig {
        ExportEnvConfig {
            zone: self.zone,
            max_candles_limit: self.max_candles_limit,
            warmup_bars: self.warmup_bars,
        }
    }

    /// Explicit key wins over `POLYGON_API_KEY`
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .filter(|k| !k.trim().is_empty())
            .map(str::to_string)
            .or_else(|| Some(self.polygon_api_key.clone()).filter(|k| !k.trim().is_empty()))
            .context("POLYGON_API_KEY not provided. Pass --api-key or set it in the environment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str) -> Config {
        Config {
            polygon_api_key: key.to_string(),
            polygon_base_url: "https://api.polygon.io".to_string(),
            source_label: "polygon.io".to_string(),
            zone: ReferenceZone::default(),
            max_candles_limit: DEFAULT_MAX_CANDLES_LIMIT,
            warmup_bars: 0,
        }
    }

    #[test]
    fn test_explicit_api_key_wins() {
        assert_eq!(config("ENV").resolve_api_key(Some("CLI")).unwrap(), "CLI");
        assert_eq!(config("ENV").resolve_api_key(None).unwrap(), "ENV");
        assert_eq!(config("ENV").resolve_api_key(Some("  ")).unwrap(), "ENV");
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = config("").resolve_api_key(None).unwrap_err();
        assert!(err.to_string().contains("POLYGON_API_KEY"));
    }

    #[test]
    fn test_export_defaults_mirror_config() {
        let mut cfg = config("k");
        cfg.max_candles_limit = 42;
        let defaults = cfg.export_defaults();
        assert_eq!(defaults.max_candles_limit, 42);
        assert_eq!(defaults.zone, cfg.zone);
    }
}
