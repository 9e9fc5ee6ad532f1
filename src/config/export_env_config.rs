//! Export engine configuration parsing from environment variables.

use crate::domain::market::clock::ReferenceZone;
use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_MAX_CANDLES_LIMIT: usize = 200;

/// Export environment configuration
#[derive(Debug, Clone)]
pub struct ExportEnvConfig {
    pub zone: ReferenceZone,
    pub max_candles_limit: usize,
    pub warmup_bars: usize,
}

impl Default for ExportEnvConfig {
    fn default() -> Self {
        Self {
            zone: ReferenceZone::default(),
            max_candles_limit: DEFAULT_MAX_CANDLES_LIMIT,
            warmup_bars: 0,
        }
    }
}

impl ExportEnvConfig {
    pub fn from_env() -> Result<Self> {
        let zone = match env::var("EXPORT_TIMEZONE") {
            Ok(name) => name
                .parse::<ReferenceZone>()
                .context("Failed to parse EXPORT_TIMEZONE")?,
            Err(_) => ReferenceZone::default(),
        };

        Ok(Self {
            zone,
            max_candles_limit: env::var("MAX_CANDLES_LIMIT")
                .unwrap_or_else(|_| DEFAULT_MAX_CANDLES_LIMIT.to_string())
                .parse::<usize>()
                .context("Failed to parse MAX_CANDLES_LIMIT")?,
            warmup_bars: env::var("WARMUP_BARS")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<usize>()
                .context("Failed to parse WARMUP_BARS")?,
        })
    }
}
