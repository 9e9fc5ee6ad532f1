//! Market-data provider configuration parsing from environment variables.

use crate::infrastructure::polygon::DEFAULT_POLYGON_BASE_URL;
use std::env;

/// Polygon REST configuration
#[derive(Debug, Clone, Default)]
pub struct PolygonConfig {
    pub api_key: String,
    pub base_url: String,
}

impl PolygonConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("POLYGON_API_KEY").unwrap_or_default(),
            base_url: env::var("POLYGON_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_POLYGON_BASE_URL.to_string()),
        }
    }
}

/// Aggregated provider configuration
#[derive(Debug, Clone, Default)]
pub struct ProviderEnvConfig {
    pub polygon: PolygonConfig,
    pub source_label: String,
}

impl ProviderEnvConfig {
    pub fn from_env() -> Self {
        Self {
            polygon: PolygonConfig::from_env(),
            source_label: env::var("SOURCE_LABEL").unwrap_or_else(|_| "polygon.io".to_string()),
        }
    }
}
