//! Export plan files: which timeframes to export and which indicators each carries.
//!
//! ```toml
//! max_candles_limit = 200
//!
//! [[config."1m"]]
//! name = "rsi14"
//! indicator = "rsi"
//! params = { window_size = 14 }
//! candle_limit = 50
//! ```
//!
//! Every timeframe code and indicator kind is validated when the plan is
//! resolved, before any data is fetched.

use super::export_env_config::ExportEnvConfig;
use crate::domain::errors::ExportError;
use crate::domain::indicators::{IndicatorKind, IndicatorParams, IndicatorSpec};
use crate::domain::market::timeframe::Timeframe;
use anyhow::{Context, Result, bail};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    pub name: String,
    pub indicator: String,
    #[serde(default)]
    pub params: IndicatorParams,
    #[serde(default)]
    pub candle_limit: Option<usize>,
}

/// Timeframe code → indicator list, in file order
#[derive(Debug, Clone, Default)]
pub struct OrderedFrames(pub Vec<(String, Vec<IndicatorConfig>)>);

impl<'de> Deserialize<'de> for OrderedFrames {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FramesVisitor;

        impl<'de> Visitor<'de> for FramesVisitor {
            type Value = OrderedFrames;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of timeframe codes to indicator lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut frames = Vec::new();
                while let Some((code, indicators)) = map.next_entry::<String, Vec<IndicatorConfig>>()? {
                    frames.push((code, indicators));
                }
                Ok(OrderedFrames(frames))
            }
        }

        deserializer.deserialize_map(FramesVisitor)
    }
}

/// Plan as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExportPlan {
    #[serde(default)]
    pub max_candles_limit: Option<usize>,
    #[serde(default)]
    pub warmup_bars: Option<usize>,
    #[serde(default)]
    pub config: Option<OrderedFrames>,
}

/// JSON plans may also be a list of documents; the first carrying `config` is used.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPlanFile {
    One(RawExportPlan),
    Many(Vec<RawExportPlan>),
}

impl RawPlanFile {
    fn into_plan(self) -> Option<RawExportPlan> {
        match self {
            RawPlanFile::One(plan) => Some(plan),
            RawPlanFile::Many(plans) => {
                let first_with_config = plans.iter().position(|p| p.config.is_some());
                plans.into_iter().nth(first_with_config.unwrap_or(0))
            }
        }
    }
}

/// Every validation failure found in a plan
#[derive(Debug, Error)]
#[error("export plan rejected: {}", .errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct PlanRejected {
    pub errors: Vec<ExportError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    pub timeframe: Timeframe,
    pub indicators: Vec<IndicatorSpec>,
}

impl FramePlan {
    /// Max over every indicator limit (defaulting to `max_candles_limit`) and `max_candles_limit`
    pub fn row_limit(&self, max_candles_limit: usize) -> usize {
        self.indicators
            .iter()
            .map(|ind| ind.candle_limit.unwrap_or(max_candles_limit))
            .fold(max_candles_limit, usize::max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    pub max_candles_limit: usize,
    pub warmup_bars: usize,
    pub frames: Vec<FramePlan>,
}

impl ExportPlan {
    /// Reads a `.toml` or `.json` plan and resolves it against `defaults`.
    pub fn load(path: impl AsRef<Path>, defaults: &ExportEnvConfig) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read export plan {}", path.display()))?;

        let raw = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str::<RawExportPlan>(&content)
                .with_context(|| format!("Failed to parse TOML plan {}", path.display()))?,
            Some("json") => serde_json::from_str::<RawPlanFile>(&content)
                .with_context(|| format!("Failed to parse JSON plan {}", path.display()))?
                .into_plan()
                .unwrap_or_default(),
            other => bail!(
                "Unsupported export plan format {:?} for {}. Use .toml or .json",
                other,
                path.display()
            ),
        };

        Ok(Self::resolve(raw, defaults)?)
    }

    /// Validates every timeframe and indicator, reporting all failures together.
    pub fn resolve(raw: RawExportPlan, defaults: &ExportEnvConfig) -> Result<Self, PlanRejected> {
        let mut errors = Vec::new();
        let mut frames = Vec::new();
        let mut seen = HashSet::new();

        for (code, indicators) in raw.config.unwrap_or_default().0 {
            let timeframe = code
                .parse::<Timeframe>()
                .map_err(|e| errors.push(e))
                .ok()
                .filter(|tf| {
                    // "5m" and "05m" name the same timeframe
                    let fresh = seen.insert(*tf);
                    if !fresh {
                        errors.push(ExportError::DuplicateTimeframe { code: code.clone() });
                    }
                    fresh
                });

            let specs: Vec<IndicatorSpec> = indicators
                .into_iter()
                .filter_map(|ind| {
                    IndicatorKind::from_config(&ind.indicator, &ind.params)
                        .map(|kind| IndicatorSpec {
                            name: ind.name,
                            kind,
                            candle_limit: ind.candle_limit,
                        })
                        .map_err(|e| errors.push(e))
                        .ok()
                })
                .collect();

            if let Some(timeframe) = timeframe {
                frames.push(FramePlan {
                    timeframe,
                    indicators: specs,
                });
            }
        }

        if !errors.is_empty() {
            return Err(PlanRejected { errors });
        }

        Ok(Self {
            max_candles_limit: raw.max_candles_limit.unwrap_or(defaults.max_candles_limit),
            warmup_bars: raw.warmup_bars.unwrap_or(defaults.warmup_bars),
            frames,
        })
    }
}
