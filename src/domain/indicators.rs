//! Indicator definitions and their computed output shapes.

use crate::domain::errors::ExportError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RSI_WINDOW: usize = 14;
pub const DEFAULT_EMA_WINDOW: usize = 10;
pub const DEFAULT_MACD_SHORT: usize = 12;
pub const DEFAULT_MACD_LONG: usize = 26;
pub const DEFAULT_MACD_SIGNAL: usize = 9;

pub const MACD_VALUE: &str = "macd_value";
pub const MACD_SIGNAL: &str = "macd_signal";
pub const MACD_HISTOGRAM: &str = "macd_histogram";

/// Raw indicator parameters as written in an export plan.
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default, alias = "window", skip_serializing_if = "Option::is_none")]
    pub window_size: Option<usize>,
    #[serde(default, alias = "shortWindow", skip_serializing_if = "Option::is_none")]
    pub short_window_size: Option<usize>,
    #[serde(default, alias = "longWindow", skip_serializing_if = "Option::is_none")]
    pub long_window_size: Option<usize>,
    #[serde(default, alias = "signalWindow", skip_serializing_if = "Option::is_none")]
    pub signal_window_size: Option<usize>,
}

/// Supported indicator computations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    /// RSI with Wilder smoothing (`alpha = 1/window`)
    Momentum { window: usize },
    /// EMA with span smoothing (`alpha = 2/(window+1)`)
    MovingAverage { window: usize },
    /// MACD line, signal and histogram
    ConvergenceDivergence {
        short_window: usize,
        long_window: usize,
        signal_window: usize,
    },
}

impl IndicatorKind {
    /// Resolves an indicator name plus parameters, failing fast on unknown names.
    pub fn from_config(name: &str, params: &IndicatorParams) -> Result<Self, ExportError> {
        let kind = match name.trim().to_lowercase().as_str() {
            "rsi" => IndicatorKind::Momentum {
                window: params.window_size.unwrap_or(DEFAULT_RSI_WINDOW),
            },
            "ema" => IndicatorKind::MovingAverage {
                window: params.window_size.unwrap_or(DEFAULT_EMA_WINDOW),
            },
            "macd" => IndicatorKind::ConvergenceDivergence {
                short_window: params.short_window_size.unwrap_or(DEFAULT_MACD_SHORT),
                long_window: params.long_window_size.unwrap_or(DEFAULT_MACD_LONG),
                signal_window: params.signal_window_size.unwrap_or(DEFAULT_MACD_SIGNAL),
            },
            _ => {
                return Err(ExportError::UnsupportedIndicator {
                    name: name.to_string(),
                });
            }
        };
        kind.validate()?;
        Ok(kind)
    }

    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKind::Momentum { .. } => "rsi",
            IndicatorKind::MovingAverage { .. } => "ema",
            IndicatorKind::ConvergenceDivergence { .. } => "macd",
        }
    }

    /// Column name the computed series carries before the plan renames it
    pub fn default_column(&self) -> String {
        match self {
            IndicatorKind::Momentum { window } => format!("rsi{}", window),
            IndicatorKind::MovingAverage { window } => format!("ema{}", window),
            IndicatorKind::ConvergenceDivergence { .. } => "macd".to_string(),
        }
    }

    fn validate(&self) -> Result<(), ExportError> {
        let zero = |what: &str| ExportError::InvalidParameter {
            indicator: self.label().to_string(),
            reason: format!("{} must be at least 1", what),
        };
        match *self {
            IndicatorKind::Momentum { window } | IndicatorKind::MovingAverage { window } => {
                if window == 0 {
                    return Err(zero("window_size"));
                }
            }
            IndicatorKind::ConvergenceDivergence {
                short_window,
                long_window,
                signal_window,
            } => {
                if short_window == 0 {
                    return Err(zero("short_window_size"));
                }
                if long_window == 0 {
                    return Err(zero("long_window_size"));
                }
                if signal_window == 0 {
                    return Err(zero("signal_window_size"));
                }
            }
        }
        Ok(())
    }
}

/// One configured indicator column (or column bundle) of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSpec {
    pub name: String,
    pub kind: IndicatorKind,
    pub candle_limit: Option<usize>,
}

/// Computed indicator output, aligned one-to-one with frame rows
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorSeries {
    Single {
        name: String,
        values: Vec<Option<f64>>,
    },
    Bundle {
        columns: Vec<(String, Vec<Option<f64>>)>,
    },
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        match self {
            IndicatorSeries::Single { values, .. } => values.len(),
            IndicatorSeries::Bundle { columns } => {
                columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps the last `n` points of every column.
    pub fn tail(self, n: usize) -> Self {
        fn keep_last(mut values: Vec<Option<f64>>, n: usize) -> Vec<Option<f64>> {
            if values.len() > n {
                values.drain(..values.len() - n);
            }
            values
        }

        match self {
            IndicatorSeries::Single { name, values } => IndicatorSeries::Single {
                name,
                values: keep_last(values, n),
            },
            IndicatorSeries::Bundle { columns } => IndicatorSeries::Bundle {
                columns: columns
                    .into_iter()
                    .map(|(name, values)| (name, keep_last(values, n)))
                    .collect(),
            },
        }
    }

    /// Single series take the configured name, bundles keep their component names.
    pub fn renamed(self, name: &str) -> Self {
        match self {
            IndicatorSeries::Single { values, .. } => IndicatorSeries::Single {
                name: name.to_string(),
                values,
            },
            bundle => bundle,
        }
    }
}
