use thiserror::Error;

/// Errors raised by the grid/indicator engine and plan validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("Unsupported timeframe: '{code}'. Expected <int><unit> with unit one of s, m, h, d")]
    UnsupportedTimeframe { code: String },

    #[error("Unsupported indicator: '{name}'. Valid options: rsi, ema, macd")]
    UnsupportedIndicator { name: String },

    #[error("Indicator {indicator} requires a close price series but none is available")]
    MissingFallbackData { indicator: String },

    #[error("Invalid parameter for {indicator}: {reason}")]
    InvalidParameter { indicator: String, reason: String },

    #[error("Invalid datetime '{input}': {reason}")]
    InvalidInstant { input: String, reason: String },

    #[error("Unknown timezone: '{name}'")]
    InvalidTimezone { name: String },

    #[error("Timeframe '{code}' appears more than once in the plan")]
    DuplicateTimeframe { code: String },

    #[error("A {count}-point grid of {timeframe} bars falls outside the supported date range")]
    GridOutOfRange { timeframe: String, count: usize },
}
