use super::clock::Instant;

/// One OHLCV bar for a symbol.
///
/// Prices are optional: a provider may report a bar with no trades. Absent
/// volume counts as zero once the bar lands on a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub instant: Instant,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(instant: Instant, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            instant,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }
}
