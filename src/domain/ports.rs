use crate::domain::indicators::{IndicatorSeries, IndicatorSpec};
use crate::domain::market::candle::Candle;
use crate::domain::market::clock::Instant;
use crate::domain::market::timeframe::Timeframe;
use anyhow::Result;
use async_trait::async_trait;

// Need async_trait for async functions in traits
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Bars ending at or before `end`, at most `limit` of them.
    ///
    /// The result may be sparser than `limit` and in any order.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        end: &Instant,
        limit: usize,
    ) -> Result<Vec<Candle>>;

    /// Provider-computed indicator series, used as-is when present.
    ///
    /// `None` means the series is computed locally from the aligned closes.
    async fn fetch_indicator(
        &self,
        _symbol: &str,
        _timeframe: &Timeframe,
        _spec: &IndicatorSpec,
        _limit: usize,
    ) -> Result<Option<IndicatorSeries>> {
        Ok(None)
    }

    /// Label written into the export document's `source` field
    fn source_name(&self) -> &str;
}
