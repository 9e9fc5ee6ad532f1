use crate::domain::indicators::{IndicatorSeries, IndicatorSpec};
use crate::domain::market::candle::Candle;
use crate::domain::market::clock::{Instant, ReferenceZone};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::CandleSource;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// In-memory candle source for offline runs and tests.
///
/// Fixtures are keyed by timeframe code; provider indicator series by
/// timeframe code and configured indicator name.
#[derive(Debug, Clone)]
pub struct MockCandleSource {
    name: String,
    candles: HashMap<String, Vec<Candle>>,
    indicators: HashMap<(String, String), IndicatorSeries>,
    failing: HashSet<String>,
}

impl MockCandleSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candles: HashMap::new(),
            indicators: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    pub fn with_candles(mut self, timeframe: &str, candles: Vec<Candle>) -> Self {
        self.candles.insert(timeframe.to_string(), candles);
        self
    }

    pub fn with_indicator(mut self, timeframe: &str, name: &str, series: IndicatorSeries) -> Self {
        self.indicators
            .insert((timeframe.to_string(), name.to_string()), series);
        self
    }

    /// Fetches for `timeframe` fail as a provider outage would.
    pub fn failing(mut self, timeframe: &str) -> Self {
        self.failing.insert(timeframe.to_string());
        self
    }

    /// Loads a fixture file:
    ///
    /// ```json
    /// {"source": "offline", "candles": {"1m": [{"t": "2025-10-30 10:00:00 -0400", "o": 1, "h": 1, "l": 1, "c": 1, "v": 10}]}}
    /// ```
    ///
    /// `t` is an epoch-milliseconds number or any timestamp layout the
    /// reference zone parses.
    pub fn from_json_file(path: impl AsRef<Path>, zone: &ReferenceZone) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read candle fixtures {}", path.display()))?;
        let source = Self::from_json_str(&content, zone)
            .with_context(|| format!("Invalid candle fixtures {}", path.display()))?;
        info!(
            "MockCandleSource: Loaded fixtures for {} timeframe(s) from {}",
            source.candles.len(),
            path.display()
        );
        Ok(source)
    }

    pub fn from_json_str(content: &str, zone: &ReferenceZone) -> Result<Self> {
        let file: FixtureFile = serde_json::from_str(content).context("Failed to parse fixtures")?;
        let mut source = Self::new(file.source.unwrap_or_else(|| "offline".to_string()));

        for (code, bars) in file.candles {
            code.parse::<Timeframe>()?;
            let candles = bars
                .into_iter()
                .map(|bar| bar.into_candle(zone))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Bad bar in timeframe {}", code))?;
            source.candles.insert(code, candles);
        }
        Ok(source)
    }
}

impl Default for MockCandleSource {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    candles: HashMap<String, Vec<FixtureBar>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FixtureTime {
    Millis(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct FixtureBar {
    t: FixtureTime,
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    c: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
}

impl FixtureBar {
    fn into_candle(self, zone: &ReferenceZone) -> Result<Candle> {
        let instant = match self.t {
            FixtureTime::Millis(ms) => zone
                .from_epoch_millis(ms)
                .with_context(|| format!("Epoch millis out of range: {}", ms))?,
            FixtureTime::Text(text) => zone.parse_instant(&text)?,
        };
        Ok(Candle {
            instant,
            open: self.o,
            high: self.h,
            low: self.l,
            close: self.c,
            volume: self.v,
        })
    }
}

#[async_trait]
impl CandleSource for MockCandleSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        end: &Instant,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let code = timeframe.to_string();
        if self.failing.contains(&code) {
            bail!("MockCandleSource: simulated outage for {} {}", symbol, code);
        }

        let mut candles: Vec<Candle> = self
            .candles
            .get(&code)
            .map(|bars| bars.iter().filter(|c| c.instant <= *end).cloned().collect())
            .unwrap_or_default();
        candles.sort_by_key(|c| c.instant);
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }

        debug!(
            "MockCandleSource: {} {} -> {} candles",
            symbol,
            code,
            candles.len()
        );
        Ok(candles)
    }

    async fn fetch_indicator(
        &self,
        _symbol: &str,
        timeframe: &Timeframe,
        spec: &IndicatorSpec,
        limit: usize,
    ) -> Result<Option<IndicatorSeries>> {
        Ok(self
            .indicators
            .get(&(timeframe.to_string(), spec.name.clone()))
            .cloned()
            .map(|series| series.tail(limit)))
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
