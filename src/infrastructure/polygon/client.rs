use super::common::PolygonAggsResponse;
use crate::domain::market::candle::Candle;
use crate::domain::market::clock::{Instant, ReferenceZone};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::CandleSource;
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, build_url_with_query, redact_query_param,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, error, info};

pub const DEFAULT_POLYGON_BASE_URL: &str = "https://api.polygon.io";

/// Candle source backed by the Polygon aggregates REST endpoint.
///
/// Indicator series are always computed locally.
pub struct PolygonMarketDataService {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    source_label: String,
    zone: ReferenceZone,
}

impl PolygonMarketDataService {
    pub fn new(api_key: String, base_url: String, source_label: String, zone: ReferenceZone) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            source_label,
            zone,
        }
    }

    /// Aggregates URL covering `timeframe.lookback(limit)` before `end`.
    pub fn aggregates_url(&self, symbol: &str, timeframe: &Timeframe, end: &Instant, limit: usize) -> String {
        let start = end
            .checked_sub_signed(timeframe.lookback(limit))
            .unwrap_or(*end);
        let path = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url,
            symbol,
            timeframe.magnitude(),
            timeframe.unit().to_polygon_timespan(),
            start.timestamp_millis(),
            end.timestamp_millis()
        );

        let fetch_limit = limit.saturating_mul(5).to_string();
        build_url_with_query(
            &path,
            &[
                ("adjusted", "true"),
                ("sort", "desc"),
                ("limit", fetch_limit.as_str()),
                ("apiKey", self.api_key.as_str()),
            ],
        )
    }

    /// Ascending candles at or before `end`, the last `limit` of them.
    fn select_recent(&self, response: PolygonAggsResponse, end: &Instant, limit: usize) -> Vec<Candle> {
        let mut candles: Vec<Candle> = response
            .results
            .iter()
            .filter_map(|agg| agg.to_candle(&self.zone))
            .filter(|c| c.instant <= *end)
            .collect();

        candles.sort_by_key(|c| c.instant);
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        candles
    }
}

#[async_trait]
impl CandleSource for PolygonMarketDataService {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        end: &Instant,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = self.aggregates_url(symbol, timeframe, end, limit);
        debug!(
            "PolygonMarketDataService: GET {}",
            redact_query_param(&url, "apiKey")
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {} {} aggregates from Polygon", symbol, timeframe))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "PolygonMarketDataService: API error {} for {} {}: {}",
                status, symbol, timeframe, error_text
            );
            anyhow::bail!("Polygon API error ({}): {}", status, error_text);
        }

        let body: PolygonAggsResponse = response
            .json()
            .await
            .context("Failed to parse Polygon aggregates response")?;

        if let Some(message) = body.error.as_deref() {
            error!(
                "PolygonMarketDataService: {} {} returned status {:?}: {}",
                symbol, timeframe, body.status, message
            );
            anyhow::bail!("Polygon returned an error for {} {}: {}", symbol, timeframe, message);
        }

        let received = body.results.len();
        let candles = self.select_recent(body, end, limit);
        info!(
            "PolygonMarketDataService: {} {} received {} bars, kept {}",
            symbol,
            timeframe,
            received,
            candles.len()
        );
        Ok(candles)
    }

    fn source_name(&self) -> &str {
        &self.source_label
    }
}
