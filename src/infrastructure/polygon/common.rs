use crate::domain::market::candle::Candle;
use crate::domain::market::clock::ReferenceZone;
use serde::{Deserialize, Serialize};

/// One aggregate bar of `/v2/aggs`
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct PolygonAgg {
    /// Bar start, epoch milliseconds
    #[serde(rename = "t")]
    pub timestamp: i64,
    #[serde(rename = "o")]
    pub open: Option<f64>,
    #[serde(rename = "h")]
    pub high: Option<f64>,
    #[serde(rename = "l")]
    pub low: Option<f64>,
    #[serde(rename = "c")]
    pub close: Option<f64>,
    #[serde(rename = "v", default)]
    pub volume: Option<f64>,
}

impl PolygonAgg {
    pub fn to_candle(&self, zone: &ReferenceZone) -> Option<Candle> {
        Some(Candle {
            instant: zone.from_epoch_millis(self.timestamp)?,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PolygonAggsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "resultsCount")]
    pub results_count: Option<usize>,
    #[serde(default)]
    pub results: Vec<PolygonAgg>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parses_sparse_bars() {
        let body = r#"{
            "ticker": "TSLA",
            "status": "OK",
            "resultsCount": 2,
            "results": [
                {"t": 1761833100000, "o": 450.1, "h": 451.0, "l": 449.5, "c": 450.7, "v": 1200},
                {"t": 1761833400000, "o": 450.7, "h": 450.9, "l": 450.0, "c": 450.2}
            ]
        }"#;
        let resp: PolygonAggsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.results_count, Some(2));
        assert_eq!(resp.results[1].volume, None);

        let zone = ReferenceZone::default();
        let candle = resp.results[0].to_candle(&zone).unwrap();
        assert_eq!(zone.format_with_offset(&candle.instant), "2025-10-30 10:05:00 -0400");
        assert_eq!(candle.close, Some(450.7));
    }

    #[test]
    fn test_missing_results_is_empty() {
        let resp: PolygonAggsResponse =
            serde_json::from_str(r#"{"status": "ERROR", "error": "bad key"}"#).unwrap();
        assert!(resp.results.is_empty());
        assert_eq!(resp.error.as_deref(), Some("bad key"));
    }
}
