use gridexport::application::export::{ExportRequest, ExportService};
use gridexport::config::{ExportEnvConfig, ExportPlan, RawExportPlan};
use gridexport::domain::indicators::IndicatorSeries;
use gridexport::domain::market::candle::Candle;
use gridexport::domain::market::clock::{Instant, ReferenceZone};
use gridexport::domain::market::session::{MarketSession, MarketStatus};
use gridexport::infrastructure::MockCandleSource;
use std::sync::Arc;

const PLAN: &str = r#"
max_candles_limit = 10

[[config."1m"]]
name = "rsi14"
indicator = "rsi"
params = { window_size = 14 }
candle_limit = 5

[[config."5m"]]
name = "ema10"
indicator = "ema"
params = { window_size = 10 }
candle_limit = 4

[[config."5m"]]
name = "macd"
indicator = "macd"
params = { short_window_size = 12, long_window_size = 26, signal_window_size = 9 }
candle_limit = 4
"#;

fn zone() -> ReferenceZone {
    ReferenceZone::default()
}

fn at(text: &str) -> Instant {
    zone().parse_instant(text).unwrap()
}

fn plan(toml_text: &str, defaults: &ExportEnvConfig) -> ExportPlan {
    let raw: RawExportPlan = toml::from_str(toml_text).unwrap();
    ExportPlan::resolve(raw, defaults).unwrap()
}

fn fixture_source() -> MockCandleSource {
    MockCandleSource::new("offline")
        .with_candles(
            "1m",
            vec![
                Candle::new(at("2025-10-30 10:01:00 -0400"), 1.0, 2.0, 0.5, 1.5, 100.0),
                Candle::new(at("2025-10-30 10:02:00 -0400"), 2.0, 3.0, 1.5, 2.5, 200.0),
                Candle::new(at("2025-10-30 10:04:00 -0400"), 4.0, 5.0, 3.5, 4.5, 400.0),
            ],
        )
        .with_candles(
            "5m",
            vec![
                Candle::new(at("2025-10-30 10:00:00 -0400"), 10.0, 12.0, 9.0, 11.0, 1000.0),
                Candle::new(at("2025-10-30 10:05:00 -0400"), 11.0, 13.0, 10.0, 12.0, 1100.0),
                Candle::new(at("2025-10-30 10:10:00 -0400"), 12.0, 14.0, 11.0, 13.0, 1200.0),
                Candle::new(at("2025-10-30 10:15:00 -0400"), 13.0, 15.0, 12.0, 14.0, 1300.0),
            ],
        )
}

fn request(plan: ExportPlan) -> ExportRequest {
    ExportRequest {
        symbol: "tsla".to_string(),
        as_of: at("2025-10-30 10:07:23 -0400"),
        plan,
    }
}

#[tokio::test]
async fn test_offline_export_document() {
    let service = ExportService::new(Arc::new(fixture_source()), zone());
    let doc = service
        .export(&request(plan(PLAN, &ExportEnvConfig::default())))
        .await;

    assert_eq!(doc.ticker, "TSLA");
    assert_eq!(doc.source, "offline");
    assert_eq!(doc.as_of_utc, "2025-10-30 14:07:23 UTC");
    assert_eq!(doc.as_of_edt, "2025-10-30 10:07:23 -0400");
    assert_eq!(doc.market_status, MarketStatus::Open);
    assert_eq!(doc.market_session, MarketSession::Regular);
    assert!(doc.errors.is_empty());
    assert_eq!(doc.frames.codes().collect::<Vec<_>>(), vec!["1m", "5m"]);
}

#[tokio::test]
async fn test_one_minute_frame_keeps_gaps() {
    let service = ExportService::new(Arc::new(fixture_source()), zone());
    let doc = service
        .export(&request(plan(PLAN, &ExportEnvConfig::default())))
        .await;

    let rows = doc.frames.get("1m").unwrap();
    // max(candle_limit 5, max_candles_limit 10)
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].timestamp, "2025-10-30 09:58:00 -0400");
    assert_eq!(rows[9].timestamp, "2025-10-30 10:07:00 -0400");

    let keys: Vec<&str> = rows[0].keys().collect();
    assert_eq!(
        keys,
        vec!["timestamp", "open", "high", "low", "close", "volume", "rsi14"]
    );

    let gap = rows.iter().find(|r| r.timestamp == "2025-10-30 10:03:00 -0400").unwrap();
    assert_eq!(gap.get("open"), Some(None));
    assert_eq!(gap.get("close"), Some(None));
    assert_eq!(gap.get("volume"), Some(Some(0.0)));

    let filled = rows.iter().find(|r| r.timestamp == "2025-10-30 10:04:00 -0400").unwrap();
    assert_eq!(filled.get("close"), Some(Some(4.5)));
    assert_eq!(filled.get("volume"), Some(Some(400.0)));

    // closes never fall, so the loss average stays at zero
    assert!(rows.iter().all(|r| r.get("rsi14") == Some(None)));
}

#[tokio::test]
async fn test_five_minute_frame_indicators() {
    let service = ExportService::new(Arc::new(fixture_source()), zone());
    let doc = service
        .export(&request(plan(PLAN, &ExportEnvConfig::default())))
        .await;

    let rows = doc.frames.get("5m").unwrap();
    assert_eq!(rows.len(), 10);
    // 10:07:23 snaps to 10:05; later fixtures fall past the anchor
    assert_eq!(rows[9].timestamp, "2025-10-30 10:05:00 -0400");
    assert_eq!(rows[9].get("close"), Some(Some(12.0)));
    assert_eq!(rows[8].get("close"), Some(Some(11.0)));
    assert_eq!(rows[7].get("close"), Some(None));

    for row in rows {
        for column in ["ema10", "macd_value", "macd_signal", "macd_histogram"] {
            assert!(row.get(column).is_some(), "{} missing at {}", column, row.timestamp);
        }
        assert!(row.get("macd").is_none());
    }

    // backfilled closes hold ema at 11 until the 12 arrives
    assert_eq!(rows[8].get("ema10"), Some(Some(11.0)));
    assert_eq!(rows[9].get("ema10"), Some(Some(11.182)));

    let macd = rows[9].get("macd_value").flatten().unwrap();
    let signal = rows[9].get("macd_signal").flatten().unwrap();
    let histogram = rows[9].get("macd_histogram").flatten().unwrap();
    assert!((macd - 0.080).abs() < 0.0015);
    assert!((signal - 0.016).abs() < 0.0015);
    assert!((histogram - (macd - signal)).abs() < 0.0015);
}

#[tokio::test]
async fn test_failed_timeframe_is_isolated() {
    let toml_text = format!("{}\n[[config.\"1h\"]]\nname = \"ema10\"\nindicator = \"ema\"\n", PLAN);
    let source = fixture_source().failing("1h");
    let service = ExportService::new(Arc::new(source), zone());
    let doc = service
        .export(&request(plan(&toml_text, &ExportEnvConfig::default())))
        .await;

    assert_eq!(doc.frames.codes().collect::<Vec<_>>(), vec!["1m", "5m"]);
    assert_eq!(doc.errors.len(), 1);
    assert_eq!(doc.errors[0].timeframe, "1h");
    assert_eq!(doc.errors[0].indicator, None);
    assert!(doc.errors[0].message.contains("simulated outage"));

    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["errors"][0]["timeframe"], "1h");
}

#[tokio::test]
async fn test_document_json_shape() {
    let service = ExportService::new(Arc::new(fixture_source()), zone());
    let doc = service
        .export(&request(plan(PLAN, &ExportEnvConfig::default())))
        .await;

    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["version"], "1.1.0");
    assert_eq!(json["market_session"], "Regular");
    assert_eq!(json["timezone"], "America/New_York");
    assert!(json.get("errors").is_none());
    assert!(json["frames"]["5m"][0]["open"].is_null());
    assert_eq!(json["frames"]["1m"][6]["close"], 4.5);

    let text = serde_json::to_string(&doc).unwrap();
    let one = text.find("\"1m\"").unwrap();
    let five = text.find("\"5m\"").unwrap();
    assert!(one < five);
}

#[tokio::test]
async fn test_provider_series_used_as_is() {
    let provided = IndicatorSeries::Single {
        name: "provider_rsi".to_string(),
        values: vec![Some(40.0), Some(50.0), Some(60.0)],
    };
    let source = fixture_source().with_indicator("1m", "rsi14", provided);
    let service = ExportService::new(Arc::new(source), zone());
    let doc = service
        .export(&request(plan(PLAN, &ExportEnvConfig::default())))
        .await;

    let rows = doc.frames.get("1m").unwrap();
    let values: Vec<_> = rows.iter().map(|r| r.get("rsi14").flatten()).collect();
    assert_eq!(&values[..7], &[None; 7]);
    assert_eq!(&values[7..], &[Some(40.0), Some(50.0), Some(60.0)]);
    assert!(rows[0].get("provider_rsi").is_none());
}

#[tokio::test]
async fn test_warmup_bars_are_trimmed_from_output() {
    let base = at("2025-10-30 09:00:00 -0400");
    let candles: Vec<Candle> = (0..120)
        .map(|i| {
            let close = 100.0 + f64::from(i % 7) - f64::from(i % 3);
            Candle::new(base + chrono::Duration::minutes(i64::from(i)), close, close, close, close, 1.0)
        })
        .collect();
    let source = Arc::new(MockCandleSource::default().with_candles("1m", candles));
    let toml_text = "max_candles_limit = 5\n[[config.\"1m\"]]\nname = \"ema10\"\nindicator = \"ema\"\n";

    let cold = ExportService::new(source.clone(), zone())
        .export(&request(plan(toml_text, &ExportEnvConfig::default())))
        .await;
    let warm_defaults = ExportEnvConfig {
        warmup_bars: 30,
        ..Default::default()
    };
    let warm = ExportService::new(source, zone())
        .export(&request(plan(toml_text, &warm_defaults)))
        .await;

    let cold_rows = cold.frames.get("1m").unwrap();
    let warm_rows = warm.frames.get("1m").unwrap();
    assert_eq!(cold_rows.len(), 5);
    assert_eq!(warm_rows.len(), 5);
    assert_eq!(cold_rows[4].timestamp, warm_rows[4].timestamp);
    assert_ne!(cold_rows[0].get("ema10"), warm_rows[0].get("ema10"));
}

#[tokio::test]
async fn test_indicator_named_after_base_column_replaces_it() {
    let toml_text = "max_candles_limit = 10\n[[config.\"5m\"]]\nname = \"close\"\nindicator = \"ema\"\nparams = { window_size = 10 }\n";
    let service = ExportService::new(Arc::new(fixture_source()), zone());
    let doc = service
        .export(&request(plan(toml_text, &ExportEnvConfig::default())))
        .await;

    let rows = doc.frames.get("5m").unwrap();
    let keys: Vec<&str> = rows[0].keys().collect();
    assert_eq!(keys, vec!["timestamp", "open", "high", "low", "close", "volume"]);
    assert_eq!(rows[9].get("close"), Some(Some(11.182)));
    assert_eq!(rows[9].get("open"), Some(Some(11.0)));

    let text = serde_json::to_string(&rows[9]).unwrap();
    assert_eq!(text.matches("\"close\"").count(), 1, "{}", text);
}

#[tokio::test]
async fn test_grid_beyond_date_range_is_isolated() {
    let toml_text = format!("{}\n[[config.\"100000000d\"]]\nname = \"ema10\"\nindicator = \"ema\"\n", PLAN);
    let service = ExportService::new(Arc::new(fixture_source()), zone());
    let doc = service
        .export(&request(plan(&toml_text, &ExportEnvConfig::default())))
        .await;

    assert_eq!(doc.frames.codes().collect::<Vec<_>>(), vec!["1m", "5m"]);
    assert_eq!(doc.errors.len(), 1);
    assert_eq!(doc.errors[0].timeframe, "100000000d");
    assert!(doc.errors[0].message.contains("supported date range"), "{}", doc.errors[0].message);
}

#[tokio::test]
async fn test_warmup_overflow_is_isolated() {
    let defaults = ExportEnvConfig {
        warmup_bars: usize::MAX,
        ..Default::default()
    };
    let service = ExportService::new(Arc::new(fixture_source()), zone());
    let doc = service.export(&request(plan(PLAN, &defaults))).await;

    assert!(doc.frames.codes().next().is_none());
    let failed: Vec<&str> = doc.errors.iter().map(|e| e.timeframe.as_str()).collect();
    assert_eq!(failed, vec!["1m", "5m"]);
    assert!(doc.errors[0].message.contains("warm-up"));
}

#[tokio::test]
async fn test_empty_provider_series_falls_back_to_local() {
    let empty = IndicatorSeries::Single {
        name: "ema10".to_string(),
        values: vec![],
    };
    let source = fixture_source().with_indicator("5m", "ema10", empty);
    let service = ExportService::new(Arc::new(source), zone());
    let doc = service
        .export(&request(plan(PLAN, &ExportEnvConfig::default())))
        .await;

    let rows = doc.frames.get("5m").unwrap();
    assert_eq!(rows[9].get("ema10"), Some(Some(11.182)));
}
