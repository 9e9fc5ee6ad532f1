//! Export Service
//!
//! Builds the export document for one symbol: every timeframe in the plan is
//! snapped, fetched, aligned, enriched with indicators and serialized.
//! Timeframes run concurrently and fail independently.

use super::row_exporter::{export_rows, merge_indicators};
use crate::application::indicators::compute_indicator;
use crate::application::market_data::grid_aligner::align_candles_to_grid;
use crate::config::{ExportPlan, FramePlan};
use crate::domain::frame::{AlignedFrame, ExportRow, TimestampLabel};
use crate::domain::indicators::{IndicatorSeries, IndicatorSpec};
use crate::domain::market::clock::{Instant, ReferenceZone};
use crate::domain::market::session::{MarketSession, MarketStatus, classify_session, market_status};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::CandleSource;
use futures::future::join_all;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const EXPORT_VERSION: &str = "1.1.0";

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub symbol: String,
    pub as_of: Instant,
    pub plan: ExportPlan,
}

/// A timeframe or indicator that could not be exported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportFailure {
    pub timeframe: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<String>,
    pub message: String,
}

/// Timeframe code → rows, serialized as a JSON object in plan order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frames(pub Vec<(String, Vec<ExportRow>)>);

impl Frames {
    pub fn get(&self, code: &str) -> Option<&[ExportRow]> {
        self.0.iter().find(|(c, _)| c == code).map(|(_, rows)| rows.as_slice())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }
}

impl Serialize for Frames {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (code, rows) in &self.0 {
            map.serialize_entry(code, rows)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub version: String,
    pub as_of_utc: String,
    pub as_of_edt: String,
    pub source: String,
    pub ticker: String,
    pub market_status: MarketStatus,
    pub market_session: MarketSession,
    pub timezone: String,
    pub frames: Frames,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExportFailure>,
}

struct FrameOutcome {
    code: String,
    rows: Option<Vec<ExportRow>>,
    failures: Vec<ExportFailure>,
}

impl FrameOutcome {
    fn failed(code: String, message: String) -> Self {
        Self {
            failures: vec![ExportFailure {
                timeframe: code.clone(),
                indicator: None,
                message,
            }],
            code,
            rows: None,
        }
    }
}

pub struct ExportService {
    source: Arc<dyn CandleSource>,
    zone: ReferenceZone,
}

impl ExportService {
    pub fn new(source: Arc<dyn CandleSource>, zone: ReferenceZone) -> Self {
        Self { source, zone }
    }

    pub async fn export(&self, request: &ExportRequest) -> ExportDocument {
        let symbol = request.symbol.trim().to_uppercase();
        let as_of = self.zone.to_local(&request.as_of);

        info!(
            "ExportService: Exporting {} as of {} ({} timeframes)",
            symbol,
            self.zone.format_with_offset(&as_of),
            request.plan.frames.len()
        );

        let outcomes = join_all(
            request
                .plan
                .frames
                .iter()
                .map(|frame| self.export_frame(&symbol, &as_of, frame, &request.plan)),
        )
        .await;

        let mut frames = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for outcome in outcomes {
            errors.extend(outcome.failures);
            if let Some(rows) = outcome.rows {
                frames.push((outcome.code, rows));
            }
        }

        if !errors.is_empty() {
            warn!(
                "ExportService: {} finished with {} isolated failure(s)",
                symbol,
                errors.len()
            );
        }

        ExportDocument {
            version: EXPORT_VERSION.to_string(),
            as_of_utc: ReferenceZone::format_utc(&as_of),
            as_of_edt: self.zone.format_with_offset(&as_of),
            source: self.source.source_name().to_string(),
            ticker: symbol,
            market_status: market_status(&as_of, &self.zone),
            market_session: classify_session(&as_of, &self.zone),
            timezone: self.zone.name().to_string(),
            frames: Frames(frames),
            errors,
        }
    }

    async fn export_frame(
        &self,
        symbol: &str,
        as_of: &Instant,
        frame_plan: &FramePlan,
        plan: &ExportPlan,
    ) -> FrameOutcome {
        let timeframe = frame_plan.timeframe;
        let code = timeframe.to_string();
        let limit = frame_plan.row_limit(plan.max_candles_limit);
        let Some(total) = limit.checked_add(plan.warmup_bars) else {
            warn!("ExportService: {} {} row count overflows", symbol, code);
            return FrameOutcome::failed(
                code,
                format!("{} rows plus {} warm-up bars is too many", limit, plan.warmup_bars),
            );
        };
        let end = timeframe.align_to_boundary(as_of, &self.zone);

        debug!(
            "ExportService: {} {} -> end {}, {} rows (+{} warm-up)",
            symbol,
            code,
            self.zone.format_with_offset(&end),
            limit,
            plan.warmup_bars
        );

        let grid = match timeframe.generate_grid(&end, total) {
            Ok(grid) => grid,
            Err(e) => {
                warn!("ExportService: {} {} grid rejected: {}", symbol, code, e);
                return FrameOutcome::failed(code, e.to_string());
            }
        };

        let candles = match self.source.fetch_candles(symbol, &timeframe, &end, total).await {
            Ok(candles) => candles,
            Err(e) => {
                warn!("ExportService: {} {} fetch failed: {:#}", symbol, code, e);
                return FrameOutcome::failed(code, format!("{:#}", e));
            }
        };

        let mut frame = align_candles_to_grid(&grid, &candles);

        let mut failures = Vec::new();
        let mut computed = Vec::with_capacity(frame_plan.indicators.len());
        for spec in &frame_plan.indicators {
            match self.indicator_series(symbol, &timeframe, spec, &frame, total).await {
                Ok(series) => computed.push(series.tail(total).renamed(&spec.name)),
                Err(message) => {
                    warn!(
                        "ExportService: {} {} indicator {} skipped: {}",
                        symbol, code, spec.name, message
                    );
                    failures.push(ExportFailure {
                        timeframe: code.clone(),
                        indicator: Some(spec.name.clone()),
                        message,
                    });
                }
            }
        }

        merge_indicators(&mut frame, computed);
        frame.keep_last(limit);
        let rows = export_rows(&frame, &self.zone, TimestampLabel::Offset);

        info!(
            "ExportService: {} {} exported {} rows from {} candles",
            symbol,
            code,
            rows.len(),
            candles.len()
        );

        FrameOutcome {
            code,
            rows: Some(rows),
            failures,
        }
    }

    /// Provider series when offered and non-empty, local computation otherwise.
    async fn indicator_series(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        spec: &IndicatorSpec,
        frame: &AlignedFrame,
        limit: usize,
    ) -> Result<IndicatorSeries, String> {
        match self.source.fetch_indicator(symbol, timeframe, spec, limit).await {
            Ok(Some(series)) if !series.is_empty() => return Ok(series),
            Ok(Some(_)) => debug!(
                "ExportService: provider {} for {} {} is empty, computing locally",
                spec.name, symbol, timeframe
            ),
            Ok(None) => {}
            Err(e) => warn!(
                "ExportService: provider {} for {} {} failed, computing locally: {:#}",
                spec.name, symbol, timeframe, e
            ),
        }
        compute_indicator(&spec.kind, frame).map_err(|e| e.to_string())
    }
}
