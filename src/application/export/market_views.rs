use crate::domain::errors::ExportError;
use crate::domain::market::clock::{Instant, ReferenceZone};
use crate::domain::market::session::{MarketSession, MarketStatus, classify_session, market_status};
use crate::domain::market::timeframe::Timeframe;
use serde::Serialize;

/// Session state at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub as_of: String,
    pub market_status: MarketStatus,
    pub market_session: MarketSession,
    pub timezone: String,
}

impl MarketSnapshot {
    pub fn at(instant: &Instant, zone: &ReferenceZone) -> Self {
        Self {
            as_of: zone.format_with_offset(instant),
            market_status: market_status(instant, zone),
            market_session: classify_session(instant, zone),
            timezone: zone.name().to_string(),
        }
    }
}

/// Snapped anchor plus the grid ending at it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeGrid {
    pub end_aligned: String,
    pub timestamps: Vec<String>,
}

impl TimeGrid {
    pub fn build(
        end: &Instant,
        timeframe: &Timeframe,
        count: usize,
        zone: &ReferenceZone,
    ) -> Result<Self, ExportError> {
        let end_aligned = timeframe.align_to_boundary(end, zone);
        let grid = timeframe.generate_grid(&end_aligned, count)?;
        Ok(Self {
            end_aligned: zone.format_with_offset(&end_aligned),
            timestamps: grid.iter().map(|ts| zone.format_with_offset(ts)).collect(),
        })
    }
}
