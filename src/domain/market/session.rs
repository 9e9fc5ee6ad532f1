//! US equity session classification.
//!
//! Sessions are fixed local time-of-day windows in the reference zone. The
//! calendar date is ignored, so weekends and holidays classify like any
//! other day.

use super::clock::ReferenceZone;
use chrono::{DateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketSession {
    #[serde(rename = "Pre-Market")]
    PreMarket,
    #[serde(rename = "Regular")]
    Regular,
    #[serde(rename = "After-Hours")]
    AfterHours,
    #[serde(rename = "Closed")]
    Closed,
}

impl MarketSession {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSession::PreMarket => "Pre-Market",
            MarketSession::Regular => "Regular",
            MarketSession::AfterHours => "After-Hours",
            MarketSession::Closed => "Closed",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, MarketSession::Closed)
    }
}

impl fmt::Display for MarketSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketStatus {
    Open,
    Closed,
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketStatus::Open => f.write_str("Open"),
            MarketStatus::Closed => f.write_str("Closed"),
        }
    }
}

/// Half-open `[start, end)` local time-of-day window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub session: MarketSession,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }
}

const fn hm(hour: u32, min: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, min, 0) {
        Some(t) => t,
        None => panic!("invalid session boundary"),
    }
}

pub const PRE_MARKET: SessionWindow = SessionWindow {
    session: MarketSession::PreMarket,
    start: hm(4, 0),
    end: hm(9, 30),
};

pub const REGULAR: SessionWindow = SessionWindow {
    session: MarketSession::Regular,
    start: hm(9, 30),
    end: hm(16, 0),
};

pub const AFTER_HOURS: SessionWindow = SessionWindow {
    session: MarketSession::AfterHours,
    start: hm(16, 0),
    end: hm(20, 0),
};

/// Evaluation order matters: first matching window wins.
pub const SESSIONS_ORDERED: [SessionWindow; 3] = [PRE_MARKET, REGULAR, AFTER_HOURS];

pub fn classify_session<Z: TimeZone>(instant: &DateTime<Z>, zone: &ReferenceZone) -> MarketSession {
    let t = zone.to_local(instant).time();
    SESSIONS_ORDERED
        .iter()
        .find(|w| w.contains(t))
        .map(|w| w.session)
        .unwrap_or(MarketSession::Closed)
}

pub fn market_status<Z: TimeZone>(instant: &DateTime<Z>, zone: &ReferenceZone) -> MarketStatus {
    if classify_session(instant, zone).is_open() {
        MarketStatus::Open
    } else {
        MarketStatus::Closed
    }
}
