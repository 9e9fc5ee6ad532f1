use super::clock::{Instant, ReferenceZone};
use crate::domain::errors::ExportError;
use chrono::{Duration, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MAX_GRID_PREALLOC: usize = 4_096;

/// Unit suffix of a timeframe code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    pub fn seconds(&self) -> i64 {
        match self {
            TimeUnit::Second => 1,
            TimeUnit::Minute => 60,
            TimeUnit::Hour => 3_600,
            TimeUnit::Day => 86_400,
        }
    }

    pub fn suffix(&self) -> char {
        match self {
            TimeUnit::Second => 's',
            TimeUnit::Minute => 'm',
            TimeUnit::Hour => 'h',
            TimeUnit::Day => 'd',
        }
    }

    /// Timespan name used by the Polygon aggregates endpoint
    pub fn to_polygon_timespan(&self) -> &'static str {
        match self {
            TimeUnit::Second => "second",
            TimeUnit::Minute => "minute",
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c {
            's' => Some(TimeUnit::Second),
            'm' => Some(TimeUnit::Minute),
            'h' => Some(TimeUnit::Hour),
            'd' => Some(TimeUnit::Day),
            _ => None,
        }
    }
}

/// Fixed bar spacing parsed from a `<int><unit>` code such as `5m` or `1d`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeframe {
    magnitude: u32,
    unit: TimeUnit,
}

impl Timeframe {
    pub fn new(magnitude: u32, unit: TimeUnit) -> Self {
        Self { magnitude, unit }
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Returns the duration in seconds
    pub fn to_seconds(&self) -> i64 {
        i64::from(self.magnitude) * self.unit.seconds()
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.to_seconds())
    }

    /// Snaps down to the most recent epoch-aligned boundary at or before `instant`.
    ///
    /// Boundaries are multiples of the duration since the Unix epoch. For day
    /// timeframes that means UTC midnight, not exchange-local midnight.
    pub fn align_to_boundary<Z: TimeZone>(
        &self,
        instant: &chrono::DateTime<Z>,
        zone: &ReferenceZone,
    ) -> Instant {
        let local = zone.to_local(instant);
        let period_sec = self.to_seconds();
        let snapped = local.timestamp().div_euclid(period_sec) * period_sec;

        zone.from_epoch_seconds(snapped).unwrap_or(local)
    }

    /// `count` timestamps ending at `end_inclusive`, ascending, one duration apart.
    ///
    /// The anchor is used as given: callers snap it first. Fails when the
    /// earliest point would fall before the minimum representable date.
    pub fn generate_grid(&self, end_inclusive: &Instant, count: usize) -> Result<Vec<Instant>, ExportError> {
        let step = self.duration();
        let mut grid = Vec::with_capacity(count.min(MAX_GRID_PREALLOC));
        let mut cur = *end_inclusive;
        for i in 0..count {
            grid.push(cur);
            if i + 1 == count {
                break;
            }
            cur = cur
                .checked_sub_signed(step)
                .ok_or_else(|| ExportError::GridOutOfRange {
                    timeframe: self.to_string(),
                    count,
                })?;
        }
        grid.reverse();
        Ok(grid)
    }

    /// Provider lookback covering `limit` bars with room for gaps (4x)
    pub fn lookback(&self, limit: usize) -> Duration {
        let bars = i64::try_from(limit).unwrap_or(i64::MAX / 4).saturating_mul(4);
        Duration::try_seconds(self.to_seconds().saturating_mul(bars)).unwrap_or(Duration::MAX)
    }
}

impl FromStr for Timeframe {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || ExportError::UnsupportedTimeframe {
            code: s.to_string(),
        };

        let mut chars = s.chars();
        let unit = chars
            .next_back()
            .and_then(TimeUnit::from_suffix)
            .ok_or_else(unsupported)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unsupported());
        }
        let magnitude = digits.parse::<u32>().map_err(|_| unsupported())?;
        if magnitude == 0 {
            return Err(unsupported());
        }

        Ok(Timeframe { magnitude, unit })
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

impl Serialize for Timeframe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}
