use crate::domain::errors::ExportError;
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

/// Instant in the reference exchange timezone.
pub type Instant = DateTime<Tz>;

/// Accepted wall-clock layouts for user-supplied datetimes that carry an offset.
const OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M %z",
];

/// Accepted wall-clock layouts for naive (offset-less) datetimes.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// The timezone every instant is reasoned about in.
///
/// Defaults to the New York exchange zone. Tests and alternative venues can
/// construct their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone {
    tz: Tz,
}

impl ReferenceZone {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// IANA name, e.g. `America/New_York`
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Converts any aware datetime into the reference zone.
    pub fn to_local<Z: TimeZone>(&self, instant: &DateTime<Z>) -> Instant {
        instant.with_timezone(&self.tz)
    }

    /// Interprets a naive datetime as wall-clock time in the reference zone.
    ///
    /// Ambiguous times (DST fall-back) resolve to the standard-time instant,
    /// times inside a spring-forward gap are rejected.
    pub fn localize(&self, naive: NaiveDateTime) -> Result<Instant, ExportError> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok(dt),
            LocalResult::Ambiguous(_, standard) => Ok(standard),
            LocalResult::None => Err(ExportError::InvalidInstant {
                input: naive.to_string(),
                reason: format!("does not exist in {}", self.name()),
            }),
        }
    }

    /// Instant at an epoch second, expressed in the reference zone.
    pub fn from_epoch_seconds(&self, secs: i64) -> Option<Instant> {
        DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.with_timezone(&self.tz))
    }

    /// Instant at an epoch millisecond, expressed in the reference zone.
    pub fn from_epoch_millis(&self, millis: i64) -> Option<Instant> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&self.tz))
    }

    /// Parses a user-supplied datetime.
    ///
    /// Offset-carrying input (RFC 3339 or `YYYY-MM-DD HH:MM:SS -0400`) is
    /// converted, naive input is localized, a bare date means local midnight.
    pub fn parse_instant(&self, input: &str) -> Result<Instant, ExportError> {
        let trimmed = input.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(self.to_local(&dt));
        }
        for layout in OFFSET_LAYOUTS {
            if let Ok(dt) = DateTime::parse_from_str(trimmed, layout) {
                return Ok(self.to_local(&dt));
            }
        }
        if let Some(naive) = trimmed.strip_suffix(" UTC").or_else(|| trimmed.strip_suffix('Z')) {
            for layout in NAIVE_LAYOUTS {
                if let Ok(ndt) = NaiveDateTime::parse_from_str(naive.trim(), layout) {
                    return Ok(self.to_local(&ndt.and_utc()));
                }
            }
        }
        for layout in NAIVE_LAYOUTS {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, layout) {
                return self.localize(ndt);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return self.localize(date.and_hms_opt(0, 0, 0).unwrap_or_default());
        }

        Err(ExportError::InvalidInstant {
            input: input.to_string(),
            reason: "expected RFC 3339, 'YYYY-MM-DD HH:MM:SS [+-HHMM]' or 'YYYY-MM-DD'".to_string(),
        })
    }

    /// `YYYY-MM-DD HH:MM:SS +-HHMM` in the reference zone
    pub fn format_with_offset(&self, instant: &Instant) -> String {
        self.to_local(instant).format("%Y-%m-%d %H:%M:%S %z").to_string()
    }

    /// `YYYY-MM-DD HH:MM:SS UTC`
    pub fn format_utc(instant: &Instant) -> String {
        instant
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string()
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::new(chrono_tz::America::New_York)
    }
}

impl FromStr for ReferenceZone {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|_| ExportError::InvalidTimezone {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for ReferenceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
