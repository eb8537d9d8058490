//! Presentation windows over the simulated horizon.
//!
//! A [`WindowGenerator`] lazily yields `(start, duration)` windows, either of
//! a fixed length or aligned to calendar units. The [`aggregate`] functions
//! reduce telemetry and events per window; [`filter`] restricts them to a
//! date range.

pub mod aggregate;
pub mod filter;

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Calendar units windows can be aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarUnit {
    Hourly,
    Daily,
    /// Weeks start on Monday.
    Weekly,
    Monthly,
    Yearly,
}

impl CalendarUnit {
    /// Start of the unit containing `t`.
    pub fn floor(self, t: NaiveDateTime) -> NaiveDateTime {
        let date = t.date();
        let midnight = date.and_time(NaiveTime::MIN);
        let days_back = match self {
            Self::Hourly => return midnight + Duration::hours(i64::from(t.hour())),
            Self::Daily => 0,
            Self::Weekly => date.weekday().num_days_from_monday(),
            Self::Monthly => date.day0(),
            Self::Yearly => date.ordinal0(),
        };
        midnight - Duration::days(i64::from(days_back))
    }

    /// Start of the following unit, `None` past chrono's representable range.
    pub fn advance(self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Hourly => start.checked_add_signed(Duration::hours(1)),
            Self::Daily => start.checked_add_signed(Duration::days(1)),
            Self::Weekly => start.checked_add_signed(Duration::weeks(1)),
            Self::Monthly => start.checked_add_months(Months::new(1)),
            Self::Yearly => start.checked_add_months(Months::new(12)),
        }
    }
}

/// How windows are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpec {
    /// Consecutive windows of a fixed length, starting at the origin.
    Fixed { duration_ms: u64 },
    /// Windows aligned to calendar boundaries.
    Calendar(CalendarUnit),
}

impl FromStr for WindowSpec {
    type Err = Error;

    /// Parses `hourly`, `daily`, `weekly`, `monthly`, `yearly`, or a fixed
    /// length such as `90m`, `6h` or `500ms`.
    fn from_str(s: &str) -> Result<Self> {
        let unit = match s {
            "hourly" => Some(CalendarUnit::Hourly),
            "daily" => Some(CalendarUnit::Daily),
            "weekly" => Some(CalendarUnit::Weekly),
            "monthly" => Some(CalendarUnit::Monthly),
            "yearly" => Some(CalendarUnit::Yearly),
            _ => None,
        };
        if let Some(unit) = unit {
            return Ok(Self::Calendar(unit));
        }

        let (digits, scale) = if let Some(n) = s.strip_suffix("ms") {
            (n, 1)
        } else if let Some(n) = s.strip_suffix('m') {
            (n, 60_000)
        } else if let Some(n) = s.strip_suffix('h') {
            (n, 3_600_000)
        } else {
            return Err(Error::InvalidWindow(format!(
                "\"{s}\" is neither a calendar unit nor a duration like 90m"
            )));
        };
        let n: u64 = digits
            .parse()
            .map_err(|_| Error::InvalidWindow(format!("\"{s}\" has no valid length")))?;
        let duration_ms = n
            .checked_mul(scale)
            .ok_or_else(|| Error::InvalidWindow(format!("\"{s}\" is too long")))?;
        if duration_ms == 0 {
            return Err(Error::InvalidWindow("duration must be > 0".into()));
        }
        Ok(Self::Fixed { duration_ms })
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { duration_ms } => write!(f, "{duration_ms}ms"),
            Self::Calendar(unit) => {
                let name = match unit {
                    CalendarUnit::Hourly => "hourly",
                    CalendarUnit::Daily => "daily",
                    CalendarUnit::Weekly => "weekly",
                    CalendarUnit::Monthly => "monthly",
                    CalendarUnit::Yearly => "yearly",
                };
                f.write_str(name)
            }
        }
    }
}

/// One aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    /// Length after clipping to the generator's end.
    pub duration_ms: u64,
}

impl Window {
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::milliseconds(self.duration_ms as i64)
    }
}

/// Finite, lazy iterator of windows covering `[origin, end)`.
///
/// Clone it before iterating to walk the same windows again.
#[derive(Debug, Clone)]
pub struct WindowGenerator {
    spec: WindowSpec,
    next_start: Option<NaiveDateTime>,
    end: NaiveDateTime,
}

impl WindowGenerator {
    /// Creates a generator for `spec` over `[origin, end)`.
    ///
    /// Calendar windows start at the boundary at or before `origin`; the
    /// last window of either kind is clipped to `end`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] for a zero fixed duration.
    pub fn new(spec: WindowSpec, origin: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        let first = match spec {
            WindowSpec::Fixed { duration_ms: 0 } => {
                return Err(Error::InvalidWindow("duration must be > 0".into()));
            }
            WindowSpec::Fixed { .. } => origin,
            WindowSpec::Calendar(unit) => unit.floor(origin),
        };
        Ok(Self {
            spec,
            next_start: Some(first),
            end,
        })
    }

    fn unclipped_end(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.spec {
            WindowSpec::Fixed { duration_ms } => {
                let millis = i64::try_from(duration_ms).ok()?;
                start.checked_add_signed(Duration::try_milliseconds(millis)?)
            }
            WindowSpec::Calendar(unit) => unit.advance(start),
        }
    }
}

impl Iterator for WindowGenerator {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let start = self.next_start.filter(|s| *s < self.end)?;
        let natural_end = self.unclipped_end(start);
        self.next_start = natural_end;
        let end = natural_end.map_or(self.end, |e| e.min(self.end));
        let duration_ms = (end - start).num_milliseconds().max(0) as u64;
        Some(Window { start, duration_ms })
    }
}
