//! Wall-clock time and the local trading-session calendar.
//!
//! The engine never reads the system clock directly: cooldown bookkeeping and
//! the warmup "today" filter go through an injected `Clock`, and all local
//! date/time questions go through a `SessionCalendar` built from a zone plus
//! the VWAP reset time. The zone is an IANA name when one is configured, so
//! the reset follows daylight-saving shifts; otherwise a fixed UTC offset.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Timelike, Utc};
use chrono_tz::Tz;

use super::config::ConfigError;

/// Source of the current wall-clock time, in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Time zone of the local session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionZone {
    /// IANA zone, e.g. `Asia/Seoul`. Offsets follow the zone's rules.
    Named(Tz),
    Fixed(FixedOffset),
}

impl SessionZone {
    /// An IANA name wins when given; otherwise the fixed `utc_offset` is used.
    pub fn parse(timezone: Option<&str>, utc_offset: &str) -> Result<Self, ConfigError> {
        match timezone {
            Some(name) => parse_timezone(name).map(SessionZone::Named),
            None => parse_utc_offset(utc_offset).map(SessionZone::Fixed),
        }
    }

    /// UTC offset in force at `timestamp`.
    pub fn offset_at(&self, timestamp: i64) -> Option<FixedOffset> {
        let utc = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
        Some(match self {
            SessionZone::Named(tz) => utc.with_timezone(tz).offset().fix(),
            SessionZone::Fixed(offset) => *offset,
        })
    }

    fn local(&self, timestamp: i64) -> Option<NaiveDateTime> {
        let utc = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
        Some(match self {
            SessionZone::Named(tz) => utc.with_timezone(tz).naive_local(),
            SessionZone::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        })
    }
}

impl fmt::Display for SessionZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionZone::Named(tz) => f.write_str(tz.name()),
            SessionZone::Fixed(offset) => write!(f, "UTC{offset}"),
        }
    }
}

/// Local session calendar: the session zone and the daily VWAP reset minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCalendar {
    zone: SessionZone,
    reset: NaiveTime,
}

impl SessionCalendar {
    pub fn new(zone: SessionZone, reset: NaiveTime) -> Self {
        Self { zone, reset }
    }

    /// Build from the textual forms used in configuration (`"+09:00"`, `"00:00"`).
    pub fn parse(utc_offset: &str, reset: &str) -> Result<Self, ConfigError> {
        Self::parse_zoned(None, utc_offset, reset)
    }

    /// Like `parse`, with an optional IANA zone name taking precedence.
    pub fn parse_zoned(
        timezone: Option<&str>,
        utc_offset: &str,
        reset: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            SessionZone::parse(timezone, utc_offset)?,
            parse_reset_time(reset)?,
        ))
    }

    pub fn zone(&self) -> SessionZone {
        self.zone
    }

    /// UTC offset in force at `timestamp`.
    pub fn offset_at(&self, timestamp: i64) -> Option<FixedOffset> {
        self.zone.offset_at(timestamp)
    }

    pub fn reset_time(&self) -> NaiveTime {
        self.reset
    }

    /// Local calendar date of a unix timestamp.
    pub fn local_date(&self, timestamp: i64) -> Option<NaiveDate> {
        self.zone.local(timestamp).map(|dt| dt.date())
    }

    /// True when both timestamps fall on the same local date.
    pub fn same_local_day(&self, a: i64, b: i64) -> bool {
        match (self.local_date(a), self.local_date(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// True when the local hour:minute of `timestamp` equals the reset time.
    ///
    /// Literal equality: every candle stamped inside the reset minute matches,
    /// and a day whose reset minute carries no candle gets no reset. With a
    /// named zone, a reset time skipped by a spring-forward gap never matches
    /// that day.
    pub fn is_reset_minute(&self, timestamp: i64) -> bool {
        self.zone.local(timestamp).is_some_and(|dt| {
            dt.hour() == self.reset.hour() && dt.minute() == self.reset.minute()
        })
    }
}

/// Parse a `HH:MM` reset time.
pub fn parse_reset_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidResetTime(value.to_string()))
}

/// Parse an IANA time zone name such as `"Asia/Seoul"`.
pub fn parse_timezone(value: &str) -> Result<Tz, ConfigError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimezone(value.to_string()))
}

/// Parse a fixed UTC offset: `"+09:00"`, `"-05:30"`, `"+0900"`, `"Z"` or `"UTC"`.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidUtcOffset(value.to_string());
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    if !rest.is_ascii() {
        return Err(invalid());
    }
    let (hh, mm) = match rest.len() {
        4 => (&rest[..2], &rest[2..]),
        5 if rest.as_bytes()[2] == b':' => (&rest[..2], &rest[3..]),
        _ => return Err(invalid()),
    };
    if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = hh.parse().map_err(|_| invalid())?;
    let minutes: i32 = mm.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
