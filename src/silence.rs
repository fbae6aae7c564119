//! Silence windows: weekends and a recurring daily period during which the
//! dead queue check reports OK without contacting Sidekiq.

use crate::config::Config;
use crate::errors::{CheckError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Source of the current instant. Always UTC.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Why a run was silenced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceReason {
    Weekend,
    TimeWindow,
}

impl SilenceReason {
    /// Message reported alongside the OK status
    pub fn message(&self) -> &'static str {
        match self {
            SilenceReason::Weekend => "silence mode - dead queue checks disabled for the weekend",
            SilenceReason::TimeWindow => {
                "silence mode - dead queue checks disabled for time period"
            }
        }
    }
}

impl fmt::Display for SilenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SilenceReason::Weekend => write!(f, "weekend"),
            SilenceReason::TimeWindow => write!(f, "time-window"),
        }
    }
}

/// Recurring daily silence period, written `START-HOURS` on the command line
/// (for example `23:00-4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceSpec {
    pub start: NaiveTime,
    pub hours: u32,
}

impl SilenceSpec {
    pub const MAX_HOURS: u32 = 23;

    pub fn new(start: NaiveTime, hours: u32) -> Result<Self> {
        if hours == 0 || hours > Self::MAX_HOURS {
            return Err(CheckError::Config(format!(
                "silence duration must be between 1 and {} hours, got {}",
                Self::MAX_HOURS,
                hours
            )));
        }

        Ok(Self { start, hours })
    }

    pub fn duration(&self) -> Duration {
        Duration::hours(i64::from(self.hours))
    }

    /// True when the end hour, computed on the same day, is smaller than the
    /// start hour, i.e. the period runs past midnight.
    pub fn wraps_midnight(&self) -> bool {
        let naive_end_hour = (self.start + self.duration()).hour();
        self.start.hour() > naive_end_hour
    }

    /// Resolve the concrete window relevant to `now`.
    ///
    /// A wrapping period is anchored on the previous day so that it covers
    /// the early hours of today. Once today's start time has passed, the
    /// period starting today is the relevant one instead.
    pub fn window_at(&self, now: DateTime<Utc>) -> SilenceWindow {
        let today = now.date_naive();
        let anchor = if self.wraps_midnight() && now.time() < self.start {
            today.pred_opt().unwrap_or(today)
        } else {
            today
        };

        let start = anchor.and_time(self.start).and_utc();
        SilenceWindow {
            start,
            end: start + self.duration(),
        }
    }
}

impl FromStr for SilenceSpec {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, hours) = s.trim().rsplit_once('-').ok_or_else(|| {
            CheckError::Config(format!(
                "silence period '{}' must look like START_TIME-NUMBER_OF_HOURS",
                s
            ))
        })?;

        let start = parse_time_of_day(start.trim())?;
        let hours = hours.trim().parse::<u32>().map_err(|_| {
            CheckError::Config(format!("invalid number of hours '{}' in silence period", hours))
        })?;

        Self::new(start, hours)
    }
}

impl fmt::Display for SilenceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.hours)
    }
}

fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| CheckError::Config(format!("invalid start time '{}', expected HH:MM", s)))
}

/// Half-open interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SilenceWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

pub fn is_weekend(now: DateTime<Utc>) -> bool {
    matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Decide whether alerting is suppressed at `now`. Weekend silencing takes
/// precedence over the daily window.
pub fn is_silenced(now: DateTime<Utc>, config: &Config) -> Option<SilenceReason> {
    if config.silence_weekends && is_weekend(now) {
        return Some(SilenceReason::Weekend);
    }

    let spec = config.silence.as_ref()?;
    let window = spec.window_at(now);
    debug!(
        "Silence window {} resolved to [{}, {}) for {}",
        spec, window.start, window.end, now
    );

    window.contains(now).then_some(SilenceReason::TimeWindow)
}
