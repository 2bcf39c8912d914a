//! Time units a tick can be expressed in
//!
//! All conversions go through whole nanoseconds held in `i128`, so converting
//! the same instant between units never accumulates drift.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::FlakeIdError;

pub(crate) const NANOS_PER_MILLI: i128 = 1_000_000;
pub(crate) const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Granularity of the time field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Every unit, finest first
    pub const ALL: [TimeUnit; 7] = [
        TimeUnit::Nanoseconds,
        TimeUnit::Microseconds,
        TimeUnit::Milliseconds,
        TimeUnit::Seconds,
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
    ];

    /// Number of nanoseconds in one unit
    #[inline(always)]
    pub const fn nanos_per_unit(self) -> i128 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => NANOS_PER_MILLI,
            TimeUnit::Seconds => NANOS_PER_SECOND,
            TimeUnit::Minutes => 60 * NANOS_PER_SECOND,
            TimeUnit::Hours => 3_600 * NANOS_PER_SECOND,
            TimeUnit::Days => 86_400 * NANOS_PER_SECOND,
        }
    }

    /// Length of one tick in this unit
    pub const fn duration(self) -> Duration {
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(1),
            TimeUnit::Microseconds => Duration::from_micros(1),
            TimeUnit::Milliseconds => Duration::from_millis(1),
            TimeUnit::Seconds => Duration::from_secs(1),
            TimeUnit::Minutes => Duration::from_secs(60),
            TimeUnit::Hours => Duration::from_secs(3_600),
            TimeUnit::Days => Duration::from_secs(86_400),
        }
    }

    /// True for units of one second or coarser
    pub const fn is_coarse(self) -> bool {
        matches!(
            self,
            TimeUnit::Seconds | TimeUnit::Minutes | TimeUnit::Hours | TimeUnit::Days
        )
    }

    /// Convert nanoseconds since the Unix epoch to whole units, rounding
    /// toward negative infinity
    #[inline]
    pub fn of_nanos(self, nanos: i128) -> i64 {
        saturate(nanos.div_euclid(self.nanos_per_unit()))
    }

    /// Convert milliseconds since the Unix epoch to whole units
    #[inline]
    pub fn of_millis(self, millis: i64) -> i64 {
        self.of_nanos(millis as i128 * NANOS_PER_MILLI)
    }

    /// Nanoseconds covered by `value` units
    #[inline]
    pub fn to_nanos(self, value: i64) -> i128 {
        value as i128 * self.nanos_per_unit()
    }

    /// Milliseconds covered by `value` units, saturating at the `i64` range
    #[inline]
    pub fn to_millis(self, value: i64) -> i64 {
        saturate(self.to_nanos(value).div_euclid(NANOS_PER_MILLI))
    }

    /// Convert `value` expressed in `from` into this unit
    #[inline]
    pub fn convert(self, value: i64, from: TimeUnit) -> i64 {
        self.of_nanos(from.to_nanos(value))
    }

    pub const fn name(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "NANOSECONDS",
            TimeUnit::Microseconds => "MICROSECONDS",
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
        }
    }
}

#[inline(always)]
fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeUnit {
    type Err = FlakeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "nanoseconds" | "nanos" | "ns" => TimeUnit::Nanoseconds,
            "microseconds" | "micros" | "us" => TimeUnit::Microseconds,
            "milliseconds" | "millis" | "ms" => TimeUnit::Milliseconds,
            "seconds" | "secs" | "s" => TimeUnit::Seconds,
            "minutes" | "mins" | "m" => TimeUnit::Minutes,
            "hours" | "h" => TimeUnit::Hours,
            "days" | "d" => TimeUnit::Days,
            _ => {
                return Err(FlakeIdError::UnknownTimeUnit {
                    input: s.to_string(),
                })
            }
        };
        Ok(unit)
    }
}
