//! Wall-clock access and tick arithmetic
//!
//! Ticks are whole time units since the Unix epoch. The start epoch is a
//! local calendar date-time, converted with an offset captured once when the
//! clock is created, so a daylight-saving change never shifts the epoch of a
//! running generator.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};

use crate::config::{TimeUnit, NANOS_PER_SECOND};
use crate::error::FlakeIdError;

/// Source of the current instant and of the local offset
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Local offset used for calendar conversions; must not change between calls
    fn offset(&self) -> FixedOffset;
}

/// System wall clock with the local offset fixed at construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            offset: *Local::now().offset(),
        }
    }

    /// System wall clock with an explicit offset instead of the local one
    pub const fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline(always)]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    #[inline(always)]
    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Nanoseconds since the Unix epoch for an instant
#[inline]
pub(crate) fn instant_nanos(instant: &DateTime<Utc>) -> i128 {
    instant.timestamp() as i128 * NANOS_PER_SECOND + instant.timestamp_subsec_nanos() as i128
}

/// Converts instants into ticks relative to the start epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSource {
    unit: TimeUnit,
    offset: FixedOffset,
    start_tick: i64,
}

impl ClockSource {
    pub fn new(start_time: NaiveDateTime, unit: TimeUnit, offset: FixedOffset) -> Self {
        let start_tick = unit.of_nanos(local_nanos(start_time, offset));
        Self {
            unit,
            offset,
            start_tick,
        }
    }

    #[inline(always)]
    pub const fn unit(&self) -> TimeUnit {
        self.unit
    }

    #[inline(always)]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Start epoch in ticks since the Unix epoch
    #[inline(always)]
    pub const fn start_tick(&self) -> i64 {
        self.start_tick
    }

    /// Absolute tick of an instant
    #[inline]
    pub fn tick_at(&self, instant: &DateTime<Utc>) -> i64 {
        self.unit.of_nanos(instant_nanos(instant))
    }

    /// Absolute tick of a Unix timestamp in milliseconds
    #[inline]
    pub fn tick_at_millis(&self, millis: i64) -> i64 {
        self.unit.of_millis(millis)
    }

    /// Absolute tick of a local date-time, read in the captured offset
    #[inline]
    pub fn tick_at_local(&self, local: NaiveDateTime) -> i64 {
        self.unit.of_nanos(local_nanos(local, self.offset))
    }

    /// Absolute tick of a Unix timestamp expressed in any unit
    #[inline]
    pub fn tick_in(&self, time: i64, unit: TimeUnit) -> i64 {
        self.unit.convert(time, unit)
    }

    /// Ticks elapsed since the start epoch; negative before it
    #[inline(always)]
    pub fn delta(&self, tick: i64) -> i64 {
        tick.wrapping_sub(self.start_tick)
    }

    /// Unix timestamp in milliseconds for an absolute tick
    #[inline]
    pub fn tick_to_millis(&self, tick: i64) -> i64 {
        self.unit.to_millis(tick)
    }

    /// Calendar instant for an absolute tick, in the captured offset
    pub fn tick_to_datetime(&self, tick: i64) -> Result<DateTime<FixedOffset>, FlakeIdError> {
        let nanos = self.unit.to_nanos(tick);
        let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SECOND))
            .map_err(|_| FlakeIdError::TimestampOutOfRange { tick })?;
        let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
        DateTime::from_timestamp(secs, subsec)
            .map(|utc| utc.with_timezone(&self.offset))
            .ok_or(FlakeIdError::TimestampOutOfRange { tick })
    }

    /// Local date-time for an absolute tick, in the captured offset
    pub fn tick_to_local(&self, tick: i64) -> Result<NaiveDateTime, FlakeIdError> {
        self.tick_to_datetime(tick).map(|dt| dt.naive_local())
    }
}

/// Nanoseconds since the Unix epoch of a local date-time at a fixed offset
fn local_nanos(local: NaiveDateTime, offset: FixedOffset) -> i128 {
    let as_utc = local.and_utc();
    let secs = as_utc.timestamp() - offset.local_minus_utc() as i64;
    secs as i128 * NANOS_PER_SECOND + as_utc.timestamp_subsec_nanos() as i128
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn utc8() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn test_start_tick_uses_offset() {
        let start = at(2024, 1, 1, 0, 0, 0);
        let utc = ClockSource::new(start, TimeUnit::Milliseconds, FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.start_tick(), 1_704_067_200_000);

        let shanghai = ClockSource::new(start, TimeUnit::Milliseconds, utc8());
        assert_eq!(shanghai.start_tick(), 1_704_038_400_000);

        let seconds = ClockSource::new(start, TimeUnit::Seconds, utc8());
        assert_eq!(seconds.start_tick(), 1_704_038_400);
    }

    #[test]
    fn test_delta_from_millis() {
        let source = ClockSource::new(at(2024, 1, 1, 0, 0, 0), TimeUnit::Milliseconds, utc8());
        let tick = source.tick_at_millis(1_704_038_400_250);
        assert_eq!(source.delta(tick), 250);
    }

    #[test]
    fn test_delta_negative_before_start() {
        let source = ClockSource::new(at(2024, 1, 1, 0, 0, 0), TimeUnit::Seconds, utc8());
        let tick = source.tick_at_millis(1_704_038_400_000 - 5_000);
        assert_eq!(source.delta(tick), -5);
    }

    #[test]
    fn test_local_and_instant_agree() {
        let source = ClockSource::new(at(2024, 1, 1, 0, 0, 0), TimeUnit::Microseconds, utc8());
        let local = at(2024, 3, 1, 12, 30, 0);
        let instant = local.and_local_timezone(utc8()).unwrap().with_timezone(&Utc);
        assert_eq!(source.tick_at_local(local), source.tick_at(&instant));
    }

    #[test]
    fn test_tick_to_local_roundtrip() {
        let source = ClockSource::new(at(2024, 1, 1, 0, 0, 0), TimeUnit::Seconds, utc8());
        let local = at(2030, 6, 15, 8, 45, 10);
        let tick = source.tick_at_local(local);
        assert_eq!(source.tick_to_local(tick).unwrap(), local);
        assert_eq!(source.tick_to_datetime(tick).unwrap().offset(), &utc8());
    }

    #[test]
    fn test_tick_to_millis_exact() {
        let source = ClockSource::new(at(2024, 1, 1, 0, 0, 0), TimeUnit::Milliseconds, utc8());
        let millis = 1_752_883_200_123;
        assert_eq!(source.tick_to_millis(source.tick_at_millis(millis)), millis);
    }

    #[test]
    fn test_tick_out_of_range() {
        let source = ClockSource::new(at(2024, 1, 1, 0, 0, 0), TimeUnit::Days, utc8());
        assert_eq!(
            source.tick_to_datetime(i64::MAX),
            Err(FlakeIdError::TimestampOutOfRange { tick: i64::MAX })
        );
    }

    #[test]
    fn test_system_clock_offset_is_stable() {
        let clock = SystemClock::new();
        assert_eq!(clock.offset(), clock.offset());
        let fixed = SystemClock::with_offset(utc8());
        assert_eq!(fixed.offset(), utc8());
    }
}
