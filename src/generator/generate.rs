//! ID generation logic
//!
//! Every entry point reduces to an absolute tick, then shares
//! `generate_for_tick`.

use std::sync::atomic::Ordering;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use super::FlakeId;
use crate::clock::Clock;
use crate::config::TimeUnit;
use crate::error::FlakeIdError;

impl<C: Clock> FlakeId<C> {
    /// Generate a new FlakeId at the current clock time
    ///
    /// Never fails. A clock earlier than the start time, or a delta past the
    /// time field, still encodes (the id goes negative or stops sorting) and
    /// is logged once per generator; use [`Self::try_generate`] to reject
    /// those instead.
    #[inline]
    pub fn generate(&self) -> i64 {
        self.generate_at(&self.clock.now())
    }

    /// Generate an id for a given instant
    #[inline]
    pub fn generate_at(&self, instant: &DateTime<Utc>) -> i64 {
        self.generate_for_tick(self.clock_source().tick_at(instant))
    }

    /// Generate an id for a Unix timestamp in milliseconds
    #[inline]
    pub fn generate_at_millis(&self, millis: i64) -> i64 {
        self.generate_for_tick(self.clock_source().tick_at_millis(millis))
    }

    /// Generate an id for a local date-time in the captured offset
    #[inline]
    pub fn generate_at_local(&self, local: NaiveDateTime) -> i64 {
        self.generate_for_tick(self.clock_source().tick_at_local(local))
    }

    /// Generate an id for a Unix timestamp expressed in `unit`
    #[inline]
    pub fn generate_in(&self, time: i64, unit: TimeUnit) -> i64 {
        self.generate_for_tick(self.clock_source().tick_in(time, unit))
    }

    /// Generate at the current clock time, rejecting deltas the time field
    /// cannot hold
    pub fn try_generate(&self) -> Result<i64, FlakeIdError> {
        let tick = self.clock_source().tick_at(&self.clock.now());
        self.try_generate_for_tick(tick)
    }

    /// Checked variant of [`Self::generate_at_millis`]
    pub fn try_generate_at_millis(&self, millis: i64) -> Result<i64, FlakeIdError> {
        self.try_generate_for_tick(self.clock_source().tick_at_millis(millis))
    }

    fn try_generate_for_tick(&self, tick: i64) -> Result<i64, FlakeIdError> {
        let delta = self.clock_source().delta(tick);
        self.check_delta(delta)?;
        let sequence = self.sequencer.next(tick);
        Ok(self.codec.encode(delta, self.tenant_id, self.node_id, sequence))
    }

    #[inline]
    pub(crate) fn generate_for_tick(&self, tick: i64) -> i64 {
        let delta = self.clock_source().delta(tick);
        if self.check_delta(delta).is_err() {
            self.report_overflow(delta);
        }
        let sequence = self.sequencer.next(tick);
        self.codec.encode(delta, self.tenant_id, self.node_id, sequence)
    }

    #[inline(always)]
    fn check_delta(&self, delta: i64) -> Result<(), FlakeIdError> {
        if delta < 0 {
            return Err(FlakeIdError::ClockBeforeStart { delta });
        }
        if delta as u64 > self.layout().max_time() {
            return Err(FlakeIdError::TimeFieldOverflow {
                delta,
                bits: self.layout().widths().time,
            });
        }
        Ok(())
    }

    #[cold]
    #[inline(never)]
    fn report_overflow(&self, delta: i64) {
        if !self.overflow_reported.swap(true, Ordering::Relaxed) {
            warn!(
                delta,
                time_bits = self.layout().widths().time,
                start_time = %self.config.start_time(),
                "tick delta outside the time field; ids will not sort correctly"
            );
        }
    }
}
