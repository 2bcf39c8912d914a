//! Recyclable counter: one shared counter cycling through `0..=threshold`
//!
//! The fast path is a single `fetch_add`. A caller that lands past the
//! threshold tries to swing the counter back to zero with one CAS and retries;
//! after `max_retry` misses it resets under a mutex instead. A raw value may
//! briefly sit above the threshold between an increment and a reset, so two
//! callers in the same tick can end up with the same masked sequence under
//! heavy contention.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug)]
pub struct RecyclableCounter {
    value: AtomicU64,
    threshold: u64,
    max_retry: u32,
    reset_lock: Mutex<()>,
}

impl RecyclableCounter {
    /// Counter yielding `0..=threshold` before wrapping
    pub fn new(threshold: u64, max_retry: u32) -> Self {
        Self {
            value: AtomicU64::new(0),
            threshold,
            max_retry,
            reset_lock: Mutex::new(()),
        }
    }

    #[inline(always)]
    pub const fn threshold(&self) -> u64 {
        self.threshold
    }

    #[inline(always)]
    pub const fn max_retry(&self) -> u32 {
        self.max_retry
    }

    /// Next value in `0..=threshold`
    #[inline]
    pub fn next(&self) -> u64 {
        let mut attempts = 0u32;
        loop {
            let current = self.value.fetch_add(1, Ordering::AcqRel);
            if current <= self.threshold {
                return current;
            }

            // Only succeeds if nobody incremented after us.
            let _ = self.value.compare_exchange(
                current.wrapping_add(1),
                0,
                Ordering::AcqRel,
                Ordering::Acquire,
            );

            if attempts < self.max_retry {
                attempts += 1;
                continue;
            }
            self.reset_locked();
        }
    }

    #[cold]
    #[inline(never)]
    fn reset_locked(&self) {
        let _guard = self.reset_lock.lock();
        if self.value.load(Ordering::Acquire) >= self.threshold {
            self.value.store(0, Ordering::Release);
            debug!(threshold = self.threshold, "recyclable counter reset under lock");
        }
    }

    #[cfg(test)]
    pub(crate) fn set_raw(&self, value: u64) {
        self.value.store(value, Ordering::Release);
    }
}
