//! Sequence allocation
//!
//! - `recyclable` - One shared counter wrapping at the sequence maximum
//! - `tick_cache` - Per-tick counters held in a bounded cache

mod recyclable;
mod tick_cache;

use std::sync::atomic::Ordering;

use tracing::debug;

pub use recyclable::RecyclableCounter;
pub use tick_cache::{BoundedTickCache, CacheStats, TickCache};

use crate::config::SequenceStrategy;

/// Counter per tick, backed by a [`TickCache`]
///
/// Values are unique within a tick up to `max_sequence + 1` allocations;
/// past that they keep counting and wrap through the encode mask.
pub struct TickSequencer {
    cache: Box<dyn TickCache>,
    max_sequence: u64,
}

impl TickSequencer {
    pub fn new(cache: Box<dyn TickCache>, max_sequence: u64) -> Self {
        Self {
            cache,
            max_sequence,
        }
    }

    #[inline]
    pub fn next(&self, tick: i64) -> u64 {
        let previous = self.cache.get_or_create(tick).fetch_add(1, Ordering::AcqRel);
        if previous == self.max_sequence.wrapping_add(1) {
            debug!(tick, max_sequence = self.max_sequence, "sequence exhausted for tick, wrapping");
        }
        previous
    }

    pub fn stats(&self) -> Option<CacheStats> {
        self.cache.stats()
    }
}

impl std::fmt::Debug for TickSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickSequencer")
            .field("max_sequence", &self.max_sequence)
            .field("stats", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

/// The sequence strategy a generator runs with
#[derive(Debug)]
pub enum Sequencer {
    Recyclable(RecyclableCounter),
    PerTick(TickSequencer),
}

impl Sequencer {
    /// Build the strategy's default state for a sequence maximum
    pub fn from_strategy(strategy: SequenceStrategy, max_sequence: u64) -> Self {
        match strategy {
            SequenceStrategy::Recyclable { max_retry } => {
                Sequencer::Recyclable(RecyclableCounter::new(max_sequence, max_retry))
            }
            SequenceStrategy::PerTick {
                capacity,
                max_age,
                record_stats,
            } => Sequencer::PerTick(TickSequencer::new(
                Box::new(BoundedTickCache::new(capacity, max_age, record_stats)),
                max_sequence,
            )),
        }
    }

    /// Raw sequence for `tick`; the recyclable counter ignores the tick
    #[inline]
    pub fn next(&self, tick: i64) -> u64 {
        match self {
            Sequencer::Recyclable(counter) => counter.next(),
            Sequencer::PerTick(sequencer) => sequencer.next(tick),
        }
    }

    pub fn stats(&self) -> Option<CacheStats> {
        match self {
            Sequencer::Recyclable(_) => None,
            Sequencer::PerTick(sequencer) => sequencer.stats(),
        }
    }
}
