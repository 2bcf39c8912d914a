//! Bounded, age-expiring map from tick to counter

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::trace;

/// Storage for per-tick counters
///
/// `get_or_create` must hand every concurrent caller asking for the same live
/// tick the same counter, creating it at most once.
pub trait TickCache: Send + Sync {
    /// Counter for `tick`, created at zero on first use
    fn get_or_create(&self, tick: i64) -> Arc<AtomicU64>;

    /// Usage statistics, if the cache records them
    fn stats(&self) -> Option<CacheStats> {
        None
    }
}

/// Snapshot of cache usage counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups served by an existing counter; 1.0 when idle
    pub fn hit_rate(&self) -> f64 {
        match self.requests() {
            0 => 1.0,
            n => self.hits as f64 / n as f64,
        }
    }
}

#[derive(Debug, Default)]
struct StatsCounter {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounter {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
struct Slot {
    counter: Arc<AtomicU64>,
    created: Instant,
}

impl Slot {
    #[inline(always)]
    fn is_live(&self, now: Instant, max_age: Duration) -> bool {
        now.saturating_duration_since(self.created) < max_age
    }
}

/// [`TickCache`] over an ordered map behind a read-write lock
///
/// Lookups of live ticks share the read lock. Only the first caller for a new
/// tick takes the write lock, during which expired ticks are dropped from the
/// front and the oldest ticks are evicted down to capacity.
#[derive(Debug)]
pub struct BoundedTickCache {
    slots: RwLock<BTreeMap<i64, Slot>>,
    capacity: usize,
    max_age: Duration,
    stats: Option<StatsCounter>,
}

impl BoundedTickCache {
    pub fn new(capacity: usize, max_age: Duration, record_stats: bool) -> Self {
        Self {
            slots: RwLock::new(BTreeMap::new()),
            capacity: capacity.max(1),
            max_age,
            stats: record_stats.then(StatsCounter::default),
        }
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Number of ticks currently held
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    #[inline(always)]
    fn record(&self, pick: impl FnOnce(&StatsCounter) -> &AtomicU64) {
        if let Some(stats) = &self.stats {
            pick(stats).fetch_add(1, Ordering::Relaxed);
        }
    }

    fn evict(&self, slots: &mut BTreeMap<i64, Slot>, now: Instant) {
        while let Some(entry) = slots.first_entry() {
            if entry.get().is_live(now, self.max_age) {
                break;
            }
            let tick = *entry.key();
            entry.remove();
            self.record(|s| &s.evictions);
            trace!(tick, "evicted expired tick counter");
        }
        while slots.len() >= self.capacity {
            if let Some((tick, _)) = slots.pop_first() {
                self.record(|s| &s.evictions);
                trace!(tick, "evicted tick counter over capacity");
            }
        }
    }
}

impl TickCache for BoundedTickCache {
    fn get_or_create(&self, tick: i64) -> Arc<AtomicU64> {
        let now = Instant::now();
        if let Some(slot) = self.slots.read().get(&tick) {
            if slot.is_live(now, self.max_age) {
                self.record(|s| &s.hits);
                return Arc::clone(&slot.counter);
            }
        }

        let mut slots = self.slots.write();
        // Another caller may have created it while we waited for the lock.
        if let Some(slot) = slots.get(&tick) {
            if slot.is_live(now, self.max_age) {
                self.record(|s| &s.hits);
                return Arc::clone(&slot.counter);
            }
            slots.remove(&tick);
            self.record(|s| &s.evictions);
        }

        self.record(|s| &s.misses);
        self.evict(&mut slots, now);
        let counter = Arc::new(AtomicU64::new(0));
        slots.insert(
            tick,
            Slot {
                counter: Arc::clone(&counter),
                created: now,
            },
        );
        counter
    }

    fn stats(&self) -> Option<CacheStats> {
        self.stats.as_ref().map(StatsCounter::snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    const LONG: Duration = Duration::from_secs(60);

    #[test]
    fn test_same_tick_same_counter() {
        let cache = BoundedTickCache::new(16, LONG, false);
        let a = cache.get_or_create(7);
        let b = cache.get_or_create(7);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &cache.get_or_create(8)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest_tick() {
        let cache = BoundedTickCache::new(3, LONG, true);
        let first = cache.get_or_create(1);
        cache.get_or_create(2);
        cache.get_or_create(3);
        cache.get_or_create(4);
        assert_eq!(cache.len(), 3);

        let again = cache.get_or_create(1);
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(cache.stats().unwrap().evictions, 2);
    }

    #[test]
    fn test_expired_tick_is_recreated() {
        let cache = BoundedTickCache::new(16, Duration::ZERO, false);
        let a = cache.get_or_create(1);
        a.fetch_add(5, Ordering::AcqRel);
        let b = cache.get_or_create(1);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.load(Ordering::Acquire), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats_disabled_by_default() {
        let cache = BoundedTickCache::new(16, LONG, false);
        cache.get_or_create(1);
        assert_eq!(cache.stats(), None);
    }

    #[test]
    fn test_stats_hits_and_misses() {
        let cache = BoundedTickCache::new(16, LONG, true);
        cache.get_or_create(1);
        cache.get_or_create(1);
        cache.get_or_create(1);
        cache.get_or_create(2);
        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.requests(), 4);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_capacity_holds_one_tick() {
        let cache = BoundedTickCache::new(0, LONG, false);
        assert_eq!(cache.capacity(), 1);
        cache.get_or_create(1);
        cache.get_or_create(2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_first_access_creates_once() {
        let cache = Arc::new(BoundedTickCache::new(16, LONG, true));
        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_create(42)
                })
            })
            .collect();

        let counters: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();
        assert!(counters.iter().all(|c| Arc::ptr_eq(c, &counters[0])));
        assert_eq!(cache.stats().unwrap().misses, 1);
    }
}
