//! Configuration for FlakeId generator

mod builder;
mod unit;

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub use builder::FlakeIdConfigBuilder;
pub use unit::TimeUnit;
pub(crate) use unit::NANOS_PER_SECOND;

/// Default start time, interpreted in the local offset: 2025-07-19T00:00:00
pub fn default_start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 19)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Widths of the four id fields, most significant first
///
/// A width of zero is legal and pins that field to the constant 0. The sum
/// must stay at or below 63 so the sign bit is never part of the layout;
/// this is checked when a [`crate::BitLayout`] is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitWidths {
    pub time: u8,
    pub tenant: u8,
    pub node: u8,
    pub sequence: u8,
}

impl BitWidths {
    /// 40 bits of milliseconds (about 34 years), 7 tenants, 255 nodes, 4095 ids per tick
    pub const MILLIS_DEFAULT: BitWidths = BitWidths::new(40, 3, 8, 12);
    /// 31 bits of seconds (about 68 years), 7 tenants, 255 nodes, 2,097,151 ids per tick
    pub const SECONDS_DEFAULT: BitWidths = BitWidths::new(31, 3, 8, 21);

    pub const fn new(time: u8, tenant: u8, node: u8, sequence: u8) -> Self {
        Self {
            time,
            tenant,
            node,
            sequence,
        }
    }

    /// Recommended widths for a time unit
    pub const fn for_unit(unit: TimeUnit) -> Self {
        if unit.is_coarse() {
            Self::SECONDS_DEFAULT
        } else {
            Self::MILLIS_DEFAULT
        }
    }

    #[inline(always)]
    pub const fn total(&self) -> u32 {
        self.time as u32 + self.tenant as u32 + self.node as u32 + self.sequence as u32
    }
}

impl Default for BitWidths {
    fn default() -> Self {
        Self::MILLIS_DEFAULT
    }
}

/// How the low-order sequence bits are allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStrategy {
    /// One process-wide counter that wraps to zero past the sequence maximum
    Recyclable {
        /// Lock-free attempts before falling back to a locked reset
        max_retry: u32,
    },
    /// A bounded, age-expiring map from tick to counter
    PerTick {
        capacity: usize,
        max_age: Duration,
        record_stats: bool,
    },
}

impl SequenceStrategy {
    pub const DEFAULT_MAX_RETRY: u32 = 1000;
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub const fn recyclable() -> Self {
        SequenceStrategy::Recyclable {
            max_retry: Self::DEFAULT_MAX_RETRY,
        }
    }

    /// Per-tick strategy with defaults derived from the tick length
    pub fn per_tick(unit: TimeUnit) -> Self {
        SequenceStrategy::PerTick {
            capacity: Self::DEFAULT_CAPACITY,
            max_age: Self::default_max_age(unit),
            record_stats: false,
        }
    }

    /// Two tick durations, never shorter than one second
    pub fn default_max_age(unit: TimeUnit) -> Duration {
        (unit.duration() * 2).max(Duration::from_secs(1))
    }

    pub const fn name(&self) -> &'static str {
        match self {
            SequenceStrategy::Recyclable { .. } => "recyclable",
            SequenceStrategy::PerTick { .. } => "per-tick",
        }
    }
}

impl Default for SequenceStrategy {
    fn default() -> Self {
        Self::recyclable()
    }
}

/// Configuration for FlakeId generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlakeIdConfig {
    start_time: NaiveDateTime,
    time_unit: TimeUnit,
    widths: BitWidths,
    tenant_id: u64,
    node_id: Option<u64>,
    strategy: SequenceStrategy,
}

impl FlakeIdConfig {
    /// Create a new configuration builder
    pub fn builder() -> FlakeIdConfigBuilder {
        FlakeIdConfigBuilder::new()
    }

    /// Start epoch as a local calendar date-time
    #[inline(always)]
    pub const fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    #[inline(always)]
    pub const fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    #[inline(always)]
    pub const fn widths(&self) -> BitWidths {
        self.widths
    }

    /// Tenant id as configured, before masking
    #[inline(always)]
    pub const fn tenant_id(&self) -> u64 {
        self.tenant_id
    }

    /// Node id as configured, before masking; `None` means auto-resolve
    #[inline(always)]
    pub const fn node_id(&self) -> Option<u64> {
        self.node_id
    }

    #[inline(always)]
    pub const fn strategy(&self) -> SequenceStrategy {
        self.strategy
    }
}

impl Default for FlakeIdConfig {
    fn default() -> Self {
        let time_unit = TimeUnit::default();
        Self {
            start_time: default_start_time(),
            time_unit,
            widths: BitWidths::for_unit(time_unit),
            tenant_id: 0,
            node_id: None,
            strategy: SequenceStrategy::default(),
        }
    }
}
