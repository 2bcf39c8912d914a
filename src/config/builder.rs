//! FlakeIdConfig builder for constructing configuration

use std::time::Duration;

use chrono::NaiveDateTime;

use super::{default_start_time, BitWidths, FlakeIdConfig, SequenceStrategy, TimeUnit};
use crate::error::FlakeIdError;
use crate::layout::BitLayout;

/// Builder for FlakeIdConfig
#[derive(Debug, Clone)]
pub struct FlakeIdConfigBuilder {
    start_time: NaiveDateTime,
    time_unit: TimeUnit,
    widths: Option<BitWidths>,
    tenant_id: u64,
    node_id: Option<u64>,
    max_retry: u32,
    per_tick_capacity: Option<usize>,
    max_age: Option<Duration>,
    record_stats: bool,
}

impl FlakeIdConfigBuilder {
    /// Create a new FlakeIdConfigBuilder with default values
    pub fn new() -> Self {
        Self {
            start_time: default_start_time(),
            time_unit: TimeUnit::default(),
            widths: None,
            tenant_id: 0,
            node_id: None,
            max_retry: SequenceStrategy::DEFAULT_MAX_RETRY,
            per_tick_capacity: None,
            max_age: None,
            record_stats: false,
        }
    }

    /// Set the start epoch as a local date-time
    pub const fn start_time(mut self, start_time: NaiveDateTime) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set the start epoch from an ISO local date-time literal such as
    /// `2025-07-19T00:00:00`
    pub fn start_time_str(mut self, literal: &str) -> Result<Self, FlakeIdError> {
        self.start_time =
            literal
                .trim()
                .parse()
                .map_err(|_| FlakeIdError::InvalidStartTime {
                    input: literal.to_string(),
                })?;
        Ok(self)
    }

    pub const fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }

    /// Set the time unit by name, e.g. `MILLISECONDS` or `s`
    pub fn time_unit_str(mut self, name: &str) -> Result<Self, FlakeIdError> {
        self.time_unit = name.parse()?;
        Ok(self)
    }

    /// Set all four field widths. When never called, widths follow the time
    /// unit (see [`BitWidths::for_unit`])
    pub const fn bits(mut self, time: u8, tenant: u8, node: u8, sequence: u8) -> Self {
        self.widths = Some(BitWidths::new(time, tenant, node, sequence));
        self
    }

    pub const fn widths(mut self, widths: BitWidths) -> Self {
        self.widths = Some(widths);
        self
    }

    /// Tenant id; masked to the tenant width when the generator is built
    pub const fn tenant_id(mut self, tenant_id: u64) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    /// Fixed node id; masked to the node width when the generator is built
    pub const fn node_id(mut self, node_id: u64) -> Self {
        self.node_id = Some(node_id);
        self
    }

    /// Resolve the node id from a local address, or randomly
    pub const fn auto_node_id(mut self) -> Self {
        self.node_id = None;
        self
    }

    /// Use the recyclable counter with the given lock-free retry budget
    pub const fn recyclable(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self.per_tick_capacity = None;
        self
    }

    /// Use per-tick counters held in a cache of at most `capacity` ticks
    pub const fn per_tick(mut self, capacity: usize) -> Self {
        self.per_tick_capacity = Some(capacity);
        self
    }

    /// Maximum age of a per-tick counter before it is evicted
    pub const fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Record hit/miss/eviction counts for the per-tick cache
    pub const fn record_stats(mut self, enable: bool) -> Self {
        self.record_stats = enable;
        self
    }

    /// Build the final FlakeIdConfig
    pub fn build(self) -> Result<FlakeIdConfig, FlakeIdError> {
        let widths = self
            .widths
            .unwrap_or_else(|| BitWidths::for_unit(self.time_unit));
        BitLayout::new(widths)?;

        let strategy = match self.per_tick_capacity {
            Some(capacity) => SequenceStrategy::PerTick {
                capacity,
                max_age: self
                    .max_age
                    .unwrap_or_else(|| SequenceStrategy::default_max_age(self.time_unit)),
                record_stats: self.record_stats,
            },
            None => SequenceStrategy::Recyclable {
                max_retry: self.max_retry,
            },
        };

        Ok(FlakeIdConfig {
            start_time: self.start_time,
            time_unit: self.time_unit,
            widths,
            tenant_id: self.tenant_id,
            node_id: self.node_id,
            strategy,
        })
    }
}

impl Default for FlakeIdConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
