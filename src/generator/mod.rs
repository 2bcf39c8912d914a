//! Core FlakeId generator implementation
//!
//! Split into modules for testability:
//! - `generate` - ID generation entry points and overflow checks

mod generate;

use std::sync::atomic::AtomicBool;

use tracing::info;

use crate::clock::{Clock, ClockSource, SystemClock};
use crate::codec::IdCodec;
use crate::config::FlakeIdConfig;
use crate::error::FlakeIdError;
use crate::layout::BitLayout;
use crate::node::{AddressResolver, NodeIdentity, NodeSource, SystemAddressResolver};
use crate::sequence::{CacheStats, Sequencer, TickCache, TickSequencer};

/// Main ID generator
///
/// Safe to share between threads; the only mutable state is the sequence.
#[derive(Debug)]
pub struct FlakeId<C: Clock = SystemClock> {
    // === Hot path fields ===
    sequencer: Sequencer,
    codec: IdCodec,
    tenant_id: u64,
    node_id: u64,
    clock: C,
    overflow_reported: AtomicBool,

    // === Cold path fields ===
    node_source: NodeSource,
    config: FlakeIdConfig,
}

impl FlakeId<SystemClock> {
    /// Create with default configuration
    pub fn new() -> Result<Self, FlakeIdError> {
        Self::with_config(FlakeIdConfig::default())
    }

    /// Create with custom configuration, the system clock and the system
    /// address resolver
    pub fn with_config(config: FlakeIdConfig) -> Result<Self, FlakeIdError> {
        Self::with_parts(config, SystemClock::new(), &SystemAddressResolver)
    }
}

impl<C: Clock> FlakeId<C> {
    /// Create from configuration and explicit collaborators
    pub fn with_parts(
        config: FlakeIdConfig,
        clock: C,
        resolver: &dyn AddressResolver,
    ) -> Result<Self, FlakeIdError> {
        let layout = BitLayout::new(config.widths())?;
        let sequencer = Sequencer::from_strategy(config.strategy(), layout.max_sequence());
        Ok(Self::build(config, layout, clock, resolver, sequencer))
    }

    /// Create with per-tick sequences held in a caller-supplied cache,
    /// whatever strategy the configuration names
    pub fn with_tick_cache(
        config: FlakeIdConfig,
        clock: C,
        resolver: &dyn AddressResolver,
        cache: Box<dyn TickCache>,
    ) -> Result<Self, FlakeIdError> {
        let layout = BitLayout::new(config.widths())?;
        let sequencer = Sequencer::PerTick(TickSequencer::new(cache, layout.max_sequence()));
        Ok(Self::build(config, layout, clock, resolver, sequencer))
    }

    fn build(
        config: FlakeIdConfig,
        layout: BitLayout,
        clock: C,
        resolver: &dyn AddressResolver,
        sequencer: Sequencer,
    ) -> Self {
        let identity =
            NodeIdentity::resolve(config.tenant_id(), config.node_id(), &layout, resolver);
        let source = ClockSource::new(config.start_time(), config.time_unit(), clock.offset());

        info!(
            tenant_id = identity.tenant_id(),
            node_id = identity.node_id(),
            node_source = %identity.source(),
            unit = %config.time_unit(),
            strategy = config.strategy().name(),
            "flake id generator ready"
        );

        Self {
            sequencer,
            codec: IdCodec::new(layout, source),
            tenant_id: identity.tenant_id(),
            node_id: identity.node_id(),
            clock,
            overflow_reported: AtomicBool::new(false),
            node_source: identity.source().clone(),
            config,
        }
    }

    /// Masked tenant id embedded in every id
    #[inline(always)]
    pub const fn tenant_id(&self) -> u64 {
        self.tenant_id
    }

    /// Masked node id embedded in every id, resolved once at construction
    #[inline(always)]
    pub const fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn node_source(&self) -> &NodeSource {
        &self.node_source
    }

    #[inline(always)]
    pub const fn codec(&self) -> &IdCodec {
        &self.codec
    }

    #[inline(always)]
    pub const fn layout(&self) -> &BitLayout {
        self.codec.layout()
    }

    #[inline(always)]
    pub const fn clock_source(&self) -> &ClockSource {
        self.codec.clock()
    }

    pub fn config(&self) -> &FlakeIdConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Per-tick cache statistics, when the strategy records them
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.sequencer.stats()
    }
}
