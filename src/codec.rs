use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::clock::ClockSource;
use crate::error::FlakeIdError;
use crate::layout::BitLayout;

/// Fields of a decoded FlakeId
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdParts {
    /// Ticks since the start epoch
    pub tick_delta: i64,
    pub tenant: u64,
    pub node: u64,
    pub sequence: u64,
}

/// Packs fields into a FlakeId and reads them back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCodec {
    layout: BitLayout,
    clock: ClockSource,
}

impl IdCodec {
    pub(crate) fn new(layout: BitLayout, clock: ClockSource) -> Self {
        Self { layout, clock }
    }

    #[inline(always)]
    pub const fn layout(&self) -> &BitLayout {
        &self.layout
    }

    #[inline(always)]
    pub const fn clock(&self) -> &ClockSource {
        &self.clock
    }

    /// Pack the four fields into an id
    ///
    /// Tenant, node and sequence are masked to their widths. The tick delta
    /// is not: a negative delta or one wider than the time field spills into
    /// the sign bit and the id stops sorting correctly.
    #[inline(always)]
    pub fn encode(&self, tick_delta: i64, tenant: u64, node: u64, sequence: u64) -> i64 {
        let layout = &self.layout;
        (((tick_delta as u64) << layout.shift_time())
            | ((tenant & layout.max_tenant()) << layout.shift_tenant())
            | ((node & layout.max_node()) << layout.shift_node())
            | (sequence & layout.max_sequence())) as i64
    }

    /// Ticks since the start epoch, read with a logical shift
    #[inline(always)]
    pub fn tick_delta(&self, id: i64) -> i64 {
        ((id as u64) >> self.layout.shift_time()) as i64
    }

    /// Absolute tick since the Unix epoch
    #[inline(always)]
    pub fn tick(&self, id: i64) -> i64 {
        self.clock.start_tick().wrapping_add(self.tick_delta(id))
    }

    #[inline(always)]
    pub fn tenant(&self, id: i64) -> u64 {
        ((id as u64) >> self.layout.shift_tenant()) & self.layout.max_tenant()
    }

    #[inline(always)]
    pub fn node(&self, id: i64) -> u64 {
        ((id as u64) >> self.layout.shift_node()) & self.layout.max_node()
    }

    #[inline(always)]
    pub fn sequence(&self, id: i64) -> u64 {
        (id as u64) & self.layout.max_sequence()
    }

    /// Decompose an id into all of its fields
    #[inline]
    pub fn decompose(&self, id: i64) -> IdParts {
        IdParts {
            tick_delta: self.tick_delta(id),
            tenant: self.tenant(id),
            node: self.node(id),
            sequence: self.sequence(id),
        }
    }

    /// Unix timestamp in milliseconds the id was generated at
    #[inline]
    pub fn timestamp_millis(&self, id: i64) -> i64 {
        self.clock.tick_to_millis(self.tick(id))
    }

    /// Generation time in the offset captured by the generator
    pub fn timestamp(&self, id: i64) -> Result<DateTime<FixedOffset>, FlakeIdError> {
        self.clock.tick_to_datetime(self.tick(id))
    }

    /// Generation time as a local date-time in the captured offset
    pub fn timestamp_local(&self, id: i64) -> Result<NaiveDateTime, FlakeIdError> {
        self.clock.tick_to_local(self.tick(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BitWidths, TimeUnit};
    use chrono::NaiveDate;

    fn codec(widths: BitWidths, unit: TimeUnit) -> IdCodec {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let offset = FixedOffset::east_opt(0).unwrap();
        IdCodec::new(
            BitLayout::new(widths).unwrap(),
            ClockSource::new(start, unit, offset),
        )
    }

    #[test]
    fn test_decompose() {
        let codec = codec(BitWidths::MILLIS_DEFAULT, TimeUnit::Milliseconds);
        let id = codec.encode(0x1234567, 5, 42, 123);

        assert_eq!(codec.tick_delta(id), 0x1234567);
        assert_eq!(codec.tenant(id), 5);
        assert_eq!(codec.node(id), 42);
        assert_eq!(codec.sequence(id), 123);
        assert_eq!(
            codec.decompose(id),
            IdParts {
                tick_delta: 0x1234567,
                tenant: 5,
                node: 42,
                sequence: 123,
            }
        );
    }

    #[test]
    fn test_component_boundaries() {
        let widths = BitWidths::new(41, 4, 8, 10);
        let codec = codec(widths, TimeUnit::Milliseconds);
        let layout = *codec.layout();
        let max_delta = layout.max_time() as i64;
        let id = codec.encode(
            max_delta,
            layout.max_tenant(),
            layout.max_node(),
            layout.max_sequence(),
        );

        assert_eq!(id, i64::MAX);
        assert_eq!(codec.decompose(id).tick_delta, max_delta);
        assert_eq!(codec.tenant(id), 15);
        assert_eq!(codec.node(id), 255);
        assert_eq!(codec.sequence(id), 1023);
    }

    #[test]
    fn test_bit_structure() {
        let codec = codec(BitWidths::MILLIS_DEFAULT, TimeUnit::Milliseconds);
        let id = codec.encode(1, 1, 1, 1);
        assert_eq!(id, (1 << 23) | (1 << 20) | (1 << 12) | 1);
    }

    #[test]
    fn test_sequence_masked_on_encode() {
        let codec = codec(BitWidths::MILLIS_DEFAULT, TimeUnit::Milliseconds);
        let id = codec.encode(10, 0, 0, 4096 + 7);
        assert_eq!(codec.sequence(id), 7);
        assert_eq!(codec.tick_delta(id), 10);
    }

    #[test]
    fn test_fields_do_not_bleed() {
        let codec = codec(BitWidths::MILLIS_DEFAULT, TimeUnit::Milliseconds);
        let id = codec.encode(3, 0xFF, 0x1FF, 0);
        assert_eq!(codec.tenant(id), 7);
        assert_eq!(codec.node(id), 0xFF);
        assert_eq!(codec.tick_delta(id), 3);
    }

    #[test]
    fn test_negative_delta_is_logical_on_decode() {
        let codec = codec(BitWidths::MILLIS_DEFAULT, TimeUnit::Milliseconds);
        let id = codec.encode(-1, 0, 0, 0);
        assert!(id < 0);
        // Sign bits are not extended on decode.
        assert_eq!(codec.tick_delta(id), ((u64::MAX << 23) >> 23) as i64);
    }

    #[test]
    fn test_timestamp_millis() {
        let codec = codec(BitWidths::MILLIS_DEFAULT, TimeUnit::Milliseconds);
        let id = codec.encode(1_500, 0, 0, 0);
        assert_eq!(codec.timestamp_millis(id), 1_704_067_201_500);
        assert_eq!(
            codec.timestamp_local(id).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_milli_opt(0, 0, 1, 500)
                .unwrap()
        );
    }

    #[test]
    fn test_timestamp_seconds_unit() {
        let codec = codec(BitWidths::SECONDS_DEFAULT, TimeUnit::Seconds);
        let id = codec.encode(86_400, 1, 2, 3);
        assert_eq!(codec.timestamp_millis(id), 1_704_153_600_000);
        assert_eq!(codec.timestamp(id).unwrap().timestamp(), 1_704_153_600);
    }

    #[test]
    fn test_zero_width_fields_decode_to_zero() {
        let codec = codec(BitWidths::new(40, 0, 0, 12), TimeUnit::Milliseconds);
        let id = codec.encode(77, 3, 9, 5);
        assert_eq!(codec.tenant(id), 0);
        assert_eq!(codec.node(id), 0);
        assert_eq!(codec.tick_delta(id), 77);
        assert_eq!(codec.sequence(id), 5);
    }
}
