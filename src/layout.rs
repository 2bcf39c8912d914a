//! Bit layout of a FlakeId
//!
//! ```text
//! | sign | time | tenant | node | sequence |
//!    63   ...                          0
//! ```
//!
//! The sign bit is never assigned to a field. Bits between the top of the
//! time field and the sign bit stay zero until the tick delta outgrows its
//! width.

use crate::config::BitWidths;
use crate::error::FlakeIdError;

/// Highest number of bits the four fields may occupy together
pub const USABLE_BITS: u32 = 63;

/// Masks and shift offsets derived from [`BitWidths`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLayout {
    widths: BitWidths,
    max_time: u64,
    max_tenant: u64,
    max_node: u64,
    max_sequence: u64,
    shift_node: u8,
    shift_tenant: u8,
    shift_time: u8,
}

impl BitLayout {
    /// Validate the widths and derive masks and shifts
    pub fn new(widths: BitWidths) -> Result<Self, FlakeIdError> {
        let total = widths.total();
        if total > USABLE_BITS {
            return Err(FlakeIdError::InvalidBitWidths {
                time: widths.time,
                tenant: widths.tenant,
                node: widths.node,
                sequence: widths.sequence,
                total,
            });
        }

        let shift_node = widths.sequence;
        let shift_tenant = shift_node + widths.node;
        let shift_time = shift_tenant + widths.tenant;

        Ok(Self {
            widths,
            max_time: Self::calculate_mask(widths.time),
            max_tenant: Self::calculate_mask(widths.tenant),
            max_node: Self::calculate_mask(widths.node),
            max_sequence: Self::calculate_mask(widths.sequence),
            shift_node,
            shift_tenant,
            shift_time,
        })
    }

    /// Calculate mask for given number of bits; zero bits give a zero mask
    #[inline]
    pub(crate) const fn calculate_mask(bits: u8) -> u64 {
        (1u64 << bits) - 1
    }

    #[inline(always)]
    pub const fn widths(&self) -> BitWidths {
        self.widths
    }

    #[inline(always)]
    pub const fn max_time(&self) -> u64 {
        self.max_time
    }

    #[inline(always)]
    pub const fn max_tenant(&self) -> u64 {
        self.max_tenant
    }

    #[inline(always)]
    pub const fn max_node(&self) -> u64 {
        self.max_node
    }

    #[inline(always)]
    pub const fn max_sequence(&self) -> u64 {
        self.max_sequence
    }

    /// The sequence field always starts at bit 0
    #[inline(always)]
    pub const fn shift_sequence(&self) -> u8 {
        0
    }

    #[inline(always)]
    pub const fn shift_node(&self) -> u8 {
        self.shift_node
    }

    #[inline(always)]
    pub const fn shift_tenant(&self) -> u8 {
        self.shift_tenant
    }

    #[inline(always)]
    pub const fn shift_time(&self) -> u8 {
        self.shift_time
    }
}
