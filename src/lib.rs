//! # FlakeId
//!
//! Snowflake-style 64-bit identifiers for processes that share no allocator.
//!
//! Each id packs, below the sign bit:
//! - a tick count since a configured start epoch, in a configurable unit
//! - a tenant id
//! - a node id, configured or resolved from a local IPv4 address
//! - a sequence disambiguating ids within one tick
//!
//! ```
//! use flakeid::{FlakeId, FlakeIdConfig};
//!
//! let config = FlakeIdConfig::builder()
//!     .start_time_str("2024-01-01T00:00:00")?
//!     .tenant_id(2)
//!     .node_id(17)
//!     .build()?;
//! let generator = FlakeId::with_config(config)?;
//!
//! let id = generator.generate();
//! let parts = generator.codec().decompose(id);
//! assert_eq!((parts.tenant, parts.node), (2, 17));
//! # Ok::<(), flakeid::FlakeIdError>(())
//! ```

#![forbid(unsafe_code)]

mod clock;
mod codec;
mod config;
mod error;
mod generator;
mod layout;
mod node;
mod sequence;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use clock::{Clock, ClockSource, SystemClock};
pub use codec::{IdCodec, IdParts};
pub use config::{
    default_start_time, BitWidths, FlakeIdConfig, FlakeIdConfigBuilder, SequenceStrategy,
    TimeUnit,
};
pub use error::FlakeIdError;
pub use generator::FlakeId;
pub use layout::{BitLayout, USABLE_BITS};
pub use node::{
    parse_ipv4, select_ipv4, AddressResolver, NodeIdentity, NodeSource, StaticAddressResolver,
    SystemAddressResolver,
};
pub use sequence::{
    BoundedTickCache, CacheStats, RecyclableCounter, Sequencer, TickCache, TickSequencer,
};
