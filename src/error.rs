use thiserror::Error;

/// Represents errors that can occur during FlakeId operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlakeIdError {
    /// Error when the configured bit widths do not fit below the sign bit
    #[error(
        "Bit widths {time}+{tenant}+{node}+{sequence} = {total} exceed the 63 usable bits"
    )]
    InvalidBitWidths {
        time: u8,
        tenant: u8,
        node: u8,
        sequence: u8,
        total: u32,
    },
    /// Error when the start time literal is not a local date-time
    #[error("Start time {input:?} is not a valid local date-time")]
    InvalidStartTime { input: String },
    /// Error when a time unit name is not recognised
    #[error("Unknown time unit {input:?}")]
    UnknownTimeUnit { input: String },
    /// Error when the clock reads earlier than the configured start time
    #[error("Clock is {delta} ticks before the configured start time")]
    ClockBeforeStart { delta: i64 },
    /// Error when the tick delta no longer fits in the time field
    #[error("Tick delta {delta} does not fit in the {bits}-bit time field")]
    TimeFieldOverflow { delta: i64, bits: u8 },
    /// Error when a decoded tick cannot be expressed as a calendar instant
    #[error("Tick {tick} is outside the representable calendar range")]
    TimestampOutOfRange { tick: i64 },
}
