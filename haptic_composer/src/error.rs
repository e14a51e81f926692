use thiserror::Error;

/// Raised when an [`Event`](crate::Event) or [`HapticPattern`](crate::HapticPattern) is constructed with values
/// outside of their allowed ranges
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("a pattern needs at least one event")]
    EmptyPattern,
    #[error("intensity must be in range of 0.0 to 1.0, got {0}")]
    IntensityOutOfRange(f32),
    #[error("sharpness must be in range of 0.0 to 1.0, got {0}")]
    SharpnessOutOfRange(f32),
    #[error("event duration must be between 1 and {max} ms, got {0}", max = u32::MAX)]
    InvalidDuration(i64),
    #[error("repeat count must be a positive number, got {0}")]
    InvalidRepeat(i64),
    #[error("initial delay must be between 0 and {max} ms, got {0}", max = u32::MAX)]
    InvalidDelay(i64),
}

/// Raised when a serialized pattern record can not be turned back into a [`HapticPattern`](crate::HapticPattern)
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("malformed pattern record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("event at index {index} is invalid: {source}")]
    InvalidEvent {
        index: usize,
        source: ValidationError,
    },
    #[error("pattern record is invalid: {0}")]
    InvalidPattern(#[from] ValidationError),
    #[error("unknown repeat value `{0}`, expected a positive count or \"infinite\"")]
    UnknownRepeat(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("playback did not finish within {limit_ms} ms")]
    Timeout { limit_ms: u64 },
    #[error("the player was disposed and can not be used anymore")]
    Disposed,
}
