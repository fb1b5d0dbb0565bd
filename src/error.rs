use thiserror::Error;

/// Failure to turn raw audio into features.
///
/// Carries only text so callers never depend on decoder-specific error types.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("audio contains no samples")]
    Empty,
    #[error("audio stream has no sample rate")]
    NoSampleRate,
}

/// Caller misuse, rejected before any analysis runs.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("block length must be a positive finite number of seconds, got {0}")]
    InvalidBlockLength(f32),
    #[error("unsupported audio format '{0}' (expected one of: mp3, wav, m4a, flac, ogg)")]
    UnsupportedFormat(String),
}
