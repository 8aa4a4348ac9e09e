use thiserror::Error;

/// Construction-time failures. Runtime paths never produce these: re-entrant
/// explode/contract requests are ignored and missing devices degrade silently.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("tier {index}: {reason}")]
    InvalidTier { index: usize, reason: &'static str },

    #[error("melody must contain at least one note")]
    EmptyMelody,

    #[error("note {index}: frequency {frequency_hz} Hz / duration {duration_sec} s must both be positive")]
    InvalidNote {
        index: usize,
        frequency_hz: f32,
        duration_sec: f32,
    },

    #[error("hand landmarks: expected {expected} values, got {actual}")]
    InvalidLandmarks { expected: usize, actual: usize },

    #[error("hand landmarks contain a non-finite coordinate at point {0}")]
    NonFiniteLandmark(usize),

    #[error("unknown status signal {0:?}")]
    UnknownStatus(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
