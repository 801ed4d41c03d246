// File: src/error.rs
use std::path::PathBuf;

/// Result type used throughout the decoder.
pub type Result<T, E = DecoderError> = std::result::Result<T, E>;

/// Everything the engine can fail with. The adapter layer passes these
/// through untouched.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("failed to read or write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{}:{line}: {message}", path.display())]
    InvalidFormat {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("engine is not initialised; call init_moses first")]
    NotInitialized,

    #[error("engine is already initialised")]
    AlreadyInitialized,

    #[error("expected {expected} feature weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },

    #[error("weight for {feature} is not finite: {value}")]
    NonFiniteWeight { feature: String, value: f32 },

    #[error("source sentence is empty")]
    EmptySource,

    #[error("search produced no complete hypothesis")]
    NoTranslation,

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] bincode::Error),
}

impl DecoderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
