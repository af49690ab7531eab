//! Device error types

use thiserror::Error;

/// Errors that can occur while talking to a haptic device
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Device is not open")]
    NotOpen,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed sample on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The sample source is exhausted (replay without looping)
    #[error("End of sample stream")]
    EndOfStream,

    #[error("Non-finite value in {field}")]
    NonFinite { field: &'static str },

    #[error("Internal error: {0}")]
    Internal(String),
}
