use thiserror::Error;

/// Errors raised at the wireless transport boundary.
///
/// A well-sized frame that fails to decode is not an error: the decoder
/// returns `None` and the frame is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Command frame must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Command frame write must start at offset 0, got {offset}")]
    InvalidOffset { offset: usize },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
