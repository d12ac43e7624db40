use padlock_hardware::HardwareError;
use padlock_protocol::ProtocolError;
use padlock_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the firmware components.
#[derive(Debug, Error)]
pub enum FirmwareError {
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The status link refused a notification.
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FirmwareError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FirmwareError>;
