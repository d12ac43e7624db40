//! Error types for board I/O.
//!
//! Covers the failures a pin, ADC or keypad driver can report: a line that
//! stopped responding, a bus error, an argument outside the board's range.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Bus or pin communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Argument outside the range the board supports.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("keypad");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: keypad");
    }

    #[test]
    fn test_communication_error() {
        let error = HardwareError::communication("drive line stuck");
        assert!(matches!(error, HardwareError::CommunicationError { .. }));
        assert_eq!(error.to_string(), "Communication error: drive line stuck");
    }

    #[test]
    fn test_invalid_argument_error() {
        let error = HardwareError::invalid_argument("indicator index 7");
        assert!(matches!(error, HardwareError::InvalidArgument { .. }));
        assert_eq!(error.to_string(), "Invalid argument: indicator index 7");
    }
}
