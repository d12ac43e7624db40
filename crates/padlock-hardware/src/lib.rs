//! Board abstraction layer for the padlock firmware.
//!
//! This crate defines the traits the firmware uses to reach the board, the
//! two leaf components built directly on them, and mock implementations for
//! tests and the host emulator.
//!
//! # Board Traits
//!
//! - [`DriveLines`]: the two motor drive lines, set atomically as one [`Drive`] value
//! - [`SensorInputs`]: the raw input mask and the battery ADC
//! - [`IndicatorPins`]: the four status lights
//! - [`ButtonSource`]: debounced keypad press edges (async)
//!
//! # Components
//!
//! - [`LockActuator`]: tick-counted drive pulses with break-before-make
//! - [`StatusIndicator`]: lights with tick-counted flashes
//!
//! ```
//! use padlock_core::Indicator;
//! use padlock_hardware::{LockActuator, StatusIndicator, mock::MockBoard};
//!
//! let (board, handle) = MockBoard::new();
//! let mut actuator = LockActuator::new(board.clone(), board.clone(), 50);
//! let mut lights = StatusIndicator::new(board);
//!
//! actuator.open().unwrap();
//! lights.flash(Indicator::Success, 50).unwrap();
//! assert_eq!(handle.open_count(), 1);
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with [`HardwareError`].
//!
//! [`DriveLines`]: traits::DriveLines
//! [`SensorInputs`]: traits::SensorInputs
//! [`IndicatorPins`]: traits::IndicatorPins
//! [`ButtonSource`]: traits::ButtonSource
//! [`Drive`]: traits::Drive

pub mod actuator;
pub mod error;
pub mod indicator;
pub mod mock;
pub mod traits;

// Re-export commonly used types for convenience
pub use actuator::LockActuator;
pub use error::{HardwareError, Result};
pub use indicator::StatusIndicator;
pub use traits::{ButtonSource, Drive, DriveLines, IndicatorPins, SensorInputs};
