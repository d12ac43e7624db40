//! Board I/O trait definitions.
//!
//! Pin-level traits (`DriveLines`, `SensorInputs`, `IndicatorPins`) are
//! synchronous: a GPIO write or an ADC read completes within the tick that
//! issues it. The keypad is an event source and uses a native `async fn`
//! method (Edition 2024), like the other asynchronous producers.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use padlock_core::{Button, Indicator, InputSample};
use std::fmt;

/// Level applied to the two motor drive lines.
///
/// Both lines energized at once is not representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Drive {
    /// Both lines low.
    #[default]
    Released,
    /// Line A high, line B low: retracts the bolt.
    Open,
    /// Line A low, line B high: engages the bolt.
    Close,
}

impl Drive {
    /// Levels of (line A, line B).
    pub fn levels(self) -> (bool, bool) {
        match self {
            Drive::Released => (false, false),
            Drive::Open => (true, false),
            Drive::Close => (false, true),
        }
    }
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Drive::Released => write!(f, "Released"),
            Drive::Open => write!(f, "Open"),
            Drive::Close => write!(f, "Close"),
        }
    }
}

/// Motor driver output.
pub trait DriveLines: Send {
    /// Set both drive lines in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines could not be written.
    fn apply(&mut self, drive: Drive) -> Result<()>;
}

/// Digital inputs and the battery ADC.
pub trait SensorInputs: Send {
    /// Sample the raw input mask (keypad lines, bolt sensor, external power).
    ///
    /// # Errors
    ///
    /// Returns an error if the input port could not be read.
    fn sample(&mut self) -> Result<InputSample>;

    /// Read the raw battery ADC value.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion failed.
    fn battery_raw(&mut self) -> Result<u16>;
}

/// Status light outputs.
pub trait IndicatorPins: Send {
    /// Switch one light on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the output could not be written.
    fn set(&mut self, indicator: Indicator, on: bool) -> Result<()>;
}

/// Source of debounced keypad press edges.
///
/// # Object Safety
///
/// **NOTE**: This trait is NOT object-safe because `async fn` returns an
/// opaque `impl Future`. Use generics:
///
/// ```no_run
/// use padlock_hardware::traits::ButtonSource;
///
/// async fn wait_for_press<K: ButtonSource>(keypad: &mut K) {
///     if let Ok(button) = keypad.next_press().await {
///         println!("pressed {button}");
///     }
/// }
/// ```
pub trait ButtonSource: Send {
    /// Wait for the next press edge.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` once the keypad is gone.
    async fn next_press(&mut self) -> Result<Button>;
}
