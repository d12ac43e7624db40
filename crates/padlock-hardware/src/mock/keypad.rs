//! Mock keypad implementation for testing and development.
//!
//! This module provides a simulated five-button keypad that can be driven
//! programmatically without physical hardware.

use crate::{Result, error::HardwareError, traits::ButtonSource};
use padlock_core::Button;
use tokio::sync::mpsc;

/// Mock keypad device.
///
/// Press edges are received through an internal channel. Tests and the
/// emulator send presses through a `MockKeypadHandle`.
///
/// # Examples
///
/// ```
/// use padlock_core::Button;
/// use padlock_hardware::mock::MockKeypad;
/// use padlock_hardware::traits::ButtonSource;
///
/// #[tokio::main]
/// async fn main() -> padlock_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///
///     tokio::spawn(async move {
///         handle.press(Button::Enter).await.unwrap();
///         handle.press(Button::Up).await.unwrap();
///     });
///
///     assert_eq!(keypad.next_press().await?, Button::Enter);
///     assert_eq!(keypad.next_press().await?, Button::Up);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated presses
    press_rx: mpsc::Receiver<Button>,
}

impl MockKeypad {
    /// Create a new mock keypad.
    ///
    /// Returns a tuple of (MockKeypad, MockKeypadHandle) where the handle
    /// can be used to simulate presses.
    pub fn new() -> (Self, MockKeypadHandle) {
        let (press_tx, press_rx) = mpsc::channel(32);
        (Self { press_rx }, MockKeypadHandle { press_tx })
    }
}

impl ButtonSource for MockKeypad {
    async fn next_press(&mut self) -> Result<Button> {
        self.press_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("Keypad press channel closed"))
    }
}

/// Handle for pressing buttons on a mock keypad.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    /// Channel sender for simulated presses
    press_tx: mpsc::Sender<Button>,
}

impl MockKeypadHandle {
    /// Press a single button.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped and the channel is closed.
    pub async fn press(&self, button: Button) -> Result<()> {
        self.press_tx
            .send(button)
            .await
            .map_err(|_| HardwareError::disconnected("Keypad press channel closed"))
    }

    /// Press `Enter` followed by the buttons that spell `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped and the channel is closed.
    pub async fn enter_key(&self, buttons: &[Button]) -> Result<()> {
        self.press(Button::Enter).await?;
        for &button in buttons {
            self.press(button).await?;
        }
        Ok(())
    }
}
