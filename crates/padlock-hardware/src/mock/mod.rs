//! Mock device implementations for testing and development.
//!
//! This module provides a simulated board and keypad that can be controlled
//! programmatically without requiring physical hardware.

pub mod board;
pub mod keypad;

// Re-export commonly used types
pub use board::{DEFAULT_BATTERY_RAW, MockBoard, MockBoardHandle};
pub use keypad::{MockKeypad, MockKeypadHandle};
