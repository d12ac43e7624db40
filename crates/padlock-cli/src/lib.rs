//! Host emulator for the padlock firmware.
//!
//! Runs the firmware tick loop against the mock board, persists records in
//! SQLite, accepts command frames over TCP and reads keypad presses and
//! sensor changes from the console.

pub mod config;
pub mod console;
pub mod emulator;
pub mod link;
pub mod logging;

pub use config::EmulatorConfig;
pub use console::{Console, ConsoleCommand, ConsoleError};
pub use link::{LinkConfig, LinkError, LinkServer};
