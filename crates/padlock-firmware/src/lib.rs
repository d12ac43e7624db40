//! Padlock firmware logic.
//!
//! This crate wires the board components into a running lock: keypad entry,
//! wireless commands, the access decision and re-close policy, and status
//! notifications.
//!
//! # Concurrency
//!
//! Event producers (the keypad source and the link layer) only post into
//! single-slot [`Mailbox`]es. [`Padlock::step`] is the sole consumer and the
//! only code that touches controller, store and board state.
//!
//! ```text
//! keypad ──▶ Mailbox<Button> ──┐
//!                              ├──▶ Padlock::step ──▶ AccessController
//! link ──▶ FrameInbox ──▶ Mailbox<Command> ──┘             │
//!                                               StatusPublisher ──▶ link
//! ```

pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod inbox;
pub mod keypad;
pub mod mailbox;
pub mod publisher;

pub use config::{PadlockConfig, TimingConfig};
pub use controller::{
    AccessController, AttemptOutcome, AttemptSource, CommandOutcome, ControllerState,
    StateTransition, TransitionCause,
};
pub use device::Padlock;
pub use error::{FirmwareError, Result};
pub use inbox::{FrameInbox, forward_presses};
pub use keypad::{KeypadOutcome, KeypadSession};
pub use mailbox::Mailbox;
pub use publisher::{
    ChannelTransport, MockTransport, MockTransportHandle, NotifyGate, StatusPublisher,
    StatusReader, StatusTransport,
};
