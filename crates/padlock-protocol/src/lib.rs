//! Wireless command protocol for the padlock.
//!
//! Peers write fixed 8-byte frames; [`CommandFrameDecoder`] turns a frame
//! into at most one [`Command`]. [`FrameCodec`] and [`PeerCodec`] carry frames
//! and status notifications over byte streams.

pub mod codec;
pub mod command;
pub mod decoder;
pub mod error;
pub mod frame;

pub use codec::{FrameCodec, PeerCodec, STATUS_LENGTH};
pub use command::{Command, UnlockGate};
pub use decoder::CommandFrameDecoder;
pub use error::{ProtocolError, Result};
pub use frame::{CommandFrame, Opcode};
