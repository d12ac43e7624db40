//! Command frame validation and decoding.
//!
//! Decoding is total over `[u8; 8]`: every input either yields one
//! [`Command`] or `None`. Malformed frames are never partially applied and
//! never buffered.

use crate::{
    command::{Command, UnlockGate},
    frame::{CommandFrame, Opcode},
};
use padlock_core::{
    AccessKey,
    constants::{AUTO_CLOSE_FLAG_OFFSET, FRAME_LENGTH, SET_KEY_MASK},
};

/// Stateless decoder for 8-byte command frames.
///
/// # Examples
/// ```
/// use padlock_core::AccessKey;
/// use padlock_protocol::{Command, CommandFrame, CommandFrameDecoder, UnlockGate};
///
/// let key = AccessKey::new([4, 3, 2, 1, 4, 3]);
/// let mut buffer = CommandFrame::unlock(&key).into_bytes();
///
/// let command = CommandFrameDecoder::take_command(&mut buffer);
/// assert_eq!(
///     command,
///     Some(Command::AttemptUnlock { key, gate: UnlockGate::Always })
/// );
/// assert_eq!(buffer, [0u8; 8]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandFrameDecoder;

impl CommandFrameDecoder {
    /// Decode a raw frame.
    ///
    /// Returns `None` when the start marker is missing, the opcode is
    /// unknown, or a SetAutoClose flag byte is neither 0 nor 1.
    pub fn decode(bytes: &[u8; FRAME_LENGTH]) -> Option<Command> {
        Self::decode_frame(&CommandFrame::from_bytes(*bytes))
    }

    pub fn decode_frame(frame: &CommandFrame) -> Option<Command> {
        if !frame.has_start_marker() {
            return None;
        }

        let payload = AccessKey::new(frame.payload());
        match frame.opcode()? {
            Opcode::Unlock => Some(Command::AttemptUnlock {
                key: payload,
                gate: UnlockGate::Always,
            }),
            Opcode::ConditionalUnlock => Some(Command::AttemptUnlock {
                key: payload,
                gate: UnlockGate::AutoCloseEnabled,
            }),
            Opcode::SetKey => Some(Command::SetKey(payload.xor(&SET_KEY_MASK))),
            Opcode::SetAutoClose => match frame.as_bytes()[AUTO_CLOSE_FLAG_OFFSET] {
                0 => Some(Command::SetAutoClose(false)),
                1 => Some(Command::SetAutoClose(true)),
                _ => None,
            },
        }
    }

    /// Decode `buffer` and clear it once a command has been produced.
    ///
    /// A malformed frame leaves the buffer untouched.
    pub fn take_command(buffer: &mut [u8; FRAME_LENGTH]) -> Option<Command> {
        let command = Self::decode(buffer)?;
        buffer.fill(0);
        Some(command)
    }
}
