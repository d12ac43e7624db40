use crate::frame::{CommandFrame, Opcode};
use padlock_core::AccessKey;

/// Condition attached to a wireless unlock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnlockGate {
    /// Always compared against the stored key.
    Always,
    /// Only compared while the auto-close flag is set; ignored otherwise.
    AutoCloseEnabled,
}

/// A validated wireless command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AttemptUnlock { key: AccessKey, gate: UnlockGate },
    /// Already unmasked.
    SetKey(AccessKey),
    SetAutoClose(bool),
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::AttemptUnlock {
                gate: UnlockGate::Always,
                ..
            } => Opcode::Unlock,
            Command::AttemptUnlock {
                gate: UnlockGate::AutoCloseEnabled,
                ..
            } => Opcode::ConditionalUnlock,
            Command::SetKey(_) => Opcode::SetKey,
            Command::SetAutoClose(_) => Opcode::SetAutoClose,
        }
    }

    /// Encode back into the frame a peer would send.
    pub fn to_frame(&self) -> CommandFrame {
        match self {
            Command::AttemptUnlock {
                key,
                gate: UnlockGate::Always,
            } => CommandFrame::unlock(key),
            Command::AttemptUnlock {
                key,
                gate: UnlockGate::AutoCloseEnabled,
            } => CommandFrame::conditional_unlock(key),
            Command::SetKey(key) => CommandFrame::set_key(key),
            Command::SetAutoClose(enabled) => CommandFrame::set_auto_close(*enabled),
        }
    }
}
