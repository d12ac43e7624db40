use crate::error::{ProtocolError, Result};
use padlock_core::{
    AccessKey,
    constants::{
        AUTO_CLOSE_FLAG_OFFSET, FRAME_LENGTH, KEY_LENGTH, OPCODE_CONDITIONAL_UNLOCK,
        OPCODE_OFFSET, OPCODE_SET_AUTO_CLOSE, OPCODE_SET_KEY, OPCODE_UNLOCK, PAYLOAD_OFFSET,
        SET_KEY_MASK, START_MARKER,
    },
};
use std::fmt;

/// Operation selected by the last byte of a command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Unlock = OPCODE_UNLOCK,
    SetKey = OPCODE_SET_KEY,
    SetAutoClose = OPCODE_SET_AUTO_CLOSE,
    ConditionalUnlock = OPCODE_CONDITIONAL_UNLOCK,
}

impl Opcode {
    /// Map a raw opcode byte, `None` for unknown values.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            OPCODE_UNLOCK => Some(Opcode::Unlock),
            OPCODE_SET_KEY => Some(Opcode::SetKey),
            OPCODE_SET_AUTO_CLOSE => Some(Opcode::SetAutoClose),
            OPCODE_CONDITIONAL_UNLOCK => Some(Opcode::ConditionalUnlock),
            _ => None,
        }
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Opcode::Unlock => "Unlock",
            Opcode::SetKey => "SetKey",
            Opcode::SetAutoClose => "SetAutoClose",
            Opcode::ConditionalUnlock => "ConditionalUnlock",
        };
        write!(f, "{name} ({:#04x})", self.as_byte())
    }
}

/// Raw 8-byte command frame as written by a wireless peer.
///
/// # Wire Format
/// ```text
/// [0x55, p1, p2, p3, p4, p5, p6, opcode]
/// ```
///
/// A frame is only a container: it may hold any bytes. Whether it carries a
/// command is decided by [`CommandFrameDecoder`](crate::CommandFrameDecoder).
///
/// # Building Frames
/// ```
/// use padlock_core::AccessKey;
/// use padlock_protocol::{CommandFrame, Opcode};
///
/// let key = AccessKey::new([1, 2, 3, 4, 1, 2]);
/// let frame = CommandFrame::unlock(&key);
///
/// assert_eq!(frame.as_bytes()[0], 0x55);
/// assert_eq!(frame.opcode(), Some(Opcode::Unlock));
/// assert_eq!(&frame.payload(), key.as_bytes());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame([u8; FRAME_LENGTH]);

impl CommandFrame {
    pub const fn from_bytes(bytes: [u8; FRAME_LENGTH]) -> Self {
        CommandFrame(bytes)
    }

    /// Accept a frame from a transport buffer.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidLength` unless `bytes` is exactly 8 long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; FRAME_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| ProtocolError::InvalidLength {
                    expected: FRAME_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(CommandFrame(bytes))
    }

    /// Accept a characteristic write.
    ///
    /// Only whole-frame writes at offset 0 are accepted.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidOffset` for a non-zero offset and
    /// `ProtocolError::InvalidLength` for a write that is not 8 bytes.
    pub fn from_write(offset: usize, data: &[u8]) -> Result<Self> {
        if offset != 0 {
            return Err(ProtocolError::InvalidOffset { offset });
        }
        Self::from_slice(data)
    }

    /// Frame carrying `payload` with the given opcode.
    pub fn with_payload(opcode: Opcode, payload: &[u8; KEY_LENGTH]) -> Self {
        let mut bytes = [0u8; FRAME_LENGTH];
        bytes[0] = START_MARKER;
        bytes[PAYLOAD_OFFSET..OPCODE_OFFSET].copy_from_slice(payload);
        bytes[OPCODE_OFFSET] = opcode.as_byte();
        CommandFrame(bytes)
    }

    pub fn unlock(key: &AccessKey) -> Self {
        Self::with_payload(Opcode::Unlock, key.as_bytes())
    }

    /// SetKey frame; the key is masked before it goes on the wire.
    pub fn set_key(key: &AccessKey) -> Self {
        Self::with_payload(Opcode::SetKey, key.xor(&SET_KEY_MASK).as_bytes())
    }

    pub fn set_auto_close(enabled: bool) -> Self {
        let mut payload = [0u8; KEY_LENGTH];
        payload[AUTO_CLOSE_FLAG_OFFSET - PAYLOAD_OFFSET] = u8::from(enabled);
        Self::with_payload(Opcode::SetAutoClose, &payload)
    }

    pub fn conditional_unlock(key: &AccessKey) -> Self {
        Self::with_payload(Opcode::ConditionalUnlock, key.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LENGTH] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; FRAME_LENGTH] {
        self.0
    }

    #[inline]
    pub fn has_start_marker(&self) -> bool {
        self.0[0] == START_MARKER
    }

    #[inline]
    pub fn opcode_byte(&self) -> u8 {
        self.0[OPCODE_OFFSET]
    }

    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_byte(self.opcode_byte())
    }

    /// Bytes 1 to 6.
    pub fn payload(&self) -> [u8; KEY_LENGTH] {
        let mut payload = [0u8; KEY_LENGTH];
        payload.copy_from_slice(&self.0[PAYLOAD_OFFSET..OPCODE_OFFSET]);
        payload
    }

    /// Start marker present and opcode known.
    pub fn is_well_formed(&self) -> bool {
        self.has_start_marker() && self.opcode().is_some()
    }
}

impl From<[u8; FRAME_LENGTH]> for CommandFrame {
    fn from(bytes: [u8; FRAME_LENGTH]) -> Self {
        CommandFrame(bytes)
    }
}

// Payload bytes may be a key; only the framing is printed.
impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CommandFrame")
            .field("start", &format_args!("{:#04x}", self.0[0]))
            .field("opcode", &format_args!("{:#04x}", self.opcode_byte()))
            .finish_non_exhaustive()
    }
}
