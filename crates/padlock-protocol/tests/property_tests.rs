//! Property-based tests for command frame decoding.
//!
//! These tests use proptest to check that decoding is total, that it never
//! accepts a frame without the start marker or a known opcode, and that the
//! SetKey mask is applied exactly once.

use padlock_core::{
    AccessKey,
    constants::{FRAME_LENGTH, SET_KEY_MASK, START_MARKER},
};
use padlock_protocol::{Command, CommandFrame, CommandFrameDecoder, Opcode, UnlockGate};
use proptest::prelude::*;

/// Strategy for any 6-byte key.
fn any_key() -> impl Strategy<Value = AccessKey> {
    any::<[u8; 6]>().prop_map(AccessKey::new)
}

/// Strategy for opcode bytes the device does not understand.
fn unknown_opcode() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("known opcode", |b| Opcode::from_byte(*b).is_none())
}

proptest! {
    /// Property: decoding never panics and only accepts well-formed frames.
    #[test]
    fn prop_decode_is_total(bytes in any::<[u8; FRAME_LENGTH]>()) {
        let decoded = CommandFrameDecoder::decode(&bytes);
        if decoded.is_some() {
            prop_assert_eq!(bytes[0], START_MARKER);
            prop_assert!(Opcode::from_byte(bytes[7]).is_some());
        }
    }

    /// Property: a frame without the start marker is always discarded.
    #[test]
    fn prop_missing_start_marker_rejected(
        start in any::<u8>().prop_filter("start marker", |b| *b != START_MARKER),
        rest in any::<[u8; 7]>(),
    ) {
        let mut bytes = [0u8; FRAME_LENGTH];
        bytes[0] = start;
        bytes[1..].copy_from_slice(&rest);
        prop_assert_eq!(CommandFrameDecoder::decode(&bytes), None);
    }

    /// Property: unknown opcodes are always discarded.
    #[test]
    fn prop_unknown_opcode_rejected(key in any_key(), opcode in unknown_opcode()) {
        let mut bytes = CommandFrame::unlock(&key).into_bytes();
        bytes[7] = opcode;
        prop_assert_eq!(CommandFrameDecoder::decode(&bytes), None);
    }

    /// Property: SetKey(P) yields P XOR mask.
    #[test]
    fn prop_set_key_applies_mask(payload in any::<[u8; 6]>()) {
        let frame = CommandFrame::with_payload(Opcode::SetKey, &payload);
        let expected = AccessKey::new(payload).xor(&SET_KEY_MASK);
        prop_assert_eq!(
            CommandFrameDecoder::decode_frame(&frame),
            Some(Command::SetKey(expected))
        );
    }

    /// Property: unlock payloads are passed through unchanged.
    #[test]
    fn prop_unlock_payload_passthrough(key in any_key()) {
        prop_assert_eq!(
            CommandFrameDecoder::decode_frame(&CommandFrame::unlock(&key)),
            Some(Command::AttemptUnlock { key, gate: UnlockGate::Always })
        );
    }

    /// Property: take_command clears the buffer iff a command was produced.
    #[test]
    fn prop_take_command_clears_on_success(bytes in any::<[u8; FRAME_LENGTH]>()) {
        let mut buffer = bytes;
        match CommandFrameDecoder::take_command(&mut buffer) {
            Some(_) => prop_assert_eq!(buffer, [0u8; FRAME_LENGTH]),
            None => prop_assert_eq!(buffer, bytes),
        }
    }
}
