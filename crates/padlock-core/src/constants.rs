//! Device constants for the padlock firmware.
//!
//! These values are fixed per device model. They cover the wireless command
//! frame layout, the SetKey payload mask, the persisted record identifiers,
//! the board input mask and the battery scaling applied to raw ADC samples.
//!
//! # Command Frame Layout
//!
//! ```text
//! byte:  0        1   2   3   4   5   6   7
//!        +--------+---+---+---+---+---+---+--------+
//!        | 0x55   |      payload (6)      | opcode |
//!        +--------+---+---+---+---+---+---+--------+
//! ```
//!
//! # Usage
//!
//! ```
//! use padlock_core::constants::*;
//!
//! assert_eq!(FRAME_LENGTH, 1 + KEY_LENGTH + 1);
//! assert_eq!(OPCODE_OFFSET, FRAME_LENGTH - 1);
//! ```

// ============================================================================
// Access Key
// ============================================================================

/// Number of symbols in an access key.
pub const KEY_LENGTH: usize = 6;

/// Key written at first boot when the store holds no key record.
///
/// Reads as `UP, DOWN, RIGHT, LEFT, UP, DOWN` on the keypad.
pub const DEFAULT_KEY: [u8; KEY_LENGTH] = [0x01, 0x02, 0x03, 0x04, 0x01, 0x02];

/// Auto-close flag written at first boot when the store holds no flag record.
pub const DEFAULT_AUTO_CLOSE: bool = false;

// ============================================================================
// Command Frame
// ============================================================================

/// Total length of a wireless command frame in bytes.
pub const FRAME_LENGTH: usize = 8;

/// First byte of every well-formed command frame.
pub const START_MARKER: u8 = 0x55;

/// Offset of the first payload byte.
pub const PAYLOAD_OFFSET: usize = 1;

/// Offset of the opcode byte (last byte of the frame).
pub const OPCODE_OFFSET: usize = 7;

/// Offset of the flag byte inside a SetAutoClose frame.
pub const AUTO_CLOSE_FLAG_OFFSET: usize = 6;

/// Opcode: attempt an unlock with the payload key.
pub const OPCODE_UNLOCK: u8 = 0xAA;

/// Opcode: replace the stored key with the unmasked payload.
pub const OPCODE_SET_KEY: u8 = 0xBB;

/// Opcode: set the persisted auto-close flag.
pub const OPCODE_SET_AUTO_CLOSE: u8 = 0xCC;

/// Opcode: attempt an unlock that is only honored while auto-close is enabled.
pub const OPCODE_CONDITIONAL_UNLOCK: u8 = 0xAB;

/// XOR mask applied by peers to the SetKey payload.
///
/// This is a device constant, not a user setting.
pub const SET_KEY_MASK: [u8; KEY_LENGTH] = [0x73, 0x74, 0x65, 0x76, 0x65, 0x65];

// ============================================================================
// Persisted Records
// ============================================================================

/// Record identifier of the 6-byte access key.
pub const KEY_RECORD_ID: u16 = 1;

/// Record identifier of the 1-byte auto-close flag.
pub const AUTO_CLOSE_RECORD_ID: u16 = 2;

// ============================================================================
// Board Inputs
// ============================================================================

/// Number of momentary keypad lines (ENTER + 4 directions).
pub const BUTTON_COUNT: u8 = 5;

/// Input mask bit of the bolt sensor (set = bolt engaged).
pub const INPUT_BOLT_BIT: u16 = 1 << 5;

/// Input mask bit of the external power detector.
pub const INPUT_EXTERNAL_POWER_BIT: u16 = 1 << 6;

/// Status word bit reporting the bolt as engaged.
pub const STATUS_BOLT_ENGAGED: u16 = 1 << 0;

/// Status word bit reporting external power present.
pub const STATUS_EXTERNAL_POWER: u16 = 1 << 1;

// ============================================================================
// Battery
// ============================================================================

/// Numerator of the raw ADC to battery reading scale (1.403).
pub const BATTERY_SCALE_NUM: u32 = 1403;

/// Denominator of the raw ADC to battery reading scale.
pub const BATTERY_SCALE_DEN: u32 = 1000;

/// Scaled battery reading above which the pack is considered charged.
pub const BATTERY_CHARGED_THRESHOLD: u16 = 0x1060;

// ============================================================================
// Indicators
// ============================================================================

/// Number of discrete status indicators.
pub const INDICATOR_COUNT: u8 = 4;
