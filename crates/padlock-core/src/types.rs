use crate::{
    Result,
    constants::{
        BATTERY_SCALE_DEN, BATTERY_SCALE_NUM, BUTTON_COUNT, DEFAULT_KEY, INDICATOR_COUNT,
        INPUT_BOLT_BIT, INPUT_EXTERNAL_POWER_BIT, KEY_LENGTH, STATUS_BOLT_ENGAGED,
        STATUS_EXTERNAL_POWER,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::{Choice, ConstantTimeEq};

/// One position of an access key.
///
/// Keypad symbols use the input line index of their button; wireless payloads
/// may carry any byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(u8);

impl Symbol {
    pub const UP: Symbol = Symbol(0x01);
    pub const DOWN: Symbol = Symbol(0x02);
    pub const RIGHT: Symbol = Symbol(0x03);
    pub const LEFT: Symbol = Symbol(0x04);

    #[must_use]
    pub const fn new(value: u8) -> Self {
        Symbol(value)
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl From<u8> for Symbol {
    fn from(value: u8) -> Self {
        Symbol(value)
    }
}

/// Momentary keypad button.
///
/// The discriminant is the input line index on the board, which is also the
/// bit position of the button in an [`InputSample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Button {
    Enter = 0,
    Up = 1,
    Down = 2,
    Right = 3,
    Left = 4,
}

impl Button {
    /// All keypad buttons in input line order.
    pub const ALL: [Button; BUTTON_COUNT as usize] = [
        Button::Enter,
        Button::Up,
        Button::Down,
        Button::Right,
        Button::Left,
    ];

    /// Map an input line index to a button.
    ///
    /// # Errors
    /// Returns `Error::InvalidButton` for indices outside 0-4.
    pub fn from_index(index: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(Error::InvalidButton { index })
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The key symbol this button enters, or `None` for `Enter`.
    ///
    /// `Enter` only ever starts a session; it is never part of a key.
    #[must_use]
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Button::Enter => None,
            Button::Up => Some(Symbol::UP),
            Button::Down => Some(Symbol::DOWN),
            Button::Right => Some(Symbol::RIGHT),
            Button::Left => Some(Symbol::LEFT),
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Button::Enter => "enter",
            Button::Up => "up",
            Button::Down => "down",
            Button::Right => "right",
            Button::Left => "left",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for Button {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enter" => Ok(Button::Enter),
            "up" => Ok(Button::Up),
            "down" => Ok(Button::Down),
            "right" => Ok(Button::Right),
            "left" => Ok(Button::Left),
            other => Err(Error::Config(format!("Unknown button: {other}"))),
        }
    }
}

/// The shared secret: exactly six symbols.
///
/// # Security
/// Equality is constant-time over all six positions, and `Debug` never
/// prints the symbols.
#[derive(Clone, Copy, Eq)]
pub struct AccessKey([u8; KEY_LENGTH]);

impl AccessKey {
    #[must_use]
    pub const fn new(bytes: [u8; KEY_LENGTH]) -> Self {
        AccessKey(bytes)
    }

    /// Build a key from a byte slice.
    ///
    /// # Errors
    /// Returns `Error::InvalidKeyLength` unless the slice holds exactly six bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| Error::InvalidKeyLength {
            expected: KEY_LENGTH,
            actual: bytes.len(),
        })?;
        Ok(AccessKey(bytes))
    }

    #[must_use]
    pub fn from_symbols(symbols: [Symbol; KEY_LENGTH]) -> Self {
        AccessKey(symbols.map(Symbol::as_u8))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.iter().copied().map(Symbol::new)
    }

    /// XOR every position with `mask`.
    ///
    /// Applying the same mask twice yields the original key.
    #[must_use]
    pub fn xor(&self, mask: &[u8; KEY_LENGTH]) -> Self {
        let mut out = self.0;
        for (byte, m) in out.iter_mut().zip(mask) {
            *byte ^= m;
        }
        AccessKey(out)
    }
}

impl Default for AccessKey {
    fn default() -> Self {
        AccessKey(DEFAULT_KEY)
    }
}

impl ConstantTimeEq for AccessKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for AccessKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("AccessKey(******)")
    }
}

/// Physical bolt position reported by the bolt sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoltSensorState {
    Engaged,
    Disengaged,
}

impl BoltSensorState {
    #[inline]
    #[must_use]
    pub fn from_level(engaged: bool) -> Self {
        if engaged {
            BoltSensorState::Engaged
        } else {
            BoltSensorState::Disengaged
        }
    }

    #[inline]
    #[must_use]
    pub fn is_engaged(self) -> bool {
        matches!(self, BoltSensorState::Engaged)
    }
}

impl fmt::Display for BoltSensorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BoltSensorState::Engaged => write!(f, "Engaged"),
            BoltSensorState::Disengaged => write!(f, "Disengaged"),
        }
    }
}

/// Raw input mask sampled from the board once per tick.
///
/// Bits 0-4 are the keypad lines in [`Button`] order, bit 5 the bolt sensor
/// and bit 6 the external power detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputSample(u16);

impl InputSample {
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        InputSample(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn bolt(self) -> BoltSensorState {
        BoltSensorState::from_level(self.0 & INPUT_BOLT_BIT != 0)
    }

    #[must_use]
    pub fn external_power(self) -> bool {
        self.0 & INPUT_EXTERNAL_POWER_BIT != 0
    }

    #[must_use]
    pub fn is_pressed(self, button: Button) -> bool {
        self.0 & (1 << button.index()) != 0
    }

    #[must_use]
    pub fn with_bolt(self, state: BoltSensorState) -> Self {
        self.with_bit(INPUT_BOLT_BIT, state.is_engaged())
    }

    #[must_use]
    pub fn with_external_power(self, present: bool) -> Self {
        self.with_bit(INPUT_EXTERNAL_POWER_BIT, present)
    }

    #[must_use]
    pub fn with_pressed(self, button: Button, pressed: bool) -> Self {
        self.with_bit(1 << button.index(), pressed)
    }

    fn with_bit(self, bit: u16, set: bool) -> Self {
        if set {
            InputSample(self.0 | bit)
        } else {
            InputSample(self.0 & !bit)
        }
    }
}

/// Scale a raw battery ADC sample into the reported battery reading.
///
/// The reading is `raw * 1.403`, computed in integer arithmetic and
/// saturated at `u16::MAX`.
#[must_use]
pub fn scale_battery(raw: u16) -> u16 {
    let scaled = u32::from(raw) * BATTERY_SCALE_NUM / BATTERY_SCALE_DEN;
    u16::try_from(scaled).unwrap_or(u16::MAX)
}

/// Packed status word reported to the subscribed peer.
///
/// Low 16 bits carry the sensor bits, high 16 bits the scaled battery
/// reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceStatus(u32);

impl DeviceStatus {
    #[must_use]
    pub const fn from_parts(sensor_bits: u16, battery: u16) -> Self {
        DeviceStatus(((battery as u32) << 16) | sensor_bits as u32)
    }

    /// Compose the status word from the sampled inputs and scaled battery.
    #[must_use]
    pub fn compose(inputs: InputSample, battery: u16) -> Self {
        let mut sensor_bits = 0;
        if inputs.bolt().is_engaged() {
            sensor_bits |= STATUS_BOLT_ENGAGED;
        }
        if inputs.external_power() {
            sensor_bits |= STATUS_EXTERNAL_POWER;
        }
        Self::from_parts(sensor_bits, battery)
    }

    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        DeviceStatus(value)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn sensor_bits(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    #[must_use]
    pub const fn battery(self) -> u16 {
        (self.0 >> 16) as u16
    }

    #[must_use]
    pub fn bolt_engaged(self) -> bool {
        self.sensor_bits() & STATUS_BOLT_ENGAGED != 0
    }

    #[must_use]
    pub fn external_power(self) -> bool {
        self.sensor_bits() & STATUS_EXTERNAL_POWER != 0
    }

    /// Notification payload: the word in little-endian byte order.
    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        DeviceStatus(u32::from_le_bytes(bytes))
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// The four discrete status lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Indicator {
    /// Red: rejected attempt or failed write.
    Failure = 0,
    /// Green: lit while the bolt is being driven after a match.
    Success = 1,
    /// Blue: keypad activity and accepted configuration writes.
    Activity = 2,
    /// White: external power / charge state.
    Power = 3,
}

impl Indicator {
    pub const ALL: [Indicator; INDICATOR_COUNT as usize] = [
        Indicator::Failure,
        Indicator::Success,
        Indicator::Activity,
        Indicator::Power,
    ];

    /// Map an output index to an indicator.
    ///
    /// # Errors
    /// Returns `Error::InvalidIndicator` for indices outside 0-3.
    pub fn from_index(index: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(Error::InvalidIndicator { index })
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Indicator::Failure => write!(f, "Failure"),
            Indicator::Success => write!(f, "Success"),
            Indicator::Activity => write!(f, "Activity"),
            Indicator::Power => write!(f, "Power"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SET_KEY_MASK;
    use rstest::rstest;

    #[rstest]
    #[case(0, Button::Enter)]
    #[case(1, Button::Up)]
    #[case(2, Button::Down)]
    #[case(3, Button::Right)]
    #[case(4, Button::Left)]
    fn test_button_from_index(#[case] index: u8, #[case] expected: Button) {
        let button = Button::from_index(index).unwrap();
        assert_eq!(button, expected);
        assert_eq!(button.index(), index);
    }

    #[rstest]
    #[case(5)] // bolt sensor line, not a button
    #[case(6)] // external power line
    #[case(255)]
    fn test_button_from_index_invalid(#[case] index: u8) {
        assert_eq!(
            Button::from_index(index),
            Err(Error::InvalidButton { index })
        );
    }

    #[test]
    fn test_enter_has_no_symbol() {
        assert_eq!(Button::Enter.symbol(), None);
        assert_eq!(Button::Up.symbol(), Some(Symbol::UP));
        assert_eq!(Button::Left.symbol(), Some(Symbol::LEFT));
    }

    #[rstest]
    #[case("enter", Button::Enter)]
    #[case(" UP ", Button::Up)]
    #[case("Left", Button::Left)]
    fn test_button_from_str(#[case] input: &str, #[case] expected: Button) {
        assert_eq!(input.parse::<Button>().unwrap(), expected);
    }

    #[test]
    fn test_button_from_str_unknown() {
        assert!("select".parse::<Button>().is_err());
    }

    #[test]
    fn test_default_key_spells_directions() {
        let key = AccessKey::default();
        let symbols: Vec<Symbol> = key.symbols().collect();
        assert_eq!(
            symbols,
            vec![
                Symbol::UP,
                Symbol::DOWN,
                Symbol::RIGHT,
                Symbol::LEFT,
                Symbol::UP,
                Symbol::DOWN
            ]
        );
    }

    #[rstest]
    #[case(&[])]
    #[case(&[1, 2, 3, 4, 5])]
    #[case(&[1, 2, 3, 4, 5, 6, 7])]
    fn test_access_key_from_slice_wrong_length(#[case] bytes: &[u8]) {
        assert_eq!(
            AccessKey::from_slice(bytes),
            Err(Error::InvalidKeyLength {
                expected: KEY_LENGTH,
                actual: bytes.len()
            })
        );
    }

    #[test]
    fn test_access_key_equality_checks_every_position() {
        let key = AccessKey::new([1, 2, 3, 4, 1, 2]);
        assert_eq!(key, AccessKey::new([1, 2, 3, 4, 1, 2]));

        for position in 0..KEY_LENGTH {
            let mut bytes = *key.as_bytes();
            bytes[position] ^= 0xFF;
            assert_ne!(key, AccessKey::new(bytes), "position {position}");
        }
    }

    #[test]
    fn test_access_key_xor_is_involution() {
        let key = AccessKey::new([0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);
        let masked = key.xor(&SET_KEY_MASK);
        assert_ne!(masked, key);
        assert_eq!(masked.xor(&SET_KEY_MASK), key);
    }

    #[test]
    fn test_access_key_debug_is_redacted() {
        let key = AccessKey::new([9, 9, 9, 9, 9, 9]);
        assert_eq!(format!("{key:?}"), "AccessKey(******)");
    }

    #[test]
    fn test_input_sample_bits() {
        let sample = InputSample::default()
            .with_bolt(BoltSensorState::Engaged)
            .with_external_power(true)
            .with_pressed(Button::Down, true);

        assert_eq!(sample.bits(), 0b110_0100);
        assert_eq!(sample.bolt(), BoltSensorState::Engaged);
        assert!(sample.external_power());
        assert!(sample.is_pressed(Button::Down));
        assert!(!sample.is_pressed(Button::Up));

        let released = sample.with_bolt(BoltSensorState::Disengaged);
        assert_eq!(released.bolt(), BoltSensorState::Disengaged);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1000, 1403)]
    #[case(0x0BB8, 4209)]
    #[case(u16::MAX, u16::MAX)] // saturates
    fn test_scale_battery(#[case] raw: u16, #[case] expected: u16) {
        assert_eq!(scale_battery(raw), expected);
    }

    #[test]
    fn test_device_status_packing() {
        let inputs = InputSample::default()
            .with_bolt(BoltSensorState::Engaged)
            .with_external_power(true);
        let status = DeviceStatus::compose(inputs, 0x1234);

        assert_eq!(status.as_u32(), 0x1234_0003);
        assert_eq!(status.sensor_bits(), 0x0003);
        assert_eq!(status.battery(), 0x1234);
        assert!(status.bolt_engaged());
        assert!(status.external_power());
        assert_eq!(status.to_le_bytes(), [0x03, 0x00, 0x34, 0x12]);
        assert_eq!(DeviceStatus::from_le_bytes(status.to_le_bytes()), status);
        assert_eq!(status.to_string(), "0x12340003");
    }

    #[test]
    fn test_device_status_ignores_button_lines() {
        let inputs = InputSample::default().with_pressed(Button::Enter, true);
        assert_eq!(DeviceStatus::compose(inputs, 0).sensor_bits(), 0);
    }

    #[rstest]
    #[case(0, Indicator::Failure)]
    #[case(1, Indicator::Success)]
    #[case(2, Indicator::Activity)]
    #[case(3, Indicator::Power)]
    fn test_indicator_from_index(#[case] index: u8, #[case] expected: Indicator) {
        assert_eq!(Indicator::from_index(index).unwrap(), expected);
        assert_eq!(expected.index(), index);
    }

    #[test]
    fn test_indicator_from_index_out_of_range() {
        assert_eq!(
            Indicator::from_index(4),
            Err(Error::InvalidIndicator { index: 4 })
        );
    }

    #[test]
    fn test_bolt_state_serialization() {
        let json = serde_json::to_string(&BoltSensorState::Engaged).unwrap();
        assert_eq!(json, "\"engaged\"");
    }
}
