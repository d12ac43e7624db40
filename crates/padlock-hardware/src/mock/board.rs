//! Mock padlock board for testing and development.
//!
//! One shared board state backs every clone of [`MockBoard`], so the
//! actuator, the sensor port and the indicator can each own a clone while a
//! [`MockBoardHandle`] drives the sensors and inspects the outputs.

use crate::{
    Result,
    error::HardwareError,
    traits::{Drive, DriveLines, IndicatorPins, SensorInputs},
};
use padlock_core::{BoltSensorState, Indicator, InputSample, constants::INDICATOR_COUNT};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const LIGHTS: usize = INDICATOR_COUNT as usize;

/// Default raw battery sample; scales to 4209, above the charged threshold.
pub const DEFAULT_BATTERY_RAW: u16 = 3000;

#[derive(Debug)]
struct BoardState {
    inputs: InputSample,
    battery_raw: u16,
    drive: Drive,
    drive_history: Vec<Drive>,
    lit: [bool; LIGHTS],
    flash_counts: [usize; LIGHTS],
    fail_drive: bool,
    fail_sensors: bool,
    fail_indicators: bool,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            inputs: InputSample::default(),
            battery_raw: DEFAULT_BATTERY_RAW,
            drive: Drive::Released,
            drive_history: Vec::new(),
            lit: [false; LIGHTS],
            flash_counts: [0; LIGHTS],
            fail_drive: false,
            fail_sensors: false,
            fail_indicators: false,
        }
    }
}

fn lock(state: &Mutex<BoardState>) -> MutexGuard<'_, BoardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock board implementing every pin-level trait.
///
/// # Examples
///
/// ```
/// use padlock_core::{BoltSensorState, Indicator};
/// use padlock_hardware::mock::MockBoard;
/// use padlock_hardware::traits::{IndicatorPins, SensorInputs};
///
/// let (mut board, handle) = MockBoard::new();
///
/// handle.set_bolt(BoltSensorState::Engaged);
/// assert_eq!(board.sample().unwrap().bolt(), BoltSensorState::Engaged);
///
/// board.set(Indicator::Success, true).unwrap();
/// assert!(handle.is_lit(Indicator::Success));
/// ```
#[derive(Debug, Clone)]
pub struct MockBoard {
    state: Arc<Mutex<BoardState>>,
}

impl MockBoard {
    /// Create a board with the bolt disengaged, no external power and the
    /// default battery sample.
    ///
    /// Returns a tuple of (MockBoard, MockBoardHandle).
    pub fn new() -> (Self, MockBoardHandle) {
        let state = Arc::new(Mutex::new(BoardState::default()));
        let board = Self {
            state: Arc::clone(&state),
        };
        (board, MockBoardHandle { state })
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new().0
    }
}

impl DriveLines for MockBoard {
    fn apply(&mut self, drive: Drive) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_drive {
            return Err(HardwareError::communication("drive lines not responding"));
        }
        state.drive = drive;
        state.drive_history.push(drive);
        Ok(())
    }
}

impl SensorInputs for MockBoard {
    fn sample(&mut self) -> Result<InputSample> {
        let state = lock(&self.state);
        if state.fail_sensors {
            return Err(HardwareError::communication("input port not responding"));
        }
        Ok(state.inputs)
    }

    fn battery_raw(&mut self) -> Result<u16> {
        let state = lock(&self.state);
        if state.fail_sensors {
            return Err(HardwareError::communication("battery ADC not responding"));
        }
        Ok(state.battery_raw)
    }
}

impl IndicatorPins for MockBoard {
    fn set(&mut self, indicator: Indicator, on: bool) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_indicators {
            return Err(HardwareError::communication("indicator output not responding"));
        }
        let slot = usize::from(indicator.index());
        if on && !state.lit[slot] {
            state.flash_counts[slot] += 1;
        }
        state.lit[slot] = on;
        Ok(())
    }
}

/// Handle for driving and inspecting a mock board.
///
/// It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockBoardHandle {
    state: Arc<Mutex<BoardState>>,
}

impl MockBoardHandle {
    pub fn set_bolt(&self, bolt: BoltSensorState) {
        let mut state = lock(&self.state);
        state.inputs = state.inputs.with_bolt(bolt);
    }

    pub fn set_external_power(&self, present: bool) {
        let mut state = lock(&self.state);
        state.inputs = state.inputs.with_external_power(present);
    }

    pub fn set_battery_raw(&self, raw: u16) {
        lock(&self.state).battery_raw = raw;
    }

    pub fn inputs(&self) -> InputSample {
        lock(&self.state).inputs
    }

    /// Current drive line state.
    pub fn drive(&self) -> Drive {
        lock(&self.state).drive
    }

    /// Every drive value applied so far, in order.
    pub fn drive_history(&self) -> Vec<Drive> {
        lock(&self.state).drive_history.clone()
    }

    /// Number of times the open line was energized.
    pub fn open_count(&self) -> usize {
        self.count_drive(Drive::Open)
    }

    /// Number of times the close line was energized.
    pub fn close_count(&self) -> usize {
        self.count_drive(Drive::Close)
    }

    pub fn is_lit(&self, indicator: Indicator) -> bool {
        lock(&self.state).lit[usize::from(indicator.index())]
    }

    /// Number of off-to-on transitions of a light.
    pub fn flash_count(&self, indicator: Indicator) -> usize {
        lock(&self.state).flash_counts[usize::from(indicator.index())]
    }

    /// Forget recorded drive and indicator activity.
    pub fn clear_history(&self) {
        let mut state = lock(&self.state);
        state.drive_history.clear();
        state.flash_counts = [0; LIGHTS];
    }

    /// Make drive line writes fail until cleared.
    pub fn fail_drive(&self, fail: bool) {
        lock(&self.state).fail_drive = fail;
    }

    /// Make input and battery reads fail until cleared.
    pub fn fail_sensors(&self, fail: bool) {
        lock(&self.state).fail_sensors = fail;
    }

    /// Make indicator writes fail until cleared.
    pub fn fail_indicators(&self, fail: bool) {
        lock(&self.state).fail_indicators = fail;
    }

    fn count_drive(&self, drive: Drive) -> usize {
        lock(&self.state)
            .drive_history
            .iter()
            .filter(|&&d| d == drive)
            .count()
    }
}
