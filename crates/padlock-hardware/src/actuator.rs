//! Motorized bolt actuator.

use crate::{
    error::Result,
    traits::{Drive, DriveLines, SensorInputs},
};
use padlock_core::{BoltSensorState, InputSample};

/// Drives the bolt motor with tick-counted pulses and reads the bolt sensor.
///
/// `open()` and `close()` only start a pulse; [`tick`](Self::tick) counts it
/// down and releases both lines when it ends. A direction change releases the
/// lines before energizing the other one.
///
/// # Examples
///
/// ```
/// use padlock_hardware::{LockActuator, mock::MockBoard, traits::Drive};
///
/// let (board, handle) = MockBoard::new();
/// let mut actuator = LockActuator::new(board.clone(), board, 2);
///
/// actuator.open().unwrap();
/// assert_eq!(handle.drive(), Drive::Open);
///
/// actuator.tick().unwrap();
/// actuator.tick().unwrap();
/// assert_eq!(handle.drive(), Drive::Released);
/// ```
#[derive(Debug)]
pub struct LockActuator<D, S> {
    lines: D,
    sensors: S,
    drive: Drive,
    remaining: u32,
    pulse_ticks: u32,
}

impl<D: DriveLines, S: SensorInputs> LockActuator<D, S> {
    /// Create an actuator with lines released. A zero pulse length is
    /// treated as one tick.
    pub fn new(lines: D, sensors: S, pulse_ticks: u32) -> Self {
        Self {
            lines,
            sensors,
            drive: Drive::Released,
            remaining: 0,
            pulse_ticks: pulse_ticks.max(1),
        }
    }

    /// Start an opening pulse.
    ///
    /// # Errors
    ///
    /// Returns an error if the drive lines could not be written; the
    /// actuator is left released or in its previous pulse.
    pub fn open(&mut self) -> Result<()> {
        self.start(Drive::Open)
    }

    /// Start a closing pulse.
    ///
    /// # Errors
    ///
    /// Returns an error if the drive lines could not be written.
    pub fn close(&mut self) -> Result<()> {
        self.start(Drive::Close)
    }

    /// Advance the running pulse by one tick.
    ///
    /// Returns `true` on the tick the pulse ended and the lines were released.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the lines failed; the release is retried
    /// on the next tick.
    pub fn tick(&mut self) -> Result<bool> {
        if self.drive == Drive::Released {
            return Ok(false);
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return Ok(false);
        }

        self.release()?;
        Ok(true)
    }

    /// Release both lines immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the drive lines could not be written.
    pub fn release(&mut self) -> Result<()> {
        self.lines.apply(Drive::Released)?;
        self.drive = Drive::Released;
        self.remaining = 0;
        Ok(())
    }

    /// Read the bolt sensor without side effects.
    ///
    /// # Errors
    ///
    /// Returns an error if the input port could not be read.
    pub fn read_bolt_sensor(&mut self) -> Result<BoltSensorState> {
        Ok(self.sensors.sample()?.bolt())
    }

    /// Sample the full input mask through the actuator's sensor port.
    ///
    /// # Errors
    ///
    /// Returns an error if the input port could not be read.
    pub fn sample_inputs(&mut self) -> Result<InputSample> {
        self.sensors.sample()
    }

    /// # Errors
    ///
    /// Returns an error if the battery conversion failed.
    pub fn battery_raw(&mut self) -> Result<u16> {
        self.sensors.battery_raw()
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    pub fn is_driving(&self) -> bool {
        self.drive != Drive::Released
    }

    /// Ticks left in the running pulse, 0 when released.
    pub fn remaining_ticks(&self) -> u32 {
        self.remaining
    }

    fn start(&mut self, direction: Drive) -> Result<()> {
        if self.drive == direction {
            self.remaining = self.pulse_ticks;
            return Ok(());
        }

        // Break before make.
        if self.drive != Drive::Released {
            self.release()?;
        }

        self.lines.apply(direction)?;
        self.drive = direction;
        self.remaining = self.pulse_ticks;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBoard, MockBoardHandle};

    fn actuator(pulse_ticks: u32) -> (LockActuator<MockBoard, MockBoard>, MockBoardHandle) {
        let (board, handle) = MockBoard::new();
        (LockActuator::new(board.clone(), board, pulse_ticks), handle)
    }

    #[test]
    fn test_open_pulse_releases_after_configured_ticks() {
        let (mut actuator, handle) = actuator(3);

        actuator.open().unwrap();
        assert!(actuator.is_driving());
        assert_eq!(handle.drive(), Drive::Open);

        assert!(!actuator.tick().unwrap());
        assert!(!actuator.tick().unwrap());
        assert!(actuator.tick().unwrap());

        assert!(!actuator.is_driving());
        assert_eq!(handle.drive(), Drive::Released);
        assert_eq!(handle.drive_history(), vec![Drive::Open, Drive::Released]);
    }

    #[test]
    fn test_tick_while_released_is_noop() {
        let (mut actuator, handle) = actuator(3);
        assert!(!actuator.tick().unwrap());
        assert!(handle.drive_history().is_empty());
    }

    #[test]
    fn test_direction_change_is_break_before_make() {
        let (mut actuator, handle) = actuator(5);

        actuator.open().unwrap();
        actuator.close().unwrap();

        assert_eq!(
            handle.drive_history(),
            vec![Drive::Open, Drive::Released, Drive::Close]
        );
        assert_eq!(actuator.remaining_ticks(), 5);
    }

    #[test]
    fn test_same_direction_restarts_pulse_without_new_edge() {
        let (mut actuator, handle) = actuator(4);

        actuator.open().unwrap();
        actuator.tick().unwrap();
        actuator.tick().unwrap();
        actuator.open().unwrap();

        assert_eq!(actuator.remaining_ticks(), 4);
        assert_eq!(handle.open_count(), 1);
    }

    #[test]
    fn test_zero_pulse_is_one_tick() {
        let (mut actuator, handle) = actuator(0);
        actuator.close().unwrap();
        assert!(actuator.tick().unwrap());
        assert_eq!(handle.drive(), Drive::Released);
    }

    #[test]
    fn test_failed_open_leaves_lines_released() {
        let (mut actuator, handle) = actuator(3);
        handle.fail_drive(true);

        assert!(actuator.open().is_err());
        assert!(!actuator.is_driving());
        assert_eq!(handle.open_count(), 0);
    }

    #[test]
    fn test_failed_release_is_retried() {
        let (mut actuator, handle) = actuator(1);
        actuator.open().unwrap();

        handle.fail_drive(true);
        assert!(actuator.tick().is_err());
        assert!(actuator.is_driving());

        handle.fail_drive(false);
        assert!(actuator.tick().unwrap());
        assert_eq!(handle.drive(), Drive::Released);
    }

    #[test]
    fn test_read_bolt_sensor() {
        let (mut actuator, handle) = actuator(1);
        assert_eq!(
            actuator.read_bolt_sensor().unwrap(),
            BoltSensorState::Disengaged
        );

        handle.set_bolt(BoltSensorState::Engaged);
        assert_eq!(actuator.read_bolt_sensor().unwrap(), BoltSensorState::Engaged);
        assert!(handle.drive_history().is_empty());
    }
}
