//! Access decision and re-close policy.
//!
//! The [`AccessController`] owns every stateful component of the device: the
//! key store, the actuator, the status lights and the status publisher. All
//! of its methods run on the tick loop, one at a time.
//!
//! # States
//!
//! - `Idle`: bolt closed or being closed, waiting for a candidate key
//! - `Unlocked`: bolt opened, waiting to re-close
//!
//! # Re-close Policy
//!
//! While `Unlocked`, each tick applies the first rule that matches:
//!
//! 1. The bolt sensor changed to engaged: back to `Idle`, no drive pulse.
//! 2. An auto-close countdown is running: count down, close when it reaches 0.
//! 3. Otherwise: count grace ticks, close after `reclose_grace_ticks`.
//!
//! The countdown is armed when access is granted with auto-close enabled.
//!
//! ```text
//! Idle ──(key match)──▶ Unlocked ──(engaged edge | countdown | grace)──▶ Idle
//!                         ▲   │
//!                         └───┘ (key match re-arms)
//! ```

use crate::{
    config::TimingConfig,
    error::Result,
    publisher::{StatusPublisher, StatusTransport},
};
use padlock_core::{
    AccessKey, BoltSensorState, DeviceStatus, Indicator, InputSample,
    constants::BATTERY_CHARGED_THRESHOLD, scale_battery,
};
use padlock_hardware::{DriveLines, IndicatorPins, LockActuator, SensorInputs, StatusIndicator};
use padlock_protocol::{Command, UnlockGate};
use padlock_storage::{KeyStore, RecordStore};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, warn};

/// Maximum number of state transitions kept for inspection.
const MAX_HISTORY_SIZE: usize = 32;

/// Controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    #[default]
    Idle,
    Unlocked,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Idle => write!(f, "Idle"),
            ControllerState::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// Where a candidate key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptSource {
    Keypad,
    Wireless,
}

impl fmt::Display for AttemptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptSource::Keypad => write!(f, "keypad"),
            AttemptSource::Wireless => write!(f, "wireless"),
        }
    }
}

/// Result of one unlock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Key matched and the opening pulse started.
    Granted,
    /// Key did not match.
    Denied,
    /// Key matched but the drive lines could not be written.
    Faulted,
}

/// What a wireless command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Attempt(AttemptOutcome),
    /// Conditional unlock while auto-close is disabled.
    Ignored,
    KeyUpdated,
    AutoCloseUpdated(bool),
}

/// Why the controller changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    Granted(AttemptSource),
    BoltEngaged,
    AutoCloseElapsed,
    GraceElapsed,
}

impl fmt::Display for TransitionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionCause::Granted(source) => write!(f, "access granted via {}", source),
            TransitionCause::BoltEngaged => write!(f, "bolt engaged"),
            TransitionCause::AutoCloseElapsed => write!(f, "auto-close elapsed"),
            TransitionCause::GraceElapsed => write!(f, "re-close grace elapsed"),
        }
    }
}

/// Record of a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: ControllerState,
    pub to: ControllerState,
    pub cause: TransitionCause,
    /// Tick count at which the transition happened.
    pub tick: u64,
}

/// Decides access and runs the re-close policy.
///
/// # Examples
///
/// ```
/// use padlock_core::AccessKey;
/// use padlock_firmware::{
///     AccessController, AttemptOutcome, AttemptSource, ControllerState, MockTransport,
///     NotifyGate, StatusPublisher, TimingConfig,
/// };
/// use padlock_hardware::{LockActuator, StatusIndicator, mock::MockBoard};
/// use padlock_storage::{KeyStore, MemoryRecordStore};
///
/// # async fn example() -> padlock_firmware::Result<()> {
/// let (board, handle) = MockBoard::new();
/// let (transport, _sent) = MockTransport::new();
/// let timing = TimingConfig::default();
///
/// let mut controller = AccessController::new(
///     KeyStore::open(MemoryRecordStore::new()).await?,
///     LockActuator::new(board.clone(), board.clone(), timing.drive_pulse_ticks),
///     StatusIndicator::new(board),
///     StatusPublisher::new(transport, NotifyGate::new()),
///     timing,
/// );
///
/// let outcome = controller.submit_candidate(&AccessKey::default(), AttemptSource::Keypad);
/// assert_eq!(outcome, AttemptOutcome::Granted);
/// assert_eq!(controller.state(), ControllerState::Unlocked);
/// assert_eq!(handle.open_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AccessController<R, D, S, L, T> {
    store: KeyStore<R>,
    actuator: LockActuator<D, S>,
    indicator: StatusIndicator<L>,
    publisher: StatusPublisher<T>,
    timing: TimingConfig,
    state: ControllerState,
    countdown: u32,
    grace: u32,
    inputs: InputSample,
    battery_raw: u16,
    last_bolt: Option<BoltSensorState>,
    ticks: u64,
    history: VecDeque<StateTransition>,
}

impl<R, D, S, L, T> AccessController<R, D, S, L, T>
where
    R: RecordStore,
    D: DriveLines,
    S: SensorInputs,
    L: IndicatorPins,
    T: StatusTransport,
{
    pub fn new(
        store: KeyStore<R>,
        actuator: LockActuator<D, S>,
        indicator: StatusIndicator<L>,
        publisher: StatusPublisher<T>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            store,
            actuator,
            indicator,
            publisher,
            timing,
            state: ControllerState::Idle,
            countdown: 0,
            grace: 0,
            inputs: InputSample::default(),
            battery_raw: 0,
            last_bolt: None,
            ticks: 0,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Compare a candidate key against the stored key and act on the result.
    ///
    /// A match starts the opening pulse, lights the success indicator for the
    /// pulse and enters `Unlocked`, re-arming the re-close timers if already
    /// there. A mismatch flashes the failure indicator.
    pub fn submit_candidate(&mut self, candidate: &AccessKey, source: AttemptSource) -> AttemptOutcome {
        // AccessKey equality is constant time.
        if *candidate != self.store.get_key() {
            info!("Access denied ({})", source);
            self.flash(Indicator::Failure);
            return AttemptOutcome::Denied;
        }

        if let Err(e) = self.actuator.open() {
            warn!("Failed to drive bolt open: {}", e);
            self.flash(Indicator::Failure);
            return AttemptOutcome::Faulted;
        }

        if let Err(e) = self
            .indicator
            .flash(Indicator::Success, self.timing.drive_pulse_ticks)
        {
            warn!("Failed to light success indicator: {}", e);
        }

        self.countdown = if self.store.get_auto_close() {
            self.timing.auto_close_ticks
        } else {
            0
        };
        self.grace = 0;

        info!("Access granted ({})", source);
        self.transition(ControllerState::Unlocked, TransitionCause::Granted(source));
        AttemptOutcome::Granted
    }

    /// Apply one decoded wireless command.
    ///
    /// # Errors
    ///
    /// Returns the storage error of a rejected SetKey or SetAutoClose.
    pub async fn handle_command(&mut self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::AttemptUnlock { key, gate } => {
                if gate == UnlockGate::AutoCloseEnabled && !self.store.get_auto_close() {
                    debug!("Conditional unlock ignored while auto-close is disabled");
                    return Ok(CommandOutcome::Ignored);
                }
                Ok(CommandOutcome::Attempt(
                    self.submit_candidate(&key, AttemptSource::Wireless),
                ))
            }
            Command::SetKey(key) => {
                self.apply_set_key(key).await?;
                Ok(CommandOutcome::KeyUpdated)
            }
            Command::SetAutoClose(enabled) => {
                self.apply_set_auto_close(enabled).await?;
                Ok(CommandOutcome::AutoCloseUpdated(enabled))
            }
        }
    }

    /// Persist a new access key.
    ///
    /// Flashes the activity indicator on success and the failure indicator
    /// when the store rejects the write; the previous key stays in effect.
    ///
    /// # Errors
    ///
    /// Returns the storage error.
    pub async fn apply_set_key(&mut self, key: AccessKey) -> Result<()> {
        match self.store.set_key(key).await {
            Ok(()) => {
                self.flash(Indicator::Activity);
                Ok(())
            }
            Err(e) => {
                warn!("Key update rejected: {}", e);
                self.flash(Indicator::Failure);
                Err(e.into())
            }
        }
    }

    /// Persist the auto-close flag.
    ///
    /// Takes effect at the next grant; a running countdown is left alone.
    ///
    /// # Errors
    ///
    /// Returns the storage error.
    pub async fn apply_set_auto_close(&mut self, enabled: bool) -> Result<()> {
        if let Err(e) = self.store.set_auto_close(enabled).await {
            warn!("Auto-close update rejected: {}", e);
            self.flash(Indicator::Failure);
            return Err(e.into());
        }
        Ok(())
    }

    /// Flash the activity indicator for a keypad press.
    pub fn note_keypad_activity(&mut self) {
        self.flash(Indicator::Activity);
    }

    /// Advance every timer by one tick and publish the resulting status.
    ///
    /// Hardware and transport faults are logged and never stop the tick. A
    /// failed input read keeps the last good sample.
    pub async fn tick(&mut self) {
        self.ticks += 1;

        if let Err(e) = self.actuator.tick() {
            warn!("Failed to release drive lines: {}", e);
        }
        if let Err(e) = self.indicator.tick() {
            warn!("Failed to update indicators: {}", e);
        }

        self.sample_inputs();

        let bolt = self.inputs.bolt();
        let engaged_edge =
            bolt.is_engaged() && self.last_bolt.is_some_and(|last| !last.is_engaged());
        self.last_bolt = Some(bolt);

        if self.state == ControllerState::Unlocked {
            self.advance_reclose(engaged_edge);
        }

        let battery = scale_battery(self.battery_raw);
        self.update_power_light(battery);

        let status = DeviceStatus::compose(self.inputs, battery);
        if let Err(e) = self.publisher.update(status).await {
            warn!("Status notification failed: {}", e);
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Status value a peer read returns.
    pub fn status(&self) -> DeviceStatus {
        self.publisher.latest()
    }

    /// Ticks left before auto-close, 0 when no countdown is armed.
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Most recent transitions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &StateTransition> {
        self.history.iter()
    }

    pub fn store(&self) -> &KeyStore<R> {
        &self.store
    }

    pub fn actuator(&self) -> &LockActuator<D, S> {
        &self.actuator
    }

    pub fn indicator(&self) -> &StatusIndicator<L> {
        &self.indicator
    }

    pub fn publisher(&self) -> &StatusPublisher<T> {
        &self.publisher
    }

    fn sample_inputs(&mut self) {
        match self.actuator.sample_inputs() {
            Ok(sample) => self.inputs = sample,
            Err(e) => warn!("Input sample failed, keeping last: {}", e),
        }
        match self.actuator.battery_raw() {
            Ok(raw) => self.battery_raw = raw,
            Err(e) => warn!("Battery sample failed, keeping last: {}", e),
        }
    }

    fn advance_reclose(&mut self, engaged_edge: bool) {
        if engaged_edge {
            self.countdown = 0;
            self.transition(ControllerState::Idle, TransitionCause::BoltEngaged);
            return;
        }

        let due = if self.countdown > 0 {
            self.countdown -= 1;
            (self.countdown == 0).then_some(TransitionCause::AutoCloseElapsed)
        } else {
            self.grace = self.grace.saturating_add(1);
            (self.grace >= self.timing.reclose_grace_ticks).then_some(TransitionCause::GraceElapsed)
        };

        let Some(cause) = due else {
            return;
        };

        // The opening pulse always runs to completion; close once it ends.
        if self.actuator.is_driving() {
            self.countdown = 0;
            self.grace = self.timing.reclose_grace_ticks;
            return;
        }

        match self.actuator.close() {
            Ok(()) => self.transition(ControllerState::Idle, cause),
            Err(e) => {
                warn!("Failed to drive bolt closed: {}", e);
                // Retry on the next tick.
                self.countdown = 0;
                self.grace = self.timing.reclose_grace_ticks;
            }
        }
    }

    fn update_power_light(&mut self, battery: u16) {
        let on = if !self.inputs.external_power() {
            false
        } else if battery > BATTERY_CHARGED_THRESHOLD {
            let half_period = u64::from(self.timing.power_blink_ticks.max(1));
            (self.ticks / half_period) % 2 == 0
        } else {
            true
        };

        if self.indicator.is_lit(Indicator::Power) != on {
            if let Err(e) = self.indicator.set(Indicator::Power, on) {
                warn!("Failed to update power indicator: {}", e);
            }
        }
    }

    fn flash(&mut self, indicator: Indicator) {
        if let Err(e) = self
            .indicator
            .flash(indicator, self.timing.indicator_flash_ticks)
        {
            warn!("Failed to flash {} indicator: {}", indicator, e);
        }
    }

    fn transition(&mut self, to: ControllerState, cause: TransitionCause) {
        let from = self.state;
        self.state = to;
        if from == to {
            return;
        }

        debug!("State transition: {} -> {} ({})", from, to, cause);
        if self.history.len() == MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(StateTransition {
            from,
            to,
            cause,
            tick: self.ticks,
        });
    }
}
