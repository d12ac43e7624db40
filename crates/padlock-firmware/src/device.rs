//! The tick loop.
//!
//! [`Padlock`] is the single consumer of both mailboxes. Each step handles
//! at most one keypad press and one wireless command, then advances the
//! controller by one tick.

use crate::{
    config::TimingConfig,
    controller::{AccessController, AttemptSource},
    inbox::FrameInbox,
    keypad::{KeypadOutcome, KeypadSession},
    mailbox::Mailbox,
    publisher::StatusTransport,
};
use padlock_core::Button;
use padlock_hardware::{DriveLines, IndicatorPins, SensorInputs};
use padlock_protocol::Command;
use padlock_storage::RecordStore;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// A running padlock.
#[derive(Debug)]
pub struct Padlock<R, D, S, L, T> {
    controller: AccessController<R, D, S, L, T>,
    session: KeypadSession,
    buttons: Mailbox<Button>,
    commands: Mailbox<Command>,
    period: Duration,
}

impl<R, D, S, L, T> Padlock<R, D, S, L, T>
where
    R: RecordStore,
    D: DriveLines,
    S: SensorInputs,
    L: IndicatorPins,
    T: StatusTransport,
{
    pub fn new(controller: AccessController<R, D, S, L, T>, timing: &TimingConfig) -> Self {
        Self {
            controller,
            session: KeypadSession::new(timing.keypad_timeout_ticks),
            buttons: Mailbox::new(),
            commands: Mailbox::new(),
            period: timing.scan_period(),
        }
    }

    /// Mailbox the keypad producer posts presses to.
    pub fn button_mailbox(&self) -> Mailbox<Button> {
        self.buttons.clone()
    }

    /// Entry point for the link layer's command writes.
    pub fn frame_inbox(&self) -> FrameInbox {
        FrameInbox::new(self.commands.clone())
    }

    /// Run one scan period's worth of work.
    pub async fn step(&mut self) {
        if let Some(button) = self.buttons.take() {
            let outcome = self.session.on_button(button);
            if outcome.is_activity() {
                self.controller.note_keypad_activity();
            }
            if let KeypadOutcome::Completed(candidate) = outcome {
                self.controller
                    .submit_candidate(&candidate, AttemptSource::Keypad);
            }
        }

        if self.session.scan() {
            debug!("Keypad entry timed out");
        }

        if let Some(command) = self.commands.take() {
            let opcode = command.opcode();
            if let Err(e) = self.controller.handle_command(command).await {
                warn!("{} command failed: {}", opcode, e);
            }
        }

        self.controller.tick().await;
    }

    /// Step once per scan period until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Padlock running, scan period {:?}", self.period);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => self.step().await,
            }
        }
        info!("Padlock stopped after {} ticks", self.controller.ticks());
    }

    pub fn controller(&self) -> &AccessController<R, D, S, L, T> {
        &self.controller
    }

    pub fn session(&self) -> &KeypadSession {
        &self.session
    }
}
