//! Keypad entry session.
//!
//! A session starts with ENTER and collects six direction presses into a
//! candidate key. Presses before ENTER are ignored. ENTER during a session
//! starts over. A session that sees no press for more than `timeout_ticks`
//! scans is discarded.

use padlock_core::{AccessKey, Button, constants::KEY_LENGTH};
use std::fmt;

/// Result of feeding one press into a [`KeypadSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadOutcome {
    /// Direction press outside a session.
    Ignored,
    /// ENTER opened a fresh session.
    Started,
    /// Symbol appended; `entered` symbols are now buffered.
    Accepted { entered: usize },
    /// Sixth symbol appended; the session is closed.
    Completed(AccessKey),
}

impl KeypadOutcome {
    /// Whether the press was taken up by a session.
    pub fn is_activity(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Keypad session state.
#[derive(Clone)]
pub struct KeypadSession {
    buffer: [u8; KEY_LENGTH],
    entered: usize,
    active: bool,
    idle_ticks: u32,
    timeout_ticks: u32,
}

impl KeypadSession {
    /// Create an idle session with the given inactivity timeout in scans.
    pub fn new(timeout_ticks: u32) -> Self {
        Self {
            buffer: [0; KEY_LENGTH],
            entered: 0,
            active: false,
            idle_ticks: 0,
            timeout_ticks: timeout_ticks.max(1),
        }
    }

    pub fn on_button(&mut self, button: Button) -> KeypadOutcome {
        let Some(symbol) = button.symbol() else {
            self.clear();
            self.active = true;
            return KeypadOutcome::Started;
        };

        if !self.active {
            return KeypadOutcome::Ignored;
        }

        self.buffer[self.entered] = symbol.as_u8();
        self.entered += 1;
        self.idle_ticks = 0;

        if self.entered == KEY_LENGTH {
            let candidate = AccessKey::new(self.buffer);
            self.clear();
            KeypadOutcome::Completed(candidate)
        } else {
            KeypadOutcome::Accepted {
                entered: self.entered,
            }
        }
    }

    /// Advance the inactivity timer by one scan.
    ///
    /// Returns `true` when this scan expired an open session.
    pub fn scan(&mut self) -> bool {
        if !self.active {
            return false;
        }

        self.idle_ticks += 1;
        if self.idle_ticks > self.timeout_ticks {
            self.clear();
            return true;
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn entered(&self) -> usize {
        self.entered
    }

    fn clear(&mut self) {
        self.buffer = [0; KEY_LENGTH];
        self.entered = 0;
        self.active = false;
        self.idle_ticks = 0;
    }
}

impl fmt::Debug for KeypadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypadSession")
            .field("active", &self.active)
            .field("entered", &self.entered)
            .field("idle_ticks", &self.idle_ticks)
            .field("timeout_ticks", &self.timeout_ticks)
            .finish_non_exhaustive()
    }
}
