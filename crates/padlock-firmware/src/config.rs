//! Firmware configuration.
//!
//! All timeouts are counted in ticks of the fixed scan period, never in wall
//! clock time. With the default 10 ms period:
//!
//! | Setting | Ticks | Time |
//! |---|---|---|
//! | `drive_pulse_ticks` | 50 | 500 ms |
//! | `keypad_timeout_ticks` | 1000 | 10 s |
//! | `auto_close_ticks` | 500 | 5 s |
//! | `reclose_grace_ticks` | 300 | 3 s |
//! | `indicator_flash_ticks` | 30 | 300 ms |
//! | `power_blink_ticks` | 50 | 500 ms |
//!
//! ```
//! use padlock_firmware::{PadlockConfig, TimingConfig};
//!
//! let config = PadlockConfig::default()
//!     .with_timing(TimingConfig::default().with_auto_close_ticks(200));
//! assert!(config.validate().is_ok());
//! assert_eq!(config.timing.drive_pulse_ticks, 50);
//! ```

use crate::error::{FirmwareError, Result};
use padlock_storage::DatabaseConfig;
use serde::Deserialize;
use std::time::Duration;

/// Tick-counted timing of every firmware component.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Period of the scan tick, in milliseconds.
    pub scan_period_ms: u64,
    /// Length of one bolt drive pulse.
    pub drive_pulse_ticks: u32,
    /// Inactivity after which a partial keypad entry is discarded.
    pub keypad_timeout_ticks: u32,
    /// Countdown to automatic re-close while auto-close is enabled.
    pub auto_close_ticks: u32,
    /// Re-close delay while auto-close is disabled and no engagement was seen.
    pub reclose_grace_ticks: u32,
    /// Length of a failure/activity flash.
    pub indicator_flash_ticks: u32,
    /// Half period of the charged-battery blink.
    pub power_blink_ticks: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scan_period_ms: 10,
            drive_pulse_ticks: 50,
            keypad_timeout_ticks: 1000,
            auto_close_ticks: 500,
            reclose_grace_ticks: 300,
            indicator_flash_ticks: 30,
            power_blink_ticks: 50,
        }
    }
}

impl TimingConfig {
    pub fn scan_period(&self) -> Duration {
        Duration::from_millis(self.scan_period_ms)
    }

    pub fn with_scan_period_ms(mut self, ms: u64) -> Self {
        self.scan_period_ms = ms;
        self
    }

    pub fn with_drive_pulse_ticks(mut self, ticks: u32) -> Self {
        self.drive_pulse_ticks = ticks;
        self
    }

    pub fn with_keypad_timeout_ticks(mut self, ticks: u32) -> Self {
        self.keypad_timeout_ticks = ticks;
        self
    }

    pub fn with_auto_close_ticks(mut self, ticks: u32) -> Self {
        self.auto_close_ticks = ticks;
        self
    }

    pub fn with_reclose_grace_ticks(mut self, ticks: u32) -> Self {
        self.reclose_grace_ticks = ticks;
        self
    }

    pub fn with_indicator_flash_ticks(mut self, ticks: u32) -> Self {
        self.indicator_flash_ticks = ticks;
        self
    }

    pub fn with_power_blink_ticks(mut self, ticks: u32) -> Self {
        self.power_blink_ticks = ticks;
        self
    }

    /// Reject zero periods and tick counts, and reclose delays that would
    /// end before the opening pulse.
    ///
    /// # Errors
    ///
    /// Returns `FirmwareError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.scan_period_ms == 0 {
            return Err(FirmwareError::config("scan_period_ms must be at least 1"));
        }

        let counts = [
            ("drive_pulse_ticks", self.drive_pulse_ticks),
            ("keypad_timeout_ticks", self.keypad_timeout_ticks),
            ("auto_close_ticks", self.auto_close_ticks),
            ("reclose_grace_ticks", self.reclose_grace_ticks),
            ("indicator_flash_ticks", self.indicator_flash_ticks),
            ("power_blink_ticks", self.power_blink_ticks),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(FirmwareError::config(format!("{name} must be at least 1")));
            }
        }

        let delays = [
            ("auto_close_ticks", self.auto_close_ticks),
            ("reclose_grace_ticks", self.reclose_grace_ticks),
        ];
        for (name, value) in delays {
            if value <= self.drive_pulse_ticks {
                return Err(FirmwareError::config(format!(
                    "{name} ({value}) must exceed drive_pulse_ticks ({})",
                    self.drive_pulse_ticks
                )));
            }
        }
        Ok(())
    }
}

/// Top-level firmware configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PadlockConfig {
    pub timing: TimingConfig,
    pub storage: DatabaseConfig,
}

impl PadlockConfig {
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_storage(mut self, storage: DatabaseConfig) -> Self {
        self.storage = storage;
        self
    }

    /// # Errors
    ///
    /// Returns `FirmwareError::Config` for invalid timing or storage settings.
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        self.storage
            .validate()
            .map_err(|e| FirmwareError::config(e.to_string()))
    }
}
