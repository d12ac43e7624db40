//! Four-light status indicator with tick-counted flashes.

use crate::{
    error::{HardwareError, Result},
    traits::IndicatorPins,
};
use padlock_core::{Indicator, constants::INDICATOR_COUNT};

const LIGHTS: usize = INDICATOR_COUNT as usize;

/// Drives the status lights.
///
/// A flash turns a light on and schedules it off after a number of ticks;
/// [`set`](Self::set) cancels any pending flash on that light.
#[derive(Debug)]
pub struct StatusIndicator<L> {
    pins: L,
    lit: [bool; LIGHTS],
    flash_remaining: [u32; LIGHTS],
}

impl<L: IndicatorPins> StatusIndicator<L> {
    pub fn new(pins: L) -> Self {
        Self {
            pins,
            lit: [false; LIGHTS],
            flash_remaining: [0; LIGHTS],
        }
    }

    /// Switch a light on or off, cancelling any pending flash.
    ///
    /// # Errors
    ///
    /// Returns an error if the output could not be written.
    pub fn set(&mut self, indicator: Indicator, on: bool) -> Result<()> {
        let slot = usize::from(indicator.index());
        self.flash_remaining[slot] = 0;
        self.pins.set(indicator, on)?;
        self.lit[slot] = on;
        Ok(())
    }

    /// Light `indicator` for `ticks` ticks (at least one).
    ///
    /// # Errors
    ///
    /// Returns an error if the output could not be written.
    pub fn flash(&mut self, indicator: Indicator, ticks: u32) -> Result<()> {
        self.set(indicator, true)?;
        self.flash_remaining[usize::from(indicator.index())] = ticks.max(1);
        Ok(())
    }

    /// Set a light by raw output index.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidArgument` for an index above 3.
    pub fn set_raw(&mut self, index: u8, on: bool) -> Result<()> {
        let indicator = Indicator::from_index(index)
            .map_err(|e| HardwareError::invalid_argument(e.to_string()))?;
        self.set(indicator, on)
    }

    /// Age pending flashes and switch off the ones that expired.
    ///
    /// Every light is processed even if one write fails; the first error is
    /// returned and the failed light is retried next tick.
    ///
    /// # Errors
    ///
    /// Returns the first output error encountered.
    pub fn tick(&mut self) -> Result<()> {
        let mut first_error = None;

        for indicator in Indicator::ALL {
            let slot = usize::from(indicator.index());
            if self.flash_remaining[slot] == 0 {
                continue;
            }

            self.flash_remaining[slot] -= 1;
            if self.flash_remaining[slot] > 0 {
                continue;
            }

            match self.pins.set(indicator, false) {
                Ok(()) => self.lit[slot] = false,
                Err(e) => {
                    self.flash_remaining[slot] = 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    pub fn is_lit(&self, indicator: Indicator) -> bool {
        self.lit[usize::from(indicator.index())]
    }

    pub fn is_flashing(&self, indicator: Indicator) -> bool {
        self.flash_remaining[usize::from(indicator.index())] > 0
    }
}
