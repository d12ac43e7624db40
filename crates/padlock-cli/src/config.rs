//! Emulator configuration file.
//!
//! ```toml
//! [link]
//! listen_addr = "127.0.0.1:4100"
//!
//! [timing]
//! scan_period_ms = 10
//! auto_close_ticks = 500
//!
//! [storage]
//! database_path = "padlock.db"
//! ```
//!
//! Every section and key is optional.

use crate::link::LinkConfig;
use anyhow::{Context, Result};
use padlock_firmware::PadlockConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub link: LinkConfig,
    #[serde(flatten)]
    pub padlock: PadlockConfig,
}

impl EmulatorConfig {
    /// Load and validate `path`, or the defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.padlock.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the TOML parse error.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
