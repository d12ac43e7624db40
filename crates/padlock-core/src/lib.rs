//! Shared vocabulary for the padlock firmware workspace.
//!
//! Everything the other crates exchange lives here: the access key and its
//! symbols, keypad buttons, the raw input sample read from the board, the
//! packed device status word, and the four status indicators. Protocol and
//! board constants live in [`constants`].

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
