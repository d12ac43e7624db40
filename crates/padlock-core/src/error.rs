use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Access key must be {expected} symbols, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid button index: {index}")]
    InvalidButton { index: u8 },

    #[error("Invalid indicator index: {index}")]
    InvalidIndicator { index: u8 },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
