//! Error types for the sanitizer engine

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The engine cannot run with the supplied configuration, e.g. tokenization
    /// is reachable but no HMAC secret was provided.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub(crate) fn missing_secret() -> Self {
        Error::Configuration("tokenization requires a non-empty HMAC secret".to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
