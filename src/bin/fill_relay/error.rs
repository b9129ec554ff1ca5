//! Error types for the fill relay binary.

use crate::config::ConfigError;

/// Startup error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
