//! Error types and result aliases for the Forge library.
//!
//! This module defines the core error type [`ForgeError`] and the [`Result`] type alias
//! used throughout the crate. Exchange-level failures (remote errors, empty responses,
//! interrupted streams) are values the caller inspects and recovers from; only
//! [`ForgeError::ConfigError`] is meant to stop the process before a session starts.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Remote endpoint error: {0}")]
    RemoteError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Remote endpoint returned no content")]
    EmptyResponse,

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid turn: {0}")]
    InvalidTurn(String),

    #[error("Session is busy with another turn")]
    SessionBusy,

    #[error("Session has exited")]
    SessionClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ForgeError {
    /// Whether a conversation can carry on after this error.
    ///
    /// Everything except configuration problems and a closed session is
    /// scoped to a single exchange.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ForgeError::ConfigError(_) | ForgeError::SessionClosed)
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
