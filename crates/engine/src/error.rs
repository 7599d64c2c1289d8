//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] thrown when a text cannot be read as an expense amount.
//! - [`InvalidUsername`] thrown when a username is empty or too long.
//! - [`Store`] wraps every failure coming from a [`RecordStore`].
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidUsername`]: EngineError::InvalidUsername
//!  [`Store`]: EngineError::Store
//!  [`RecordStore`]: super::RecordStore
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid username: {0}")]
    InvalidUsername(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidUsername(a), Self::InvalidUsername(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Failures of a record store backend.
///
/// Backends map their own errors (HTTP, credentials, file system) into one of
/// these variants so the conversation layer only ever sees a generic failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed row: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
