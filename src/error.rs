//! Error types for bucketkv
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

use crate::protocol::Status;

/// Result type alias using BucketError
pub type Result<T> = std::result::Result<T, BucketError>;

/// Unified error type for bucketkv operations
#[derive(Debug, Error)]
pub enum BucketError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    // -------------------------------------------------------------------------
    // Wire Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Server-Reported Errors
    // -------------------------------------------------------------------------
    #[error("Operation failed with status {status} (code {})", .status.code())]
    Operation { status: Status },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BucketError {
    /// Build an error from a non-success server status
    pub fn operation(status: Status) -> Self {
        BucketError::Operation { status }
    }

    /// The server status carried by this error, if it is an operation failure
    pub fn status(&self) -> Option<Status> {
        match self {
            BucketError::Operation { status } => Some(*status),
            _ => None,
        }
    }

    /// True when the server answered key-not-found
    pub fn is_key_not_found(&self) -> bool {
        self.status() == Some(Status::KeyNotFound)
    }
}
