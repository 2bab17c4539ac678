/*!
 * Error types for the storycast application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors raised by a content source
///
/// The variants matter to callers: an authentication problem, a missing
/// thread and a transient outage are handled differently, and none of them
/// is ever reported as an empty result.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Credentials rejected or access forbidden
    #[error("Source rejected the request: {0}")]
    Unauthorized(String),

    /// The requested thread or listing does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Temporary failure (network, 5xx, rate limiting)
    #[error("Transient source failure: {0}")]
    Transient(String),

    /// The source answered but the payload could not be decoded
    #[error("Failed to parse source response: {0}")]
    Parse(String),
}

/// Errors that can occur while rendering narration audio or caption images
#[derive(Error, Debug)]
pub enum EngineError {
    /// Error when making a request to the engine fails
    #[error("Render request failed: {0}")]
    RequestFailed(String),

    /// Error returned by the engine itself
    #[error("Engine responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the engine
        message: String,
    },

    /// The text to render was empty after preparation; permanently unusable
    #[error("Nothing to render: text was empty")]
    EmptyText,

    /// Error writing or probing the rendered asset
    #[error("Asset error: {0}")]
    Asset(String),

    /// The render exceeded its deadline
    #[error("Render timed out after {0}s")]
    Timeout(u64),
}

/// Errors that can occur in the persisted ledgers
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The store could not be written
    #[error("Failed to persist ledger {path}: {message}")]
    WriteFailed {
        /// Path of the store file
        path: String,
        /// Underlying failure
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the content source
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Error from a render engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Error from a persisted ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
