//! Error types for the Galaxy3D render pass core
//!
//! This module defines the error types used throughout the crate,
//! covering pass construction, encode preconditions, resource resolution
//! and native API failures.

use std::fmt;

/// Result type for Galaxy3D render pass operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D render pass errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan API call rejected, handle creation failed, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer view without device buffer, sampler without texture, ...)
    InvalidResource(String),

    /// Initialization failed (render pass object could not be created)
    InitializationFailed(String),

    /// A precondition of the operation does not hold (missing attachment,
    /// command encoder already destroyed, pass in the wrong state)
    PreconditionFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::PreconditionFailed(msg) => write!(f, "Precondition failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
