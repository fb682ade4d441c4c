//! Error types for the DDNS reconciler
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

use crate::context::ContextError;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed source error carried by transport failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for the DDNS reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied parameter violates a precondition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The active credential variant has blank fields at request time
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    /// The remote service answered with a non-2xx HTTP status
    #[error("{operation} failed: {status} {reason}")]
    UpstreamStatus {
        /// Operation that issued the request
        operation: String,
        /// Numeric HTTP status
        status: u16,
        /// Canonical reason phrase for the status
        reason: String,
    },

    /// Zone lookup matched nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider answered 2xx but flagged the envelope unsuccessful
    #[error("{operation} unsuccessful: {message}")]
    OperationFailed {
        /// Operation that issued the request
        operation: String,
        /// Provider error messages, joined
        message: String,
    },

    /// The response body is not the expected JSON shape
    #[error("{operation}: failed to decode response: {source}")]
    Decode {
        /// Operation that issued the request
        operation: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// Network-level failure (DNS, connect, TLS, body read)
    #[error("{operation}: transport error: {source}")]
    Transport {
        /// Operation that issued the request
        operation: String,
        /// Underlying transport error
        #[source]
        source: BoxError,
    },

    /// The run's context was cancelled or its deadline passed
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The IP echo service body is not an IPv4 address
    #[error("Invalid IPv4 response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an upstream status error
    pub fn upstream_status(operation: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::UpstreamStatus {
            operation: operation.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Create an operation failed error
    pub fn operation_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(operation: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            operation: operation.into(),
            source,
        }
    }

    /// Create a transport error
    pub fn transport(operation: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// True when the run's deadline expired
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Context(ContextError::DeadlineExceeded))
    }

    /// True when the run was cancelled from outside
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Context(ContextError::Cancelled))
    }
}
