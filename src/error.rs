use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias for caller-visible graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced to callers of the graph client.
///
/// Backend availability problems never show up here; they are absorbed by
/// the execution controller and reported through [`BackendError`] only.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Query text was blank.
    #[error("query text must not be empty")]
    EmptyQuery,
    /// A parameter name cannot be bound by the query language.
    #[error("invalid parameter name '{0}'")]
    InvalidParameterName(String),
    /// Reading a seed script failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
}

impl GraphError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::EmptyQuery => "EmptyQuery",
            GraphError::InvalidParameterName(_) => "InvalidParameterName",
            GraphError::Io { .. } => "Io",
        }
    }
}

/// Failures reported by a graph backend.
///
/// These travel between the backend, the session layer and the execution
/// controller. The controller turns every one of them into a degradation
/// transition plus mock output.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The driver could not be constructed or configured.
    #[error("failed to connect to graph backend: {0}")]
    Connect(String),
    /// Opening a session against the backend failed.
    #[error("failed to open session: {0}")]
    SessionOpen(String),
    /// Session acquisition did not finish in time.
    #[error("session acquisition timed out after {0:?}")]
    AcquireTimeout(Duration),
    /// A statement did not finish in time.
    #[error("query timed out after {0:?}")]
    QueryTimeout(Duration),
    /// The backend rejected or failed the statement.
    #[error("query failed: {0}")]
    Query(String),
    /// A result row could not be decoded.
    #[error("failed to decode result row: {0}")]
    Decode(String),
    /// Releasing the session failed.
    #[error("failed to close session: {0}")]
    Close(String),
    /// No backend handle exists.
    #[error("graph backend unavailable")]
    Unavailable,
}

impl BackendError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::Connect(_) => "Connect",
            BackendError::SessionOpen(_) => "SessionOpen",
            BackendError::AcquireTimeout(_) => "AcquireTimeout",
            BackendError::QueryTimeout(_) => "QueryTimeout",
            BackendError::Query(_) => "Query",
            BackendError::Decode(_) => "Decode",
            BackendError::Close(_) => "Close",
            BackendError::Unavailable => "Unavailable",
        }
    }
}
