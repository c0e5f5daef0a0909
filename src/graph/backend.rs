//! Seam between the graph client and a concrete graph database driver.
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::value::{Params, RecordSet};
use crate::error::BackendError;

/// Requested session access mode.
///
/// Informational only: backends may log it but a `Read` session is not
/// prevented from running writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Read-shaped work.
    Read,
    /// Write-shaped work.
    #[default]
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => f.write_str("READ"),
            AccessMode::Write => f.write_str("WRITE"),
        }
    }
}

/// Shared connection handle to a graph database.
///
/// One instance lives for the whole process and is shared read-only by all
/// concurrent sessions.
#[async_trait]
pub trait GraphBackend: Send + Sync + 'static {
    /// Short backend name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Opens a session for one logical operation.
    async fn open_session(
        &self,
        mode: AccessMode,
    ) -> Result<Box<dyn BackendSession>, BackendError>;

    /// Releases driver resources at process shutdown.
    async fn shutdown(&self) {}
}

/// Scoped backend resource obtained per logical operation.
///
/// Callers must call [`BackendSession::close`] on every exit path.
#[async_trait]
pub trait BackendSession: Send {
    /// Runs one statement and returns its normalized rows.
    async fn run(&mut self, query: &str, params: &Params) -> Result<RecordSet, BackendError>;

    /// Releases the session.
    async fn close(self: Box<Self>) -> Result<(), BackendError>;
}
