use super::backend::{AccessMode, BackendSession};
use super::mock::MockGenerator;
use super::value::{Params, RecordSet};
use crate::error::BackendError;

/// Per-operation session handed out by the client.
///
/// A live session wraps a real backend session; a stand-in answers every
/// statement from the mock generator and owns nothing, so closing it is a
/// no-op.
pub enum Session<'c> {
    /// Backed by the real graph database.
    Live {
        /// Driver session.
        inner: Box<dyn BackendSession>,
        /// Mode requested at acquisition.
        mode: AccessMode,
    },
    /// Serves mock output.
    StandIn {
        /// Generator answering every statement.
        mock: &'c MockGenerator,
    },
}

impl Session<'_> {
    /// Whether this session talks to the real backend.
    pub fn is_live(&self) -> bool {
        matches!(self, Session::Live { .. })
    }

    /// Runs one statement.
    pub async fn run(&mut self, query: &str, params: &Params) -> Result<RecordSet, BackendError> {
        match self {
            Session::Live { inner, .. } => inner.run(query, params).await,
            Session::StandIn { mock } => {
                tracing::debug!(fingerprint = ?mock.classify(query), "serving mock records");
                Ok(mock.generate(query))
            }
        }
    }

    /// Releases the session.
    pub async fn close(self) -> Result<(), BackendError> {
        match self {
            Session::Live { inner, mode } => {
                tracing::trace!(%mode, "closing graph session");
                inner.close().await
            }
            Session::StandIn { .. } => Ok(()),
        }
    }
}
