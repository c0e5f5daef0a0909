//! Query execution and degradation control.
//!
//! [`GraphClient::execute`] is the single entry point for graph statements.
//! It acquires a session, runs the statement, and always releases the
//! session. Backend failures are signalled internally as [`BackendError`],
//! latch the client into degraded mode, and are answered with mock records
//! for the same query text. Callers only ever see [`GraphError`] for
//! malformed input rejected before a session is acquired.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::backend::{AccessMode, GraphBackend};
use super::mock::MockGenerator;
use super::neo4j::Neo4jBackend;
use super::session::Session;
use super::state::{ConnectionMode, ConnectionState};
use super::value::{Params, RecordSet};
use crate::config::GraphConfig;
use crate::error::{BackendError, GraphError, Result};

/// Default bound on session acquisition.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(2_000);

const PROBE_QUERY: &str = "RETURN 1";

/// Graph client shared by every request handler.
pub struct GraphClient {
    state: Arc<ConnectionState>,
    mock: MockGenerator,
    acquire_timeout: Duration,
}

impl GraphClient {
    /// Client over an existing connection state.
    pub fn new(state: Arc<ConnectionState>) -> Self {
        Self {
            state,
            mock: MockGenerator::default(),
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Healthy client over `backend`.
    pub fn with_backend(backend: Arc<dyn GraphBackend>) -> Self {
        Self::new(Arc::new(ConnectionState::with_backend(backend)))
    }

    /// Client that serves mock records only.
    pub fn mock_only() -> Self {
        Self::new(Arc::new(ConnectionState::without_backend()))
    }

    /// Builds the real backend from configuration.
    ///
    /// Construction failures are logged and produce a client that starts
    /// degraded; this never fails.
    pub async fn connect(config: &GraphConfig) -> Self {
        let timeout = config.acquire_timeout();
        if config.force_mock {
            info!("graph backend disabled by configuration; serving mock data");
            return Self::mock_only().acquire_timeout(timeout);
        }
        match tokio::time::timeout(timeout, Neo4jBackend::connect(config)).await {
            Ok(Ok(backend)) => {
                info!(uri = %config.uri, "graph backend ready");
                Self::with_backend(Arc::new(backend)).acquire_timeout(timeout)
            }
            Ok(Err(err)) => {
                warn!(uri = %config.uri, error = %err, "could not create graph driver; falling back to mock");
                Self::mock_only().acquire_timeout(timeout)
            }
            Err(_) => {
                warn!(uri = %config.uri, ?timeout, "graph driver construction timed out; falling back to mock");
                Self::mock_only().acquire_timeout(timeout)
            }
        }
    }

    /// Overrides the session acquisition bound.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Overrides the mock generator.
    pub fn mock_generator(mut self, mock: MockGenerator) -> Self {
        self.mock = mock;
        self
    }

    /// Shared connection state.
    pub fn state(&self) -> &Arc<ConnectionState> {
        &self.state
    }

    /// Whether statements are being served from mock data.
    pub fn is_degraded(&self) -> bool {
        self.state.is_degraded()
    }

    /// Current operating mode.
    pub fn mode(&self) -> ConnectionMode {
        self.state.mode()
    }

    /// Hands out a session for one logical operation.
    ///
    /// Returns a stand-in when degraded or when opening a real session
    /// fails; in the latter case the client degrades first. Never fails.
    pub async fn acquire_session(&self, mode: AccessMode) -> Session<'_> {
        let Some(backend) = self.state.usable_handle() else {
            return self.stand_in();
        };
        match self.open_live(backend.as_ref(), mode).await {
            Ok(session) => session,
            Err(err) => {
                self.latch(backend.name(), &err);
                self.stand_in()
            }
        }
    }

    /// Executes `query` with write-mode semantics.
    pub async fn execute(&self, query: &str, params: &Params) -> Result<RecordSet> {
        self.execute_with_mode(query, params, AccessMode::Write).await
    }

    /// Executes `query` in the given access mode.
    ///
    /// Errors only for malformed input; backend failures yield mock records.
    pub async fn execute_with_mode(
        &self,
        query: &str,
        params: &Params,
        mode: AccessMode,
    ) -> Result<RecordSet> {
        validate(query, params)?;
        let mut session = self.acquire_session(mode).await;
        let outcome = session.run(query, params).await;
        let records = match outcome {
            Ok(records) => records,
            Err(err) => self.absorb(query, &err),
        };
        if let Err(err) = session.close().await {
            debug!(error = %err, "ignoring session release failure");
        }
        Ok(records)
    }

    /// Runs a trivial statement through [`GraphClient::execute`].
    ///
    /// Always reports ready: mock answers count as a working graph layer.
    /// Use [`GraphClient::is_degraded`] to learn which path served it.
    pub async fn test_connection(&self) -> bool {
        if let Err(err) = self.execute(PROBE_QUERY, &Params::new()).await {
            debug!(error = %err, "connection probe rejected");
        }
        true
    }

    /// Explicitly clears the degradation latch and probes the backend.
    ///
    /// A failing probe latches the client again. Returns `true` when the
    /// client ends up healthy. Without a backend handle this is a no-op.
    pub async fn reinitialize(&self) -> bool {
        if !self.state.reset() {
            return false;
        }
        info!("graph backend reinitialized; probing");
        self.test_connection().await;
        !self.is_degraded()
    }

    /// Releases the backend driver and latches into degraded mode, so later
    /// statements are answered without touching the released driver.
    pub async fn shutdown(&self) {
        if let Some(backend) = self.state.handle() {
            backend.shutdown().await;
            self.state.degrade();
            debug!(backend = backend.name(), "graph backend shut down");
        }
    }

    async fn open_live(
        &self,
        backend: &dyn GraphBackend,
        mode: AccessMode,
    ) -> std::result::Result<Session<'_>, BackendError> {
        let opened = tokio::time::timeout(self.acquire_timeout, backend.open_session(mode))
            .await
            .map_err(|_| BackendError::AcquireTimeout(self.acquire_timeout))??;
        Ok(Session::Live {
            inner: opened,
            mode,
        })
    }

    fn stand_in(&self) -> Session<'_> {
        Session::StandIn { mock: &self.mock }
    }

    fn absorb(&self, query: &str, err: &BackendError) -> RecordSet {
        let backend = self.state.handle().map_or("none", |b| b.name());
        warn!(backend, code = err.code(), error = %err, "graph query failed");
        self.latch(backend, err);
        self.mock.generate(query)
    }

    fn latch(&self, backend: &str, err: &BackendError) {
        if self.state.degrade() {
            warn!(backend, code = err.code(), "switching to mock mode for subsequent queries");
        }
    }
}

fn validate(query: &str, params: &Params) -> Result<()> {
    if query.trim().is_empty() {
        return Err(GraphError::EmptyQuery);
    }
    if let Some(name) = params.keys().find(|name| !is_parameter_name(name)) {
        return Err(GraphError::InvalidParameterName(name.clone()));
    }
    Ok(())
}

fn is_parameter_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
