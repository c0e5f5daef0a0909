//! Process-wide connection state with a one-way degradation latch.
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::backend::GraphBackend;

/// Observable operating mode of the graph layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// The real backend is attempted for every statement.
    Healthy,
    /// Every statement is served by the mock generator.
    Degraded,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMode::Healthy => f.write_str("healthy"),
            ConnectionMode::Degraded => f.write_str("degraded"),
        }
    }
}

/// Connection handle plus degradation latch.
///
/// Owned by one composition root and shared by reference. Once degraded the
/// handle is never consulted again until [`ConnectionState::reset`] is called
/// explicitly; no failure path clears the latch. Flipping the latch is
/// idempotent, so concurrent failures need no lock.
pub struct ConnectionState {
    handle: Option<Arc<dyn GraphBackend>>,
    degraded: AtomicBool,
    transitions: AtomicUsize,
}

impl ConnectionState {
    /// State for a successfully constructed backend. Starts healthy.
    pub fn with_backend(handle: Arc<dyn GraphBackend>) -> Self {
        Self {
            handle: Some(handle),
            degraded: AtomicBool::new(false),
            transitions: AtomicUsize::new(0),
        }
    }

    /// State without any backend. Starts, and stays, degraded.
    pub fn without_backend() -> Self {
        Self {
            handle: None,
            degraded: AtomicBool::new(true),
            transitions: AtomicUsize::new(0),
        }
    }

    /// Backend handle, unless the state is degraded.
    pub fn usable_handle(&self) -> Option<&Arc<dyn GraphBackend>> {
        if self.is_degraded() {
            None
        } else {
            self.handle.as_ref()
        }
    }

    /// Backend handle regardless of the latch.
    pub fn handle(&self) -> Option<&Arc<dyn GraphBackend>> {
        self.handle.as_ref()
    }

    /// Whether the latch is set.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Current mode.
    pub fn mode(&self) -> ConnectionMode {
        if self.is_degraded() {
            ConnectionMode::Degraded
        } else {
            ConnectionMode::Healthy
        }
    }

    /// Sets the latch. Returns `true` only for the call that performed the
    /// HEALTHY to DEGRADED transition.
    pub fn degrade(&self) -> bool {
        let flipped = !self.degraded.swap(true, Ordering::AcqRel);
        if flipped {
            self.transitions.fetch_add(1, Ordering::Relaxed);
        }
        flipped
    }

    /// Number of HEALTHY to DEGRADED transitions so far.
    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::Relaxed)
    }

    /// Clears the latch when a backend handle exists.
    ///
    /// This is the explicit re-initialization hook; nothing in the execution
    /// path calls it. Returns whether the state is now healthy.
    pub fn reset(&self) -> bool {
        if self.handle.is_none() {
            return false;
        }
        self.degraded.store(false, Ordering::Release);
        true
    }
}

impl fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionState")
            .field("backend", &self.handle.as_ref().map(|h| h.name()))
            .field("degraded", &self.is_degraded())
            .field("transitions", &self.transitions())
            .finish()
    }
}
