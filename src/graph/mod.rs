#![forbid(unsafe_code)]

//! Graph query subsystem with transparent mock fallback.
//!
//! Statements flow through [`GraphClient::execute`]: a session is acquired
//! (live or stand-in), the statement runs, and the session is released.
//! When the backend fails, the client latches into degraded mode and serves
//! [`MockGenerator`] output from then on. Results always arrive as a
//! [`RecordSet`], whichever path produced them.

/// Canned analytics queries and typed row decoding.
pub mod analytics;

/// Backend traits implemented by concrete drivers.
pub mod backend;

/// Execution and degradation controller.
pub mod client;

/// Deterministic mock result generator.
pub mod mock;

/// Bolt backend over `neo4rs`.
pub mod neo4j;

/// Seed script execution.
pub mod seed;

/// Live and stand-in sessions.
pub mod session;

/// Connection state and degradation latch.
pub mod state;

/// Normalized values, records and record sets.
pub mod value;

pub use backend::{AccessMode, BackendSession, GraphBackend};
pub use client::GraphClient;
pub use mock::{Fingerprint, MockGenerator};
pub use session::Session;
pub use state::{ConnectionMode, ConnectionState};
pub use value::{Params, Record, RecordSet, Value};
