//! RescueNet graph layer: disaster-response graph analytics served from a
//! Neo4j backend, degrading transparently to deterministic mock data when
//! the backend is unavailable.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod server;

pub use config::AppConfig;
pub use error::{BackendError, GraphError, Result};
pub use graph::{AccessMode, GraphClient, Params, Record, RecordSet, Value};
