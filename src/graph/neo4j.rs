//! Bolt backend built on `neo4rs`.
//!
//! Every statement runs in its own transaction, committed before `run`
//! returns, so a failed commit surfaces as a statement failure. Closing a
//! session only returns the pooled connection.
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph, Query, Txn};
use tokio::sync::RwLock;

use super::backend::{AccessMode, BackendSession, GraphBackend};
use super::value::{Params, Record, RecordSet, Value};
use crate::config::GraphConfig;
use crate::error::BackendError;

/// Shared, pooled Neo4j driver handle.
pub struct Neo4jBackend {
    graph: RwLock<Option<Graph>>,
    query_timeout: Option<Duration>,
}

impl Neo4jBackend {
    /// Builds the driver pool from configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, BackendError> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections);
        if let Some(db) = config.database.as_deref() {
            builder = builder.db(db);
        }
        let driver_config = builder
            .build()
            .map_err(|err| BackendError::Connect(err.to_string()))?;
        let graph = Graph::connect(driver_config)
            .await
            .map_err(|err| BackendError::Connect(err.to_string()))?;
        Ok(Self {
            graph: RwLock::new(Some(graph)),
            query_timeout: config.query_timeout(),
        })
    }
}

#[async_trait]
impl GraphBackend for Neo4jBackend {
    fn name(&self) -> &'static str {
        "neo4j"
    }

    async fn open_session(
        &self,
        mode: AccessMode,
    ) -> Result<Box<dyn BackendSession>, BackendError> {
        let graph = self
            .graph
            .read()
            .await
            .clone()
            .ok_or(BackendError::Unavailable)?;
        let txn = graph
            .start_txn()
            .await
            .map_err(|err| BackendError::SessionOpen(err.to_string()))?;
        tracing::trace!(%mode, "opened neo4j session");
        Ok(Box::new(Neo4jSession {
            graph,
            txn: Some(txn),
            query_timeout: self.query_timeout,
        }))
    }

    async fn shutdown(&self) {
        if self.graph.write().await.take().is_some() {
            tracing::info!("neo4j driver released");
        }
    }
}

/// Pooled connection for one logical operation.
struct Neo4jSession {
    graph: Graph,
    txn: Option<Txn>,
    query_timeout: Option<Duration>,
}

impl Neo4jSession {
    async fn run_in_txn(&mut self, statement: Query) -> Result<RecordSet, BackendError> {
        let mut txn = match self.txn.take() {
            Some(txn) => txn,
            None => self
                .graph
                .start_txn()
                .await
                .map_err(|err| BackendError::SessionOpen(err.to_string()))?,
        };
        let outcome = collect(&mut txn, statement).await;
        settle(txn, outcome).await
    }
}

#[async_trait]
impl BackendSession for Neo4jSession {
    async fn run(&mut self, text: &str, params: &Params) -> Result<RecordSet, BackendError> {
        let statement = bind(text, params);
        match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_in_txn(statement))
                .await
                .unwrap_or(Err(BackendError::QueryTimeout(limit))),
            None => self.run_in_txn(statement).await,
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BackendError> {
        match self.txn {
            Some(txn) => txn
                .rollback()
                .await
                .map_err(|err| BackendError::Close(err.to_string())),
            None => Ok(()),
        }
    }
}

async fn collect(txn: &mut Txn, statement: Query) -> Result<RecordSet, BackendError> {
    let mut stream = txn
        .execute(statement)
        .await
        .map_err(|err| BackendError::Query(err.to_string()))?;
    let mut records = Vec::new();
    while let Some(row) = stream
        .next(txn.handle())
        .await
        .map_err(|err| BackendError::Query(err.to_string()))?
    {
        let fields: serde_json::Map<String, serde_json::Value> = row
            .to()
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        records.push(Record::from_pairs(
            fields.into_iter().map(|(key, value)| (key, Value::from(value))),
        ));
    }
    Ok(RecordSet::new(records))
}

/// End of a single-statement transaction.
#[async_trait]
trait Settle: Send + Sized {
    async fn commit(self) -> Result<(), String>;
    async fn rollback(self) -> Result<(), String>;
}

#[async_trait]
impl Settle for Txn {
    async fn commit(self) -> Result<(), String> {
        Txn::commit(self).await.map_err(|err| err.to_string())
    }

    async fn rollback(self) -> Result<(), String> {
        Txn::rollback(self).await.map_err(|err| err.to_string())
    }
}

/// Commits after a successful statement and rolls back after a failed one.
/// A failed commit fails the statement.
async fn settle<T: Settle>(
    txn: T,
    outcome: Result<RecordSet, BackendError>,
) -> Result<RecordSet, BackendError> {
    match outcome {
        Ok(records) => match txn.commit().await {
            Ok(()) => Ok(records),
            Err(reason) => Err(BackendError::Query(format!("commit failed: {reason}"))),
        },
        Err(err) => {
            if let Err(reason) = txn.rollback().await {
                tracing::debug!(%reason, "rollback after failed statement also failed");
            }
            Err(err)
        }
    }
}

fn bind(text: &str, params: &Params) -> Query {
    params
        .iter()
        .fold(query(text), |statement, (name, value)| {
            statement.param(name, to_bolt(value))
        })
}

fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Int(i) => BoltType::from(*i),
        Value::Float(f) => BoltType::from(*f),
        Value::String(s) => BoltType::from(s.as_str()),
        Value::List(items) => BoltType::from(items.iter().map(to_bolt).collect::<Vec<_>>()),
        Value::Map(map) => BoltType::from(
            map.iter()
                .map(|(key, value)| (key.clone(), to_bolt(value)))
                .collect::<HashMap<String, BoltType>>(),
        ),
    }
}
