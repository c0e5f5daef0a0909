//! Seed scripts: semicolon-delimited statements executed one at a time.
use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::client::GraphClient;
use super::value::Params;
use crate::error::{GraphError, Result};

/// Outcome of a seed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Statements executed.
    pub statements: usize,
    /// Whether any statement was answered by mock data.
    pub degraded: bool,
}

/// Splits a script on `;`, trimming each statement and dropping blanks.
pub fn split_statements(script: &str) -> Vec<&str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .collect()
}

/// Executes every statement of `script` in order.
pub async fn seed_script(client: &GraphClient, script: &str) -> Result<SeedReport> {
    let statements = split_statements(script);
    for statement in &statements {
        client.execute(statement, &Params::new()).await?;
    }
    Ok(SeedReport {
        statements: statements.len(),
        degraded: client.is_degraded(),
    })
}

/// Reads `path` and executes it with [`seed_script`].
pub async fn seed_file(client: &GraphClient, path: &Path) -> Result<SeedReport> {
    let script = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let report = seed_script(client, &script).await?;
    info!(
        path = %path.display(),
        statements = report.statements,
        degraded = report.degraded,
        "graph seeded"
    );
    Ok(report)
}
