// Neo4j Graph Store

use crate::config::GraphConfig;
use crate::error::StoreError;
use crate::graph::{GraphCounts, GraphStore, Params};
use async_trait::async_trait;
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph, Query};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONNECTIVITY_QUERY: &str = "RETURN 1 AS ok";
const COUNT_AIRPORTS: &str = "MATCH (a:Airport) RETURN count(a) AS count";
const COUNT_AIRLINES: &str = "MATCH (a:Airline) RETURN count(a) AS count";
const COUNT_ROUTES: &str = "MATCH (:Airport)-[r:ROUTE]->(:Airport) RETURN count(r) AS count";

/// Bolt connection pool to a Neo4j database
///
/// Constructed once per process and passed to the pipeline; sessions are
/// scoped to a single batch or check.
pub struct Neo4jStore {
    graph: Graph,
    acquire_timeout: Duration,
}

impl Neo4jStore {
    /// Build the connection pool
    pub async fn connect(config: &GraphConfig) -> Result<Self, StoreError> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.username.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections);
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }

        let graph = Graph::connect(builder.build()?).await?;

        info!(
            uri = %config.uri,
            user = %config.username,
            max_connections = config.max_connections,
            "Connected graph store pool"
        );

        Ok(Neo4jStore {
            graph,
            acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
        })
    }

    /// Bound a connection-acquiring driver call by the acquisition timeout
    async fn acquire<T>(
        &self,
        future: impl Future<Output = Result<T, neo4rs::Error>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.acquire_timeout, future).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::AcquireTimeout(self.acquire_timeout)),
        }
    }

    async fn count(&self, cypher: &str) -> Result<u64, StoreError> {
        let mut stream = self.acquire(self.graph.execute(query(cypher))).await?;
        let row = stream
            .next()
            .await?
            .ok_or_else(|| StoreError::Decode(format!("no rows returned by: {}", cypher)))?;
        let count: i64 = row
            .get("count")
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn verify_connectivity(&self) -> Result<(), StoreError> {
        let mut stream = self.acquire(self.graph.execute(query(CONNECTIVITY_QUERY))).await?;

        match stream.next().await? {
            Some(row) => {
                let ok: i64 = row.get("ok").map_err(|e| StoreError::Decode(e.to_string()))?;
                debug!(ok, "Graph connectivity round-trip succeeded");
                Ok(())
            },
            None => Err(StoreError::Unavailable(
                "connectivity query returned no rows".to_string(),
            )),
        }
    }

    async fn write_batch(&self, statement: &str, rows: &[Params]) -> Result<(), StoreError> {
        let queries = rows
            .iter()
            .map(|row| bind(statement, row))
            .collect::<Result<Vec<_>, _>>()?;

        let mut txn = self.acquire(self.graph.start_txn()).await?;

        if let Err(e) = txn.run_queries(queries).await {
            if let Err(rollback) = txn.rollback().await {
                warn!(error = %rollback, "Rollback after failed batch also failed");
            }
            return Err(e.into());
        }

        txn.commit().await?;
        Ok(())
    }

    async fn counts(&self) -> Result<GraphCounts, StoreError> {
        Ok(GraphCounts {
            airports: self.count(COUNT_AIRPORTS).await?,
            airlines: self.count(COUNT_AIRLINES).await?,
            routes: self.count(COUNT_ROUTES).await?,
        })
    }
}

fn bind(statement: &str, row: &Params) -> Result<Query, StoreError> {
    row.iter().try_fold(query(statement), |q, (key, value)| {
        Ok(q.param(key, json_to_bolt(key, value)?))
    })
}

/// Convert a scalar JSON parameter to its Bolt representation
fn json_to_bolt(key: &str, value: &Value) -> Result<BoltType, StoreError> {
    match value {
        Value::Null => Ok(BoltType::Null(BoltNull)),
        Value::Bool(b) => Ok((*b).into()),
        Value::Number(n) => n
            .as_i64()
            .map(BoltType::from)
            .or_else(|| n.as_f64().map(BoltType::from))
            .ok_or_else(|| StoreError::Encoding(format!("{}: unrepresentable number {}", key, n))),
        Value::String(s) => Ok(s.as_str().into()),
        Value::Array(_) | Value::Object(_) => Err(StoreError::Encoding(format!(
            "{}: nested values are not supported",
            key
        ))),
    }
}
