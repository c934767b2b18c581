// Graph Store Access
//
// The Batch Upsert Executor and the connectivity check are the only callers
// that touch the destination store. Both go through the `GraphStore` trait so
// the pipeline can run against Neo4j in production and an in-memory store in
// tests.

pub mod batch;
pub mod neo4j;
pub mod templates;

pub use batch::{BatchOutcome, BatchPolicy, BatchUpsertExecutor};
pub use neo4j::Neo4jStore;
pub use templates::CypherTemplates;

use crate::error::StoreError;
use async_trait::async_trait;
use serde::Serialize;

/// Named statement parameters for one record
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Node and relationship counts reported by `airfacts-ingest check`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub airports: u64,
    pub airlines: u64,
    pub routes: u64,
}

impl std::fmt::Display for GraphCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "airports: {}, airlines: {}, routes: {}",
            self.airports, self.airlines, self.routes
        )
    }
}

/// Write access to a Cypher-capable graph store
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Trivial round-trip query
    async fn verify_connectivity(&self) -> Result<(), StoreError>;

    /// Run `statement` once per parameter set inside a single write transaction
    ///
    /// Either every row is applied or none is: a failed transaction must be
    /// rolled back before returning the error.
    async fn write_batch(&self, statement: &str, rows: &[Params]) -> Result<(), StoreError>;

    /// Count `Airport` and `Airline` nodes and `ROUTE` relationships
    async fn counts(&self) -> Result<GraphCounts, StoreError>;
}
