//! Airfacts Ingest Library
//!
//! Loads the public OpenFlights datasets into a Cypher graph store.
//!
//! # Stages
//!
//! - **Fetch**: download airports, airlines and routes over HTTP and decode
//!   them against fixed column schemas
//! - **Normalize**: harmonize IATA/ICAO codes, deduplicate by internal ID
//! - **Enrich**: resolve route endpoints and attach great-circle distances
//! - **Upsert**: batched, retried write transactions against the store
//!
//! # Example
//!
//! ```no_run
//! use airfacts_ingest::config::IngestConfig;
//! use airfacts_ingest::graph::Neo4jStore;
//! use airfacts_ingest::pipeline::IngestPipeline;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load()?;
//!     let store = Neo4jStore::connect(&config.graph).await?;
//!     let pipeline = IngestPipeline::new(config, store, CancellationToken::new())?;
//!
//!     let outcome = pipeline.run().await;
//!     println!("{}", outcome.summary);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod openflights;
pub mod pipeline;

pub use error::{IngestError, Result};
