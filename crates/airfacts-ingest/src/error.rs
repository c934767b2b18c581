//! Error types for the ingestion pipeline

use crate::openflights::Dataset;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Failure to retrieve a raw dataset
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{dataset} download from {url} returned HTTP {status}")]
    Status {
        dataset: Dataset,
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{dataset} download from {url} timed out after {timeout_secs}s")]
    Timeout {
        dataset: Dataset,
        url: String,
        timeout_secs: u64,
    },

    #[error("{dataset} download from {url} failed: {source}")]
    Transport {
        dataset: Dataset,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Raw dataset text that does not match its column schema
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{dataset} line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        dataset: Dataset,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{dataset} line {line}: malformed delimited text: {source}")]
    Malformed {
        dataset: Dataset,
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// Failure talking to the destination graph store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Graph driver error: {0}")]
    Driver(#[from] neo4rs::Error),

    #[error("Timed out after {0:?} acquiring a graph connection")]
    AcquireTimeout(Duration),

    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode record parameters: {0}")]
    Encoding(String),

    #[error("Failed to decode graph result: {0}")]
    Decode(String),
}

/// Failure loading a Cypher template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template {0} is empty")]
    Empty(PathBuf),
}

/// Fatal pipeline errors
///
/// Per-record identity failures and missing coordinates never surface here;
/// they are counted or modelled as absent values instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Graph connectivity check failed: {0}")]
    Connectivity(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Config(#[from] airfacts_common::AirfactsError),

    #[error("Ingestion run cancelled by operator")]
    Cancelled,
}
