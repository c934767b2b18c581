//! Shared helpers for the ingestion integration tests

#![allow(dead_code)]

use airfacts_ingest::config::{BatchConfig, GraphConfig, IngestConfig, OpenFlightsConfig};
use airfacts_ingest::error::StoreError;
use airfacts_ingest::graph::{GraphCounts, GraphStore, Params};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One committed write transaction
#[derive(Debug, Clone)]
pub struct Write {
    pub statement: String,
    pub rows: Vec<Params>,
}

/// State shared between a `RecordingStore` and the test that created it
#[derive(Default)]
pub struct StoreState {
    pub writes: Mutex<Vec<Write>>,
    pub attempts: AtomicUsize,
    pub connectivity_checks: AtomicUsize,
    pub unreachable: AtomicBool,
    pub released: AtomicBool,
    /// Every write whose statement contains this text fails
    pub fail_statements_containing: Mutex<Option<String>>,
    /// Cancel this token once the given number of writes has committed
    pub cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl StoreState {
    pub fn committed(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn rows_for(&self, statement_fragment: &str) -> Vec<Params> {
        self.committed()
            .into_iter()
            .filter(|w| w.statement.contains(statement_fragment))
            .flat_map(|w| w.rows)
            .collect()
    }
}

/// In-memory `GraphStore` recording every committed batch
pub struct RecordingStore {
    state: Arc<StoreState>,
}

impl RecordingStore {
    pub fn new() -> (Self, Arc<StoreState>) {
        let state = Arc::new(StoreState::default());
        (
            RecordingStore {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl Drop for RecordingStore {
    fn drop(&mut self) {
        self.state.released.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl GraphStore for RecordingStore {
    async fn verify_connectivity(&self) -> Result<(), StoreError> {
        self.state.connectivity_checks.fetch_add(1, Ordering::SeqCst);
        if self.state.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    async fn write_batch(&self, statement: &str, rows: &[Params]) -> Result<(), StoreError> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(fragment) = self.state.fail_statements_containing.lock().unwrap().as_deref() {
            if statement.contains(fragment) {
                return Err(StoreError::Unavailable("transaction aborted".to_string()));
            }
        }

        let committed = {
            let mut writes = self.state.writes.lock().unwrap();
            writes.push(Write {
                statement: statement.to_string(),
                rows: rows.to_vec(),
            });
            writes.len()
        };

        if let Some((after, token)) = self.state.cancel_after.lock().unwrap().as_ref() {
            if committed >= *after {
                token.cancel();
            }
        }

        Ok(())
    }

    async fn counts(&self) -> Result<GraphCounts, StoreError> {
        Ok(GraphCounts {
            airports: self.state.rows_for("MERGE (a:Airport").len() as u64,
            airlines: self.state.rows_for("MERGE (a:Airline").len() as u64,
            routes: self.state.rows_for("ROUTE").len() as u64,
        })
    }
}

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("openflights")
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_dir().join(name)).unwrap()
}

/// Serve a dataset body under `/data/<file>`
pub async fn serve(server: &MockServer, file: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/data/{}", file)))
        .respond_with(template)
        .mount(server)
        .await;
}

/// Serve all three fixture datasets
pub async fn serve_fixtures(server: &MockServer) {
    for file in ["airports.dat", "airlines.dat", "routes.dat"] {
        serve(server, file, ResponseTemplate::new(200).set_body_string(fixture(file))).await;
    }
}

/// Config pointing at the mock server with small batches and no retry delay
pub fn test_config(server: &MockServer) -> IngestConfig {
    IngestConfig {
        openflights: OpenFlightsConfig {
            base_url: format!("{}/data/", server.uri()),
            timeout_secs: 5,
        },
        batch: BatchConfig {
            batch_size: 2,
            max_retries: 3,
            retry_delay_secs: 0,
        },
        ..IngestConfig::default()
    }
}

// ============================================================================
// Neo4j Test Container
// ============================================================================

pub const NEO4J_TEST_PASSWORD: &str = "airfacts-test";

/// Neo4j container with Bolt exposed on a random host port
///
/// The container is removed when this value is dropped.
pub struct TestNeo4j {
    _container: ContainerAsync<GenericImage>,
    config: GraphConfig,
}

impl TestNeo4j {
    pub async fn start() -> anyhow::Result<Self> {
        let container = GenericImage::new("neo4j", "5")
            .with_exposed_port(7687.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Started."))
            .with_env_var("NEO4J_AUTH", format!("neo4j/{}", NEO4J_TEST_PASSWORD))
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(7687.tcp()).await?;

        let config = GraphConfig {
            uri: format!("bolt://{}:{}", host, port),
            username: "neo4j".to_string(),
            password: NEO4J_TEST_PASSWORD.to_string(),
            database: None,
            max_connections: 2,
            acquire_timeout_secs: 30,
        };

        Ok(TestNeo4j {
            _container: container,
            config,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }
}
