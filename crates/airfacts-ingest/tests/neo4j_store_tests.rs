//! Neo4j store tests against a real database container
//!
//! These tests require Docker to be running. Run with:
//!
//! ```bash
//! cargo test -p airfacts-ingest --test neo4j_store_tests -- --ignored --nocapture
//! ```

mod common;

use airfacts_ingest::error::StoreError;
use airfacts_ingest::graph::{CypherTemplates, GraphCounts, GraphStore, Neo4jStore, Params};
use airfacts_ingest::pipeline::IngestPipeline;
use common::TestNeo4j;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

async fn connect(neo4j: &TestNeo4j) -> Neo4jStore {
    Neo4jStore::connect(neo4j.config())
        .await
        .expect("Failed to connect to Neo4j container")
}

fn params(value: serde_json::Value) -> Params {
    value.as_object().cloned().expect("params must be an object")
}

fn airport(iata: &str, airport_id: i64) -> Params {
    params(json!({
        "airport_id": airport_id,
        "iata": iata,
        "icao": null,
        "name": format!("Airport {}", iata),
        "city": null,
        "country": null,
        "latitude": null,
        "longitude": null,
        "altitude": null,
        "timezone": null,
        "dst": null,
        "tz_database": null,
        "airport_type": "airport",
        "source": null,
    }))
}

/// Run the fixture ingestion against the store and return the resulting counts
async fn ingest_fixtures(neo4j: &TestNeo4j) -> GraphCounts {
    let server = MockServer::start().await;
    common::serve_fixtures(&server).await;
    let mut config = common::test_config(&server);
    config.graph = neo4j.config().clone();

    let outcome = IngestPipeline::new(config, connect(neo4j).await, CancellationToken::new())
        .expect("Failed to build pipeline")
        .without_progress()
        .run()
        .await;
    assert!(outcome.is_success(), "run failed: {:?}", outcome.error);
    assert_eq!(outcome.summary.total_failed(), 0);

    connect(neo4j).await.counts().await.expect("Count query failed")
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_connectivity_round_trip() {
    let neo4j = TestNeo4j::start().await.expect("Failed to start Neo4j container");
    let store = connect(&neo4j).await;

    store.verify_connectivity().await.expect("Connectivity check failed");

    let counts = store.counts().await.expect("Count query failed");
    assert_eq!(counts, GraphCounts::default());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_committed_batch_is_visible() {
    let neo4j = TestNeo4j::start().await.expect("Failed to start Neo4j container");
    let store = connect(&neo4j).await;
    let templates = CypherTemplates::builtin();

    store
        .write_batch(&templates.airport, &[airport("JFK", 3797), airport("LAX", 3484)])
        .await
        .expect("Airport batch failed");
    let route = params(json!({
        "airline": "AA",
        "airline_id": 24,
        "source": "JFK",
        "source_id": 3797,
        "destination": "LAX",
        "destination_id": 3484,
        "codeshare": null,
        "stops": 0,
        "equipment": "32B 763",
        "distance": 3974.2,
    }));
    store
        .write_batch(&templates.route, &[route])
        .await
        .expect("Route batch failed");

    let counts = store.counts().await.expect("Count query failed");
    assert_eq!(counts.airports, 2);
    assert_eq!(counts.airlines, 0);
    assert_eq!(counts.routes, 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_failed_batch_rolls_back_every_row() {
    let neo4j = TestNeo4j::start().await.expect("Failed to start Neo4j container");
    let store = connect(&neo4j).await;
    let statement = "MERGE (a:Airport {IATA: $iata}) SET a.Ratio = 100 / $divisor";
    let rows = [
        params(json!({ "iata": "JFK", "divisor": 1 })),
        params(json!({ "iata": "LAX", "divisor": 0 })),
    ];

    let err = store.write_batch(statement, &rows).await.unwrap_err();

    assert!(!matches!(err, StoreError::Encoding(_)), "unexpected error: {err}");
    let counts = store.counts().await.expect("Count query failed");
    assert_eq!(counts.airports, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_batch_with_nested_value_never_reaches_store() {
    let neo4j = TestNeo4j::start().await.expect("Failed to start Neo4j container");
    let store = connect(&neo4j).await;
    let mut nested = airport("CDG", 1382);
    nested.insert("equipment".to_string(), json!(["319", "320"]));

    let err = store
        .write_batch(&CypherTemplates::builtin().airport, &[airport("LHR", 507), nested])
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Encoding(_)));
    assert_eq!(store.counts().await.expect("Count query failed").airports, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_fixture_ingestion_is_idempotent() {
    let neo4j = TestNeo4j::start().await.expect("Failed to start Neo4j container");

    let first = ingest_fixtures(&neo4j).await;
    assert_eq!(first.airports, 6);
    assert_eq!(first.airlines, 4);
    assert_eq!(first.routes, 7);

    let second = ingest_fixtures(&neo4j).await;
    assert_eq!(second, first);
}
