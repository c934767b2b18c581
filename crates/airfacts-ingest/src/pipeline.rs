// OpenFlights Pipeline Orchestration
//
// Strict dependency order within a single task:
// 1. Verify graph connectivity (fast fail, nothing is uploaded on failure),
//    then resolve the Cypher templates
// 2. Fetch + normalize airports, then airlines
// 3. Fetch + enrich routes using both ID lookups and the coordinate index
// 4. Upsert airports, airlines, routes
//
// No rollback across datasets: airports uploaded before a later failure stay
// persisted.

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::graph::{BatchOutcome, BatchPolicy, BatchUpsertExecutor, CypherTemplates, GraphCounts, GraphStore};
use crate::openflights::{
    normalize_airlines, normalize_airports, Dataset, EnrichmentStats, NormalizedAirlines,
    NormalizedAirports, OpenFlightsFetcher, RawAirline, RawAirport, RawRoute, RouteEnricher,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Per-dataset counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    /// Rows decoded from the upstream file
    pub fetched: usize,
    /// Records handed to the upload
    pub prepared: usize,
    /// Rows removed by identity resolution
    pub dropped: usize,
    /// Rows collapsed by ID deduplication
    pub duplicates: usize,
    pub upload: Option<BatchOutcome>,
}

impl DatasetSummary {
    pub fn processed(&self) -> usize {
        self.upload.map_or(0, |u| u.processed)
    }

    pub fn failed(&self) -> usize {
        self.upload.map_or(0, |u| u.failed)
    }
}

/// Operator-facing account of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub connected: bool,
    pub airports: DatasetSummary,
    pub airlines: DatasetSummary,
    pub routes: DatasetSummary,
    pub enrichment: EnrichmentStats,
}

impl RunSummary {
    fn start() -> Self {
        RunSummary {
            started_at: Utc::now(),
            finished_at: None,
            connected: false,
            airports: DatasetSummary::default(),
            airlines: DatasetSummary::default(),
            routes: DatasetSummary::default(),
            enrichment: EnrichmentStats::default(),
        }
    }

    pub fn dataset(&self, dataset: Dataset) -> &DatasetSummary {
        match dataset {
            Dataset::Airports => &self.airports,
            Dataset::Airlines => &self.airlines,
            Dataset::Routes => &self.routes,
        }
    }

    fn dataset_mut(&mut self, dataset: Dataset) -> &mut DatasetSummary {
        match dataset {
            Dataset::Airports => &mut self.airports,
            Dataset::Airlines => &mut self.airlines,
            Dataset::Routes => &mut self.routes,
        }
    }

    pub fn total_processed(&self) -> usize {
        Dataset::ALL.iter().map(|d| self.dataset(*d).processed()).sum()
    }

    pub fn total_failed(&self) -> usize {
        Dataset::ALL.iter().map(|d| self.dataset(*d).failed()).sum()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "OpenFlights ingestion summary")?;
        writeln!(f, "  started:  {}", self.started_at.to_rfc3339())?;
        match self.finished_at {
            Some(finished) => {
                let elapsed = finished - self.started_at;
                writeln!(
                    f,
                    "  finished: {} ({}s)",
                    finished.to_rfc3339(),
                    elapsed.num_seconds()
                )?;
            },
            None => writeln!(f, "  finished: -")?,
        }
        writeln!(
            f,
            "  {:<10} {:>9} {:>9} {:>9} {:>10} {:>9} {:>7}",
            "dataset", "fetched", "prepared", "dropped", "processed", "failed", "skipped"
        )?;
        for dataset in Dataset::ALL {
            let s = self.dataset(dataset);
            writeln!(
                f,
                "  {:<10} {:>9} {:>9} {:>9} {:>10} {:>9} {:>7}",
                dataset.name(),
                s.fetched,
                s.prepared,
                s.dropped + s.duplicates,
                s.processed(),
                s.failed(),
                s.upload.map_or(s.prepared, |u| u.skipped()),
            )?;
        }
        write!(
            f,
            "  routes with distance: {} / {} ({:.1}%)",
            self.enrichment.with_distance,
            self.enrichment.retained,
            self.enrichment.distance_coverage() * 100.0
        )
    }
}

/// Summary plus the fatal error that ended the run, if any
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub error: Option<IngestError>,
}

impl RunOutcome {
    /// True when the run reached the end; per-batch failures do not count
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// OpenFlights ingestion pipeline
pub struct IngestPipeline<S: GraphStore> {
    config: IngestConfig,
    fetcher: OpenFlightsFetcher,
    store: S,
    cancel: CancellationToken,
    progress: bool,
}

impl<S: GraphStore> IngestPipeline<S> {
    /// Create new pipeline owning the store handle
    pub fn new(
        config: IngestConfig,
        store: S,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let fetcher = OpenFlightsFetcher::new(&config.openflights)?;

        Ok(IngestPipeline {
            config,
            fetcher,
            store,
            cancel,
            progress: true,
        })
    }

    /// Disable upload progress bars
    pub fn without_progress(mut self) -> Self {
        self.progress = false;
        self
    }

    /// Run the whole pipeline and release the store
    ///
    /// Always returns a summary, including for runs ended by a fatal error or
    /// by cancellation.
    pub async fn run(self) -> RunOutcome {
        let mut summary = RunSummary::start();
        info!("Starting OpenFlights ingestion run");

        let result = self.execute(&mut summary).await;
        summary.finished_at = Some(Utc::now());

        let IngestPipeline { store, .. } = self;
        drop(store);
        info!("Released graph store");

        match result {
            Ok(()) => {
                info!(
                    processed = summary.total_processed(),
                    failed = summary.total_failed(),
                    "Ingestion run completed"
                );
                RunOutcome {
                    summary,
                    error: None,
                }
            },
            Err(e) => {
                warn!(error = %e, "Ingestion run ended early");
                RunOutcome {
                    summary,
                    error: Some(e),
                }
            },
        }
    }

    async fn execute(&self, summary: &mut RunSummary) -> Result<()> {
        info!("Step 1/7: Verifying graph connectivity");
        self.store
            .verify_connectivity()
            .await
            .map_err(IngestError::Connectivity)?;
        summary.connected = true;
        let templates = CypherTemplates::resolve(self.config.cypher_dir.as_deref()).await?;

        self.checkpoint("fetch airports")?;
        info!("Step 2/7: Fetching and normalizing airports");
        let raw_airports = self.fetcher.fetch::<RawAirport>().await?;
        summary.airports.fetched = raw_airports.len();
        let NormalizedAirports {
            airports,
            codes: airport_codes,
            coordinates,
            dropped,
            duplicates,
            ..
        } = normalize_airports(raw_airports);
        summary.airports.prepared = airports.len();
        summary.airports.dropped = dropped;
        summary.airports.duplicates = duplicates;

        self.checkpoint("fetch airlines")?;
        info!("Step 3/7: Fetching and normalizing airlines");
        let raw_airlines = self.fetcher.fetch::<RawAirline>().await?;
        summary.airlines.fetched = raw_airlines.len();
        let NormalizedAirlines {
            airlines,
            codes: airline_codes,
            dropped,
            duplicates,
        } = normalize_airlines(raw_airlines);
        summary.airlines.prepared = airlines.len();
        summary.airlines.dropped = dropped;
        summary.airlines.duplicates = duplicates;

        self.checkpoint("fetch routes")?;
        info!("Step 4/7: Fetching and enriching routes");
        let raw_routes = self.fetcher.fetch::<RawRoute>().await?;
        summary.routes.fetched = raw_routes.len();
        let enricher = RouteEnricher::new(airline_codes, airport_codes, coordinates);
        let (routes, stats) = enricher.enrich(raw_routes);
        summary.routes.prepared = routes.len();
        summary.routes.dropped = stats.dropped;
        summary.enrichment = stats;

        info!("Step 5/7: Uploading airports");
        self.upload(Dataset::Airports, &templates, &airports, summary).await?;

        info!("Step 6/7: Uploading airlines");
        self.upload(Dataset::Airlines, &templates, &airlines, summary).await?;

        info!("Step 7/7: Uploading routes");
        self.upload(Dataset::Routes, &templates, &routes, summary).await?;

        Ok(())
    }

    async fn upload<R: Serialize>(
        &self,
        dataset: Dataset,
        templates: &CypherTemplates,
        records: &[R],
        summary: &mut RunSummary,
    ) -> Result<()> {
        self.checkpoint(dataset.name())?;

        let mut executor = BatchUpsertExecutor::new(
            &self.store,
            BatchPolicy::from(&self.config.batch),
            self.cancel.clone(),
        );
        if !self.progress {
            executor = executor.without_progress();
        }

        let outcome = executor
            .execute(dataset.name(), templates.for_dataset(dataset), records)
            .await;
        summary.dataset_mut(dataset).upload = Some(outcome);

        if outcome.interrupted {
            return Err(IngestError::Cancelled);
        }
        Ok(())
    }

    /// Stage boundary: honour a pending cancellation
    fn checkpoint(&self, stage: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!(stage, "Cancellation requested, stopping before {}", stage);
            return Err(IngestError::Cancelled);
        }
        Ok(())
    }
}

/// Connectivity check plus node and relationship counts
pub async fn check_store<S: GraphStore + ?Sized>(store: &S) -> Result<GraphCounts> {
    store
        .verify_connectivity()
        .await
        .map_err(IngestError::Connectivity)?;

    let counts = store.counts().await?;
    info!(
        airports = counts.airports,
        airlines = counts.airlines,
        routes = counts.routes,
        "Graph store reachable"
    );

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display_lists_every_dataset() {
        let mut summary = RunSummary::start();
        summary.airports = DatasetSummary {
            fetched: 10,
            prepared: 8,
            dropped: 1,
            duplicates: 1,
            upload: Some(BatchOutcome {
                prepared: 8,
                processed: 8,
                batches: 1,
                ..BatchOutcome::default()
            }),
        };
        summary.enrichment = EnrichmentStats {
            total: 4,
            retained: 4,
            dropped: 0,
            with_distance: 3,
        };
        summary.finished_at = Some(summary.started_at);

        let text = summary.to_string();

        assert!(text.contains("airports"));
        assert!(text.contains("airlines"));
        assert!(text.contains("routes with distance: 3 / 4 (75.0%)"));
        assert_eq!(summary.total_processed(), 8);
        assert_eq!(summary.total_failed(), 0);
    }

    #[test]
    fn test_dataset_summary_without_upload() {
        let summary = DatasetSummary {
            prepared: 5,
            ..DatasetSummary::default()
        };

        assert_eq!(summary.processed(), 0);
        assert_eq!(summary.failed(), 0);
    }
}
