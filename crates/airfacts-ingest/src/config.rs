//! Configuration management

use airfacts_common::{AirfactsError, Result};
use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// Graph Store Constants
// ============================================================================

/// Default Bolt URI of the graph store.
pub const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";

/// Default graph store user.
pub const DEFAULT_NEO4J_USERNAME: &str = "neo4j";

/// Default graph store password for local development.
pub const DEFAULT_NEO4J_PASSWORD: &str = "airfacts-pw";

/// Default maximum connections in the Bolt pool.
pub const DEFAULT_NEO4J_MAX_CONNECTIONS: usize = 4;

/// Default connection acquisition timeout in seconds.
pub const DEFAULT_NEO4J_ACQUIRE_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// Dataset Source Constants
// ============================================================================

/// Default location of the OpenFlights data files.
pub const DEFAULT_OPENFLIGHTS_BASE_URL: &str =
    "https://raw.githubusercontent.com/jpatokal/openflights/master/data/";

/// Default HTTP timeout for one dataset download in seconds.
pub const DEFAULT_OPENFLIGHTS_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Upload Constants
// ============================================================================

/// Default records per write transaction.
pub const DEFAULT_BATCH_SIZE: usize = crate::graph::batch::DEFAULT_BATCH_SIZE;

/// Default attempts per batch.
pub const DEFAULT_MAX_RETRIES: u32 = crate::graph::batch::DEFAULT_MAX_ATTEMPTS;

/// Default delay between batch attempts in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = crate::graph::batch::DEFAULT_RETRY_DELAY_SECS;

/// Ingestion configuration
#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    pub graph: GraphConfig,
    pub openflights: OpenFlightsConfig,
    pub batch: BatchConfig,
    /// Directory overriding the compiled-in Cypher templates
    pub cypher_dir: Option<PathBuf>,
}

/// Graph store connection settings
#[derive(Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    pub max_connections: usize,
    pub acquire_timeout_secs: u64,
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            uri: DEFAULT_NEO4J_URI.to_string(),
            username: DEFAULT_NEO4J_USERNAME.to_string(),
            password: DEFAULT_NEO4J_PASSWORD.to_string(),
            database: None,
            max_connections: DEFAULT_NEO4J_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_NEO4J_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

/// Dataset source settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFlightsConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OpenFlightsConfig {
    fn default() -> Self {
        OpenFlightsConfig {
            base_url: DEFAULT_OPENFLIGHTS_BASE_URL.to_string(),
            timeout_secs: DEFAULT_OPENFLIGHTS_TIMEOUT_SECS,
        }
    }
}

/// Batch upload settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub batch_size: usize,
    /// Total attempts per batch, including the first
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl IngestConfig {
    /// Load configuration from `.env`, the environment and defaults, then validate
    pub fn load() -> Result<Self> {
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from `.env`, the environment and defaults
    ///
    /// Unparsable numeric values fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        IngestConfig {
            graph: GraphConfig {
                uri: env_string("NEO4J_URI", DEFAULT_NEO4J_URI),
                username: env_string("NEO4J_USERNAME", DEFAULT_NEO4J_USERNAME),
                password: env_string("NEO4J_PASSWORD", DEFAULT_NEO4J_PASSWORD),
                database: env_optional("NEO4J_DATABASE"),
                max_connections: env_or("NEO4J_MAX_CONNECTIONS", DEFAULT_NEO4J_MAX_CONNECTIONS),
                acquire_timeout_secs: env_or(
                    "NEO4J_ACQUIRE_TIMEOUT_SECS",
                    DEFAULT_NEO4J_ACQUIRE_TIMEOUT_SECS,
                ),
            },
            openflights: OpenFlightsConfig {
                base_url: env_string("OPENFLIGHTS_BASE_URL", DEFAULT_OPENFLIGHTS_BASE_URL),
                timeout_secs: env_or("OPENFLIGHTS_TIMEOUT_SECS", DEFAULT_OPENFLIGHTS_TIMEOUT_SECS),
            },
            batch: BatchConfig {
                batch_size: env_or("AIRFACTS_BATCH_SIZE", DEFAULT_BATCH_SIZE),
                max_retries: env_or("AIRFACTS_MAX_RETRIES", DEFAULT_MAX_RETRIES),
                retry_delay_secs: env_or("AIRFACTS_RETRY_DELAY_SECS", DEFAULT_RETRY_DELAY_SECS),
            },
            cypher_dir: env_optional("AIRFACTS_CYPHER_DIR").map(PathBuf::from),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.graph.uri.trim().is_empty() {
            return Err(AirfactsError::Config("NEO4J_URI cannot be empty".to_string()));
        }

        if self.graph.max_connections == 0 {
            return Err(AirfactsError::Config(
                "NEO4J_MAX_CONNECTIONS must be greater than 0".to_string(),
            ));
        }

        if self.graph.acquire_timeout_secs == 0 {
            return Err(AirfactsError::Config(
                "NEO4J_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        let base_url = self.openflights.base_url.trim();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(AirfactsError::Config(format!(
                "OPENFLIGHTS_BASE_URL must be an http(s) URL, got '{}'",
                self.openflights.base_url
            )));
        }

        if self.openflights.timeout_secs == 0 {
            return Err(AirfactsError::Config(
                "OPENFLIGHTS_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.batch.batch_size == 0 {
            return Err(AirfactsError::Config(
                "AIRFACTS_BATCH_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.batch.max_retries == 0 {
            return Err(AirfactsError::Config(
                "AIRFACTS_MAX_RETRIES must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
