// Cypher Upsert Templates

use crate::error::TemplateError;
use crate::openflights::Dataset;
use std::path::Path;
use tracing::info;

/// Parameterized upsert statements, one per entity type
///
/// Each statement must MERGE on the entity's natural key so that a retried
/// batch re-applies cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CypherTemplates {
    pub airport: String,
    pub airline: String,
    pub route: String,
}

impl CypherTemplates {
    /// Templates compiled into the binary
    pub fn builtin() -> Self {
        CypherTemplates {
            airport: include_str!("../../cypher/load_airport.cypher").to_string(),
            airline: include_str!("../../cypher/load_airline.cypher").to_string(),
            route: include_str!("../../cypher/load_route.cypher").to_string(),
        }
    }

    /// Template file name for a dataset
    pub fn filename(dataset: Dataset) -> &'static str {
        match dataset {
            Dataset::Airports => "load_airport.cypher",
            Dataset::Airlines => "load_airline.cypher",
            Dataset::Routes => "load_route.cypher",
        }
    }

    /// Read all three templates from a directory
    pub async fn load(dir: &Path) -> Result<Self, TemplateError> {
        let templates = CypherTemplates {
            airport: read_template(&dir.join(Self::filename(Dataset::Airports))).await?,
            airline: read_template(&dir.join(Self::filename(Dataset::Airlines))).await?,
            route: read_template(&dir.join(Self::filename(Dataset::Routes))).await?,
        };

        info!(dir = %dir.display(), "Loaded Cypher templates");
        Ok(templates)
    }

    /// Templates from `dir` when given, else the compiled-in defaults
    pub async fn resolve(dir: Option<&Path>) -> Result<Self, TemplateError> {
        match dir {
            Some(dir) => Self::load(dir).await,
            None => Ok(Self::builtin()),
        }
    }

    pub fn for_dataset(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::Airports => &self.airport,
            Dataset::Airlines => &self.airline,
            Dataset::Routes => &self.route,
        }
    }
}

async fn read_template(path: &Path) -> Result<String, TemplateError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if text.trim().is_empty() {
        return Err(TemplateError::Empty(path.to_path_buf()));
    }

    Ok(text)
}
