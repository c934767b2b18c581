// OpenFlights Dataset Fetcher

use crate::config::OpenFlightsConfig;
use crate::error::{DecodeError, FetchError, Result};
use crate::openflights::{Dataset, DatasetRecord};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Null sentinel used throughout the OpenFlights files
const NULL_TOKEN: &str = "\\N";

/// HTTP client for the three OpenFlights datasets
pub struct OpenFlightsFetcher {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl OpenFlightsFetcher {
    /// Create new fetcher with configuration
    ///
    /// Certificate verification stays enabled; the request timeout covers the
    /// whole download including the body.
    pub fn new(config: &OpenFlightsConfig) -> std::result::Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("airfacts-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;

        Ok(OpenFlightsFetcher {
            client,
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Full URL of a dataset file
    pub fn dataset_url(&self, dataset: Dataset) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, dataset.filename())
        } else {
            format!("{}/{}", self.base_url, dataset.filename())
        }
    }

    /// Download a dataset and decode it into typed records
    pub async fn fetch<R: DatasetRecord>(&self) -> Result<Vec<R>> {
        let text = self.fetch_text(R::DATASET).await?;
        let records = decode::<R>(&text)?;

        info!(
            dataset = %R::DATASET,
            records = records.len(),
            "Decoded {} {} records",
            records.len(),
            R::DATASET
        );

        Ok(records)
    }

    /// Download a dataset body as text
    ///
    /// Upstream files carry stray non-UTF-8 bytes, so invalid sequences are
    /// replaced rather than rejected.
    pub async fn fetch_text(&self, dataset: Dataset) -> std::result::Result<String, FetchError> {
        let url = self.dataset_url(dataset);
        info!(dataset = %dataset, url = %url, "Downloading {} dataset", dataset);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(dataset, &url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                dataset,
                url,
                status,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(dataset, &url, e))?;

        debug!(
            dataset = %dataset,
            bytes = bytes.len(),
            "Downloaded {} bytes ({} KB)",
            bytes.len(),
            bytes.len() / 1024
        );

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn transport_error(&self, dataset: Dataset, url: &str, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                dataset,
                url: url.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            FetchError::Transport {
                dataset,
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Decode headerless, comma-delimited dataset text against the record schema
///
/// `\N` and empty fields decode to `None`. Every row must carry exactly the
/// schema width; the first mismatch fails the whole dataset.
pub fn decode<R: DatasetRecord>(text: &str) -> std::result::Result<Vec<R>, DecodeError> {
    let dataset = R::DATASET;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let fallback_line = index as u64 + 1;
        let row = row.map_err(|source| DecodeError::Malformed {
            dataset,
            line: source.position().map_or(fallback_line, |p| p.line()),
            source,
        })?;
        let line = row.position().map_or(fallback_line, |p| p.line());

        if row.len() != dataset.width() {
            return Err(DecodeError::FieldCount {
                dataset,
                line,
                expected: dataset.width(),
                found: row.len(),
            });
        }

        let fields = row
            .iter()
            .map(|field| match field {
                "" | NULL_TOKEN => None,
                value => Some(value.to_string()),
            })
            .collect();

        records.push(R::from_fields(line, fields)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openflights::{FieldValue, RawAirline, RawAirport, RawRoute};

    #[test]
    fn test_decode_null_tokens() {
        let text = "1,\"Private flight\",\\N,\"-\",\"N/A\",\"\",,\"Y\"\n";
        let airlines = decode::<RawAirline>(text).unwrap();

        assert_eq!(airlines.len(), 1);
        let airline = &airlines[0];
        assert_eq!(airline.airline_id.as_deref(), Some("1"));
        assert_eq!(airline.alias, None);
        assert_eq!(airline.iata.as_deref(), Some("-"));
        assert_eq!(airline.callsign, None);
        assert_eq!(airline.country, None);
        assert_eq!(airline.active.as_deref(), Some("Y"));
    }

    #[test]
    fn test_decode_quoted_commas() {
        let text = "507,\"London Heathrow Airport\",\"London\",\"United Kingdom\",\"LHR\",\"EGLL\",51.4706,-0.461941,83,0,\"E\",\"Europe/London\",\"airport\",\"OurAirports\"\n\
                    9999,\"Hotel, Airstrip\",\"Nowhere\",\"Atlantis\",\\N,\"XXAS\",\\N,12.5,0,0,\"U\",\\N,\"airport\",\"User\"\n";
        let airports = decode::<RawAirport>(text).unwrap();

        assert_eq!(airports.len(), 2);
        assert_eq!(airports[0].latitude, FieldValue::Valid(51.4706));
        assert_eq!(airports[1].name.as_deref(), Some("Hotel, Airstrip"));
        assert_eq!(airports[1].iata, None);
        assert_eq!(airports[1].latitude, FieldValue::Absent);
    }

    #[test]
    fn test_decode_field_count_mismatch_reports_line() {
        let text = "2B,410,AER,2965,KZN,2990,,0,CR2\n\
                    2B,410,ASF,2966,KZN,2990,,0\n";
        let err = decode::<RawRoute>(text).unwrap_err();

        match err {
            DecodeError::FieldCount {
                dataset,
                line,
                expected,
                found,
            } => {
                assert_eq!(dataset, Dataset::Routes);
                assert_eq!(line, 2);
                assert_eq!(expected, 9);
                assert_eq!(found, 8);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_empty_text() {
        let routes = decode::<RawRoute>("").unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_dataset_url_joins_base() {
        let with_slash = OpenFlightsFetcher::new(&OpenFlightsConfig {
            base_url: "https://example.org/data/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        let without_slash = OpenFlightsFetcher::new(&OpenFlightsConfig {
            base_url: "https://example.org/data".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            with_slash.dataset_url(Dataset::Routes),
            "https://example.org/data/routes.dat"
        );
        assert_eq!(
            without_slash.dataset_url(Dataset::Airports),
            "https://example.org/data/airports.dat"
        );
    }
}
