// OpenFlights Dataset Ingestion
//
// The OpenFlights project publishes three headerless, comma-delimited files
// (airports.dat, airlines.dat, routes.dat) with `\N` as the null sentinel.
// Routes reference airports and airlines either by public code or by the
// numeric OpenFlights ID, so the datasets are processed in dependency order:
//
// - Fetch: HTTP download and decoding against a fixed column schema
// - Normalize: code harmonization, deduplication, ID -> code lookups
// - Enrich: route endpoint resolution, stop counts, great-circle distance

pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod routes;

pub use fetcher::{decode, OpenFlightsFetcher};
pub use models::{
    Airline, Airport, DatasetRecord, FieldValue, RawAirline, RawAirport, RawRoute, Route,
};
pub use normalize::{
    harmonize_code, normalize_airlines, normalize_airports, CodeLookup, CoordinateIndex,
    NormalizedAirlines, NormalizedAirports,
};
pub use routes::{normalize_stops, EnrichmentStats, RouteEnricher};

use airfacts_common::AirfactsError;
use serde::{Deserialize, Serialize};

/// Column names of airports.dat, in file order
pub const AIRPORT_COLUMNS: [&str; 14] = [
    "Airport ID",
    "Name",
    "City",
    "Country",
    "IATA",
    "ICAO",
    "Latitude",
    "Longitude",
    "Altitude",
    "Timezone",
    "DST",
    "Tz database time zone",
    "Type",
    "Source",
];

/// Column names of airlines.dat, in file order
pub const AIRLINE_COLUMNS: [&str; 8] = [
    "Airline ID",
    "Name",
    "Alias",
    "IATA",
    "ICAO",
    "Callsign",
    "Country",
    "Active",
];

/// Column names of routes.dat, in file order
pub const ROUTE_COLUMNS: [&str; 9] = [
    "Airline",
    "Airline ID",
    "Source airport",
    "Source airport ID",
    "Destination airport",
    "Destination airport ID",
    "Codeshare",
    "Stops",
    "Equipment",
];

/// One of the three upstream datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Airports,
    Airlines,
    Routes,
}

impl Dataset {
    /// All datasets in dependency order
    pub const ALL: [Dataset; 3] = [Dataset::Airports, Dataset::Airlines, Dataset::Routes];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Airports => "airports",
            Dataset::Airlines => "airlines",
            Dataset::Routes => "routes",
        }
    }

    /// Upstream file name relative to the dataset base URL
    pub fn filename(self) -> &'static str {
        match self {
            Dataset::Airports => "airports.dat",
            Dataset::Airlines => "airlines.dat",
            Dataset::Routes => "routes.dat",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Dataset::Airports => &AIRPORT_COLUMNS,
            Dataset::Airlines => &AIRLINE_COLUMNS,
            Dataset::Routes => &ROUTE_COLUMNS,
        }
    }

    /// Number of fields every row must carry
    pub fn width(self) -> usize {
        self.columns().len()
    }
}

impl std::str::FromStr for Dataset {
    type Err = AirfactsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "airports" => Ok(Dataset::Airports),
            "airlines" => Ok(Dataset::Airlines),
            "routes" => Ok(Dataset::Routes),
            _ => Err(AirfactsError::Parse(format!("Unknown dataset: {}", s))),
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_widths() {
        assert_eq!(Dataset::Airports.width(), 14);
        assert_eq!(Dataset::Airlines.width(), 8);
        assert_eq!(Dataset::Routes.width(), 9);
    }

    #[test]
    fn test_dataset_from_str() {
        assert_eq!("airports".parse::<Dataset>().unwrap(), Dataset::Airports);
        assert_eq!(" Routes ".parse::<Dataset>().unwrap(), Dataset::Routes);
        assert!("runways".parse::<Dataset>().is_err());
    }

    #[test]
    fn test_filenames() {
        let files: Vec<_> = Dataset::ALL.iter().map(|d| d.filename()).collect();
        assert_eq!(files, vec!["airports.dat", "airlines.dat", "routes.dat"]);
    }
}
