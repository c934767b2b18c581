// OpenFlights Data Models

use crate::error::DecodeError;
use crate::openflights::Dataset;
use airfacts_common::geo::GeoPoint;
use serde::Serialize;
use std::str::FromStr;

// ============================================================================
// Field decoding
// ============================================================================

/// A typed field that keeps "missing" apart from "present but unusable"
///
/// Consumers pick their own policy: stop counts default to zero on anything
/// but a valid number, while coordinates leave the derived distance absent.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    Valid(T),
    Invalid(String),
    Absent,
}

impl<T: FromStr> FieldValue<T> {
    /// Parse a raw field, trimming surrounding whitespace first
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => FieldValue::Absent,
            Some(text) => match text.parse() {
                Ok(value) => FieldValue::Valid(value),
                Err(_) => FieldValue::Invalid(text.to_string()),
            },
        }
    }
}

impl<T> FieldValue<T> {
    /// Raw text of a field that failed to parse
    pub fn invalid(&self) -> Option<&str> {
        match self {
            FieldValue::Invalid(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_valid(self) -> Option<T> {
        match self {
            FieldValue::Valid(value) => Some(value),
            _ => None,
        }
    }
}

/// A record type decodable from one row of an OpenFlights file
pub trait DatasetRecord: Sized {
    const DATASET: Dataset;

    /// Build the record from the row's fields; `None` marks a null token
    fn from_fields(line: u64, fields: Vec<Option<String>>) -> Result<Self, DecodeError>;
}

fn fixed_width<const N: usize>(
    dataset: Dataset,
    line: u64,
    fields: Vec<Option<String>>,
) -> Result<[Option<String>; N], DecodeError> {
    <[Option<String>; N]>::try_from(fields).map_err(|fields| DecodeError::FieldCount {
        dataset,
        line,
        expected: N,
        found: fields.len(),
    })
}

// ============================================================================
// Raw records (as decoded, before normalization)
// ============================================================================

/// One row of airports.dat
#[derive(Debug, Clone, PartialEq)]
pub struct RawAirport {
    pub airport_id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub iata: Option<String>,
    pub icao: Option<String>,
    pub latitude: FieldValue<f64>,
    pub longitude: FieldValue<f64>,
    pub altitude: FieldValue<f64>,
    pub timezone: FieldValue<f64>,
    pub dst: Option<String>,
    pub tz_database: Option<String>,
    pub airport_type: Option<String>,
    pub source: Option<String>,
}

impl DatasetRecord for RawAirport {
    const DATASET: Dataset = Dataset::Airports;

    fn from_fields(line: u64, fields: Vec<Option<String>>) -> Result<Self, DecodeError> {
        let [airport_id, name, city, country, iata, icao, latitude, longitude, altitude, timezone, dst, tz_database, airport_type, source] =
            fixed_width::<14>(Self::DATASET, line, fields)?;

        Ok(RawAirport {
            airport_id,
            name,
            city,
            country,
            iata,
            icao,
            latitude: FieldValue::parse(latitude.as_deref()),
            longitude: FieldValue::parse(longitude.as_deref()),
            altitude: FieldValue::parse(altitude.as_deref()),
            timezone: FieldValue::parse(timezone.as_deref()),
            dst,
            tz_database,
            airport_type,
            source,
        })
    }
}

/// One row of airlines.dat
#[derive(Debug, Clone, PartialEq)]
pub struct RawAirline {
    pub airline_id: Option<String>,
    pub name: Option<String>,
    pub alias: Option<String>,
    pub iata: Option<String>,
    pub icao: Option<String>,
    pub callsign: Option<String>,
    pub country: Option<String>,
    pub active: Option<String>,
}

impl DatasetRecord for RawAirline {
    const DATASET: Dataset = Dataset::Airlines;

    fn from_fields(line: u64, fields: Vec<Option<String>>) -> Result<Self, DecodeError> {
        let [airline_id, name, alias, iata, icao, callsign, country, active] =
            fixed_width::<8>(Self::DATASET, line, fields)?;

        Ok(RawAirline {
            airline_id,
            name,
            alias,
            iata,
            icao,
            callsign,
            country,
            active,
        })
    }
}

/// One row of routes.dat
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRoute {
    pub airline: Option<String>,
    pub airline_id: Option<String>,
    pub source: Option<String>,
    pub source_id: Option<String>,
    pub destination: Option<String>,
    pub destination_id: Option<String>,
    pub codeshare: Option<String>,
    pub stops: Option<String>,
    pub equipment: Option<String>,
}

impl DatasetRecord for RawRoute {
    const DATASET: Dataset = Dataset::Routes;

    fn from_fields(line: u64, fields: Vec<Option<String>>) -> Result<Self, DecodeError> {
        let [airline, airline_id, source, source_id, destination, destination_id, codeshare, stops, equipment] =
            fixed_width::<9>(Self::DATASET, line, fields)?;

        Ok(RawRoute {
            airline,
            airline_id,
            source,
            source_id,
            destination,
            destination_id,
            codeshare,
            stops,
            equipment,
        })
    }
}

// ============================================================================
// Prepared records (wire representation for the graph upserts)
// ============================================================================

/// A normalized airport, keyed by its resolved public code
///
/// `iata` holds the IATA code when the source has one and the ICAO code
/// otherwise; it is always non-empty, trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Airport {
    pub airport_id: i64,
    pub iata: String,
    pub icao: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub timezone: Option<f64>,
    pub dst: Option<String>,
    pub tz_database: Option<String>,
    pub airport_type: Option<String>,
    pub source: Option<String>,
}

impl Airport {
    /// Coordinates when both components decoded as numbers
    pub fn coordinates(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.latitude?, self.longitude?))
    }
}

/// A normalized airline, keyed by its resolved public code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Airline {
    pub airline_id: i64,
    pub iata: String,
    pub icao: Option<String>,
    pub name: Option<String>,
    pub alias: Option<String>,
    pub callsign: Option<String>,
    pub country: Option<String>,
    /// Upper-cased "Y"/"N" when the source provides it
    pub active: Option<String>,
}

/// A route with resolved endpoints and derived distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub airline: String,
    pub airline_id: Option<i64>,
    pub source: String,
    pub source_id: Option<i64>,
    pub destination: String,
    pub destination_id: Option<i64>,
    pub codeshare: Option<String>,
    pub stops: u32,
    pub equipment: Option<String>,
    /// Great-circle kilometers, absent when either endpoint lacks coordinates
    pub distance: Option<f64>,
}
