// OpenFlights Identity Normalization

use crate::openflights::{Airline, Airport, RawAirline, RawAirport};
use airfacts_common::geo::{validate_coordinates, GeoPoint};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Trim and upper-case a code, treating blank input as absent
pub(crate) fn clean_code(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_uppercase)
}

/// Parse an OpenFlights internal ID, treating blank or non-numeric input as absent
pub(crate) fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|id| !id.is_empty())
        .and_then(|id| id.parse().ok())
}

/// Resolve the public code of an airport or airline
///
/// The primary (IATA) code wins when it has any non-blank content, otherwise
/// the fallback (ICAO) code is used. Both are trimmed and upper-cased.
pub fn harmonize_code(primary: Option<&str>, fallback: Option<&str>) -> Option<String> {
    clean_code(primary).or_else(|| clean_code(fallback))
}

/// Internal numeric ID -> resolved public code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeLookup(HashMap<i64, String>);

impl CodeLookup {
    pub fn get(&self, id: i64) -> Option<&str> {
        self.0.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(i64, String)> for CodeLookup {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        CodeLookup(iter.into_iter().collect())
    }
}

/// Airport code -> coordinates, holding only numerically valid pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateIndex(HashMap<String, GeoPoint>);

impl CoordinateIndex {
    pub fn get(&self, code: &str) -> Option<GeoPoint> {
        self.0.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, GeoPoint)> for CoordinateIndex {
    fn from_iter<I: IntoIterator<Item = (String, GeoPoint)>>(iter: I) -> Self {
        CoordinateIndex(
            iter.into_iter()
                .filter(|(_, point)| validate_coordinates(point.latitude, point.longitude))
                .collect(),
        )
    }
}

/// Cleaned airport table plus the lookups routes are enriched from
#[derive(Debug, Clone, Default)]
pub struct NormalizedAirports {
    pub airports: Vec<Airport>,
    pub codes: CodeLookup,
    pub coordinates: CoordinateIndex,
    /// Records without a usable ID or code
    pub dropped: usize,
    /// Records collapsed onto an earlier record with the same ID
    pub duplicates: usize,
    /// Records whose latitude or longitude was present but not a number
    pub invalid_coordinates: usize,
}

/// Cleaned airline table plus its ID lookup
#[derive(Debug, Clone, Default)]
pub struct NormalizedAirlines {
    pub airlines: Vec<Airline>,
    pub codes: CodeLookup,
    pub dropped: usize,
    pub duplicates: usize,
}

/// Keep one record per ID: the last record seen, in the first one's position
fn dedup_last_seen<T>(records: impl IntoIterator<Item = (i64, T)>) -> (Vec<T>, usize) {
    let mut slots: HashMap<i64, usize> = HashMap::new();
    let mut kept: Vec<T> = Vec::new();
    let mut duplicates = 0;

    for (id, record) in records {
        match slots.entry(id) {
            Entry::Occupied(slot) => {
                kept[*slot.get()] = record;
                duplicates += 1;
            },
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(record);
            },
        }
    }

    (kept, duplicates)
}

fn prepare_airport(raw: RawAirport) -> Option<Airport> {
    let iata = harmonize_code(raw.iata.as_deref(), raw.icao.as_deref())?;
    let airport_id = parse_id(raw.airport_id.as_deref())?;

    Some(Airport {
        airport_id,
        iata,
        icao: clean_code(raw.icao.as_deref()),
        name: raw.name,
        city: raw.city,
        country: raw.country,
        latitude: raw.latitude.into_valid(),
        longitude: raw.longitude.into_valid(),
        altitude: raw.altitude.into_valid(),
        timezone: raw.timezone.into_valid(),
        dst: raw.dst,
        tz_database: raw.tz_database,
        airport_type: raw.airport_type,
        source: raw.source,
    })
}

fn prepare_airline(raw: RawAirline) -> Option<Airline> {
    let iata = harmonize_code(raw.iata.as_deref(), raw.icao.as_deref())?;
    let airline_id = parse_id(raw.airline_id.as_deref())?;

    Some(Airline {
        airline_id,
        iata,
        icao: clean_code(raw.icao.as_deref()),
        name: raw.name,
        alias: raw.alias,
        callsign: raw.callsign,
        country: raw.country,
        active: clean_code(raw.active.as_deref()),
    })
}

fn has_invalid_coordinates(raw: &RawAirport) -> bool {
    let bad = raw.latitude.invalid().or_else(|| raw.longitude.invalid());
    if let Some(text) = bad {
        debug!(
            airport_id = raw.airport_id.as_deref().unwrap_or("-"),
            value = text,
            "Unparsable airport coordinate"
        );
    }
    bad.is_some()
}

/// Harmonize, validate and deduplicate raw airports
pub fn normalize_airports(raw: Vec<RawAirport>) -> NormalizedAirports {
    let total = raw.len();
    let invalid_coordinates = raw.iter().filter(|r| has_invalid_coordinates(r)).count();
    let prepared: Vec<(i64, Airport)> = raw
        .into_iter()
        .filter_map(prepare_airport)
        .map(|airport| (airport.airport_id, airport))
        .collect();
    let dropped = total - prepared.len();

    let (airports, duplicates) = dedup_last_seen(prepared);

    let codes = airports
        .iter()
        .map(|a| (a.airport_id, a.iata.clone()))
        .collect();
    let coordinates: CoordinateIndex = airports
        .iter()
        .filter_map(|a| a.coordinates().map(|point| (a.iata.clone(), point)))
        .collect();

    info!(
        dataset = "airports",
        total,
        kept = airports.len(),
        dropped,
        duplicates,
        "Normalized airports: {} kept, {} dropped, {} duplicates",
        airports.len(),
        dropped,
        duplicates
    );
    if invalid_coordinates > 0 {
        warn!(
            dataset = "airports",
            invalid_coordinates,
            "{} airports have unparsable coordinates, their routes carry no distance",
            invalid_coordinates
        );
    }
    debug!(coordinates = coordinates.len(), "Built airport coordinate index");

    NormalizedAirports {
        airports,
        codes,
        coordinates,
        dropped,
        duplicates,
        invalid_coordinates,
    }
}

/// Harmonize, validate and deduplicate raw airlines
pub fn normalize_airlines(raw: Vec<RawAirline>) -> NormalizedAirlines {
    let total = raw.len();
    let prepared: Vec<(i64, Airline)> = raw
        .into_iter()
        .filter_map(prepare_airline)
        .map(|airline| (airline.airline_id, airline))
        .collect();
    let dropped = total - prepared.len();

    let (airlines, duplicates) = dedup_last_seen(prepared);

    let codes = airlines
        .iter()
        .map(|a| (a.airline_id, a.iata.clone()))
        .collect();

    info!(
        dataset = "airlines",
        total,
        kept = airlines.len(),
        dropped,
        duplicates,
        "Normalized airlines: {} kept, {} dropped, {} duplicates",
        airlines.len(),
        dropped,
        duplicates
    );

    NormalizedAirlines {
        airlines,
        codes,
        dropped,
        duplicates,
    }
}
