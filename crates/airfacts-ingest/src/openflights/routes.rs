// OpenFlights Route Enrichment

use crate::openflights::normalize::{clean_code, parse_id};
use crate::openflights::{CodeLookup, CoordinateIndex, RawRoute, Route};
use airfacts_common::geo::{calculate_distance_safe, round_to, DistanceUnit, DEFAULT_DISTANCE_DECIMALS};
use serde::Serialize;
use tracing::info;

// Exclusive upper bound: every f64 below it truncates into a u32 exactly
const STOPS_LIMIT: f64 = u32::MAX as f64 + 1.0;

/// Normalize a raw stop count
///
/// Integer and float strings truncate toward zero; anything absent, negative,
/// non-numeric or beyond `u32::MAX` becomes 0.
pub fn normalize_stops(raw: Option<&str>) -> u32 {
    match raw.map(str::trim).and_then(|s| s.parse::<f64>().ok()) {
        Some(value) if (0.0..STOPS_LIMIT).contains(&value) => value.trunc() as u32,
        _ => 0,
    }
}

/// Aggregate counts of one enrichment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnrichmentStats {
    pub total: usize,
    pub retained: usize,
    pub dropped: usize,
    pub with_distance: usize,
}

impl EnrichmentStats {
    /// Fraction of retained routes carrying a distance (0.0 when none retained)
    pub fn distance_coverage(&self) -> f64 {
        if self.retained == 0 {
            0.0
        } else {
            self.with_distance as f64 / self.retained as f64
        }
    }
}

/// Resolves route endpoints and attaches great-circle distances
///
/// Owns immutable lookups built once per run by the normalizer.
#[derive(Debug, Clone)]
pub struct RouteEnricher {
    airline_codes: CodeLookup,
    airport_codes: CodeLookup,
    coordinates: CoordinateIndex,
}

impl RouteEnricher {
    pub fn new(airline_codes: CodeLookup, airport_codes: CodeLookup, coordinates: CoordinateIndex) -> Self {
        RouteEnricher {
            airline_codes,
            airport_codes,
            coordinates,
        }
    }

    /// Enrich every route, dropping those with an unresolvable identity
    pub fn enrich(&self, raw: Vec<RawRoute>) -> (Vec<Route>, EnrichmentStats) {
        let total = raw.len();
        let routes: Vec<Route> = raw.into_iter().filter_map(|r| self.enrich_one(r)).collect();

        let stats = EnrichmentStats {
            total,
            retained: routes.len(),
            dropped: total - routes.len(),
            with_distance: routes.iter().filter(|r| r.distance.is_some()).count(),
        };

        info!(
            dataset = "routes",
            total = stats.total,
            retained = stats.retained,
            dropped = stats.dropped,
            with_distance = stats.with_distance,
            "Enriched routes: {} retained, {} with distance ({:.1}%)",
            stats.retained,
            stats.with_distance,
            stats.distance_coverage() * 100.0
        );

        (routes, stats)
    }

    /// Resolve one route; `None` when airline, source or destination stays unresolved
    pub fn enrich_one(&self, raw: RawRoute) -> Option<Route> {
        let airline_id = parse_id(raw.airline_id.as_deref());
        let source_id = parse_id(raw.source_id.as_deref());
        let destination_id = parse_id(raw.destination_id.as_deref());

        let airline = resolve(raw.airline.as_deref(), airline_id, &self.airline_codes)?;
        let source = resolve(raw.source.as_deref(), source_id, &self.airport_codes)?;
        let destination = resolve(raw.destination.as_deref(), destination_id, &self.airport_codes)?;

        let distance = self.distance(&source, &destination);

        Some(Route {
            airline,
            airline_id,
            source,
            source_id,
            destination,
            destination_id,
            codeshare: raw.codeshare,
            stops: normalize_stops(raw.stops.as_deref()),
            equipment: raw.equipment,
            distance,
        })
    }

    fn distance(&self, source: &str, destination: &str) -> Option<f64> {
        let from = self.coordinates.get(source);
        let to = self.coordinates.get(destination);

        calculate_distance_safe(
            from.map(|p| p.latitude),
            from.map(|p| p.longitude),
            to.map(|p| p.latitude),
            to.map(|p| p.longitude),
            DistanceUnit::Kilometers,
        )
        .map(|km| round_to(km, DEFAULT_DISTANCE_DECIMALS))
    }
}

fn resolve(code: Option<&str>, id: Option<i64>, lookup: &CodeLookup) -> Option<String> {
    clean_code(code).or_else(|| id.and_then(|id| lookup.get(id)).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use airfacts_common::geo::GeoPoint;

    fn enricher() -> RouteEnricher {
        let airline_codes: CodeLookup = [(24, "AA".to_string())].into_iter().collect();
        let airport_codes: CodeLookup = [(3797, "JFK".to_string()), (3484, "LAX".to_string()), (1, "GKA".to_string())]
            .into_iter()
            .collect();
        let coordinates: CoordinateIndex = [
            ("JFK".to_string(), GeoPoint::new(40.6413, -73.7781)),
            ("LAX".to_string(), GeoPoint::new(33.9416, -118.4085)),
        ]
        .into_iter()
        .collect();

        RouteEnricher::new(airline_codes, airport_codes, coordinates)
    }

    fn raw_route(airline: Option<&str>, source: Option<&str>, destination: Option<&str>) -> RawRoute {
        RawRoute {
            airline: airline.map(str::to_string),
            airline_id: Some("24".to_string()),
            source: source.map(str::to_string),
            source_id: Some("3797".to_string()),
            destination: destination.map(str::to_string),
            destination_id: Some("3484".to_string()),
            codeshare: None,
            stops: Some("0".to_string()),
            equipment: Some("32B 763".to_string()),
        }
    }

    #[test]
    fn test_normalize_stops() {
        assert_eq!(normalize_stops(Some("2")), 2);
        assert_eq!(normalize_stops(Some("2.0")), 2);
        assert_eq!(normalize_stops(None), 0);
        assert_eq!(normalize_stops(Some("abc")), 0);
        assert_eq!(normalize_stops(Some("-1")), 0);
        assert_eq!(normalize_stops(Some(" 1 ")), 1);
        assert_eq!(normalize_stops(Some("2.9")), 2);
    }

    #[test]
    fn test_normalize_stops_out_of_range() {
        assert_eq!(normalize_stops(Some("5000000000")), 0);
        assert_eq!(normalize_stops(Some("1e20")), 0);
        assert_eq!(normalize_stops(Some("inf")), 0);
        assert_eq!(normalize_stops(Some("4294967295")), u32::MAX);
        assert_eq!(normalize_stops(Some("4294967296")), 0);
    }

    #[test]
    fn test_enrich_direct_codes_with_distance() {
        let route = enricher()
            .enrich_one(raw_route(Some(" aa "), Some("jfk"), Some("LAX")))
            .unwrap();

        assert_eq!(route.airline, "AA");
        assert_eq!(route.source, "JFK");
        assert_eq!(route.destination, "LAX");
        assert_eq!(route.airline_id, Some(24));
        let distance = route.distance.unwrap();
        assert!((distance - 3974.0).abs() < 10.0, "got {}", distance);
        assert_eq!(distance, round_to(distance, 2));
    }

    #[test]
    fn test_enrich_falls_back_to_id_lookups() {
        let route = enricher().enrich_one(raw_route(None, Some("  "), None)).unwrap();

        assert_eq!(route.airline, "AA");
        assert_eq!(route.source, "JFK");
        assert_eq!(route.destination, "LAX");
    }

    #[test]
    fn test_enrich_drops_unresolvable() {
        let mut raw = raw_route(Some("AA"), Some("JFK"), None);
        raw.destination_id = Some("99999".to_string());
        assert!(enricher().enrich_one(raw).is_none());

        let mut raw = raw_route(None, Some("JFK"), Some("LAX"));
        raw.airline_id = None;
        assert!(enricher().enrich_one(raw).is_none());
    }

    #[test]
    fn test_distance_absent_without_coordinates() {
        let mut raw = raw_route(Some("AA"), Some("JFK"), None);
        raw.destination_id = Some("1".to_string());
        let route = enricher().enrich_one(raw).unwrap();

        assert_eq!(route.destination, "GKA");
        assert_eq!(route.distance, None);
    }

    #[test]
    fn test_enrich_stats() {
        let mut unresolvable = raw_route(Some("AA"), None, Some("LAX"));
        unresolvable.source_id = None;
        let mut no_coordinates = raw_route(Some("AA"), Some("JFK"), Some("GKA"));
        no_coordinates.stops = Some("\\N".to_string());

        let (routes, stats) = enricher().enrich(vec![
            raw_route(Some("AA"), Some("JFK"), Some("LAX")),
            unresolvable,
            no_coordinates,
        ]);

        assert_eq!(routes.len(), 2);
        assert_eq!(
            stats,
            EnrichmentStats {
                total: 3,
                retained: 2,
                dropped: 1,
                with_distance: 1,
            }
        );
        assert!((stats.distance_coverage() - 0.5).abs() < f64::EPSILON);
        assert_eq!(routes[1].stops, 0);
    }

    #[test]
    fn test_distance_coverage_empty() {
        assert_eq!(EnrichmentStats::default().distance_coverage(), 0.0);
    }
}
