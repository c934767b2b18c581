//! Great-circle distance between geographic coordinates
//!
//! Distances use the haversine formula on a spherical Earth. Three units are
//! supported, each with its own Earth radius:
//!
//! | unit | radius |
//! |------|--------|
//! | kilometers | 6371.0 |
//! | statute miles | 3958.8 |
//! | nautical miles | 3440.1 |
//!
//! Upstream airport data routinely omits coordinates, so ingestion code should
//! go through [`calculate_distance_safe`], which yields `None` instead of
//! computing on missing or out-of-range input.
//!
//! # Example
//!
//! ```
//! use airfacts_common::geo::{airport_distance, GeoPoint};
//!
//! let lhr = GeoPoint::new(51.4700, -0.4543);
//! let cdg = GeoPoint::new(49.0097, 2.5479);
//! let km = airport_distance(lhr, cdg, 2);
//! assert!((km - 344.0).abs() < 5.0);
//! ```

use crate::error::{AirfactsError, Result};
use serde::{Deserialize, Serialize};

/// Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth radius in statute miles
pub const EARTH_RADIUS_MI: f64 = 3958.8;

/// Earth radius in nautical miles
pub const EARTH_RADIUS_NM: f64 = 3440.1;

/// Decimal places kept on distances attached to routes
pub const DEFAULT_DISTANCE_DECIMALS: u32 = 2;

/// A latitude/longitude pair in decimal degrees (WGS84 assumed)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components lie in their valid ranges
    pub fn is_valid(&self) -> bool {
        validate_coordinates(self.latitude, self.longitude)
    }
}

/// Unit of a computed distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Kilometers,
    Miles,
    NauticalMiles,
}

impl DistanceUnit {
    /// Earth radius expressed in this unit
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
            DistanceUnit::Miles => EARTH_RADIUS_MI,
            DistanceUnit::NauticalMiles => EARTH_RADIUS_NM,
        }
    }
}

impl std::str::FromStr for DistanceUnit {
    type Err = AirfactsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "km" => Ok(DistanceUnit::Kilometers),
            "mi" | "miles" => Ok(DistanceUnit::Miles),
            "nm" | "nautical" => Ok(DistanceUnit::NauticalMiles),
            _ => Err(AirfactsError::InvalidUnit(s.to_string())),
        }
    }
}

impl std::fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceUnit::Kilometers => write!(f, "km"),
            DistanceUnit::Miles => write!(f, "mi"),
            DistanceUnit::NauticalMiles => write!(f, "nm"),
        }
    }
}

/// Haversine distance between two points in the given unit
///
/// Inputs are not range-checked; callers holding untrusted data should use
/// [`calculate_distance_safe`].
pub fn haversine(from: GeoPoint, to: GeoPoint, unit: DistanceUnit) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1.0 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    c * unit.earth_radius()
}

/// Distance between two coordinates with the unit given by name
///
/// Accepts `km`, `mi`/`miles` and `nm`/`nautical` (case-insensitive).
///
/// # Errors
///
/// Returns [`AirfactsError::InvalidUnit`] for any other unit name.
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, unit: &str) -> Result<f64> {
    let unit: DistanceUnit = unit.parse()?;
    Ok(haversine(GeoPoint::new(lat1, lon1), GeoPoint::new(lat2, lon2), unit))
}

/// Distance in kilometers
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine(
        GeoPoint::new(lat1, lon1),
        GeoPoint::new(lat2, lon2),
        DistanceUnit::Kilometers,
    )
}

/// Distance in statute miles
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine(
        GeoPoint::new(lat1, lon1),
        GeoPoint::new(lat2, lon2),
        DistanceUnit::Miles,
    )
}

/// Latitude in [-90, 90] and longitude in [-180, 180]; NaN is invalid
pub fn validate_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// Distance that tolerates missing or invalid coordinates
///
/// Returns `None` when any coordinate is absent or outside its valid range.
/// Never panics and never errors.
pub fn calculate_distance_safe(
    lat1: Option<f64>,
    lon1: Option<f64>,
    lat2: Option<f64>,
    lon2: Option<f64>,
    unit: DistanceUnit,
) -> Option<f64> {
    let from = GeoPoint::new(lat1?, lon1?);
    let to = GeoPoint::new(lat2?, lon2?);

    if !(from.is_valid() && to.is_valid()) {
        return None;
    }

    Some(haversine(from, to, unit))
}

/// Kilometer distance between two airports rounded to `decimals` places
pub fn airport_distance(origin: GeoPoint, destination: GeoPoint, decimals: u32) -> f64 {
    round_to(haversine(origin, destination, DistanceUnit::Kilometers), decimals)
}

/// Round half away from zero to a number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
