//! Airfacts Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Airfacts workspace.
//!
//! # Overview
//!
//! - **Error Handling**: Shared error type and result alias
//! - **Geodistance**: Haversine great-circle distance between coordinates
//! - **Logging**: Centralized `tracing` subscriber configuration
//!
//! # Example
//!
//! ```
//! use airfacts_common::geo::{haversine, DistanceUnit, GeoPoint};
//!
//! let jfk = GeoPoint::new(40.6413, -73.7781);
//! let lax = GeoPoint::new(33.9416, -118.4085);
//! let km = haversine(jfk, lax, DistanceUnit::Kilometers);
//! assert!((km - 3974.0).abs() < 10.0);
//! ```

pub mod error;
pub mod geo;
pub mod logging;

// Re-export commonly used types
pub use error::{AirfactsError, Result};
