//! Fencepost - geofenced attendance tracking for interns
//!
//! This library provides the geofence evaluator, the check-in ingest
//! pipeline, geocoding and the attendance store shared by the `server`
//! and `orgctl` binaries.

pub mod checkin;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod geofence;
pub mod history;
pub mod models;
pub mod store;

pub use error::{Error, Result};
pub use models::{GeoPoint, GeofenceStatus, Intern, LocationLog, LocationSource, Organization};
