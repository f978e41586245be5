//! Geofence evaluation.
//!
//! A geofence is a circle around an organization's location. Membership is
//! decided on the haversine distance, which is plenty for campus-sized
//! radii (hundreds of meters to a few kilometers).

mod evaluator;
mod radius;

pub use evaluator::{distance_m, evaluate, is_inside, GeofenceCheck, GEOFENCE_TOLERANCE_M};
pub use radius::{optimal_radius, DEFAULT_COVERAGE};
