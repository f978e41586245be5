//! Point-in-geofence checks.

use geo::{Distance, Haversine};

use crate::error::{Error, Result};
use crate::models::{GeoPoint, GeofenceStatus, Organization};

/// Slack added to the radius so a point computed to sit exactly on the
/// boundary is not rejected by floating-point noise (1 mm).
pub const GEOFENCE_TOLERANCE_M: f64 = 0.001;

/// Outcome of evaluating a point against an organization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceCheck {
    pub status: GeofenceStatus,
    /// `None` when the organization has no location
    pub distance_m: Option<f64>,
}

/// Great-circle distance in meters
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(a.to_geo(), b.to_geo())
}

/// True iff `point` lies within the organization's radius.
///
/// Fails with `GeofenceNotConfigured` when the organization has no location.
pub fn is_inside(point: GeoPoint, organization: &Organization) -> Result<bool> {
    let center = organization
        .location
        .ok_or(Error::GeofenceNotConfigured(organization.id))?;

    Ok(within(distance_m(point, center), organization.geofence_radius_m))
}

/// Tri-state evaluation used by ingest
pub fn evaluate(point: GeoPoint, organization: &Organization) -> GeofenceCheck {
    match organization.location {
        Some(center) => {
            let distance = distance_m(point, center);
            let status = if within(distance, organization.geofence_radius_m) {
                GeofenceStatus::Inside
            } else {
                GeofenceStatus::Outside
            };
            GeofenceCheck {
                status,
                distance_m: Some(distance),
            }
        }
        None => GeofenceCheck {
            status: GeofenceStatus::Unconfigured,
            distance_m: None,
        },
    }
}

fn within(distance_m: f64, radius_m: f64) -> bool {
    distance_m <= radius_m + GEOFENCE_TOLERANCE_M
}
