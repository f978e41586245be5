//! Forward and reverse geocoding.

mod nominatim;

pub use nominatim::NominatimGeocoder;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{GeoPoint, LocationSource, Organization};

/// Address lookup service
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve an address to coordinates; `Ok(None)` when nothing matched
    async fn forward(&self, address: &str) -> Result<Option<GeoPoint>>;

    /// Resolve coordinates to a display address; `Ok(None)` when nothing matched
    async fn reverse(&self, point: GeoPoint) -> Result<Option<String>>;
}

/// Geocode the organization's address into its geofence center.
///
/// Returns false when the address is missing, the lookup fails or nothing
/// matched; the organization is left untouched in that case. No retries.
pub async fn geocode_from_address(geocoder: &dyn Geocoder, organization: &mut Organization) -> bool {
    let address = match organization.address.as_deref().map(str::trim) {
        Some(a) if !a.is_empty() => a.to_string(),
        _ => {
            warn!("Organization {} has no address to geocode", organization.id);
            return false;
        }
    };

    let point = match geocoder.forward(&address).await {
        Ok(Some(point)) => point,
        Ok(None) => {
            warn!(
                "No geocoding match for organization {} ('{}')",
                organization.id, address
            );
            return false;
        }
        Err(e) => {
            warn!("Failed to geocode organization {}: {}", organization.id, e);
            return false;
        }
    };

    if let Err(e) = organization.set_location(point, LocationSource::Geocode) {
        warn!(
            "Geocoder returned an invalid point for organization {}: {}",
            organization.id, e
        );
        return false;
    }

    info!("Geocoded organization {} to {}", organization.id, point);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::Utc;

    struct FixedForward(Option<GeoPoint>);

    #[async_trait]
    impl Geocoder for FixedForward {
        async fn forward(&self, _address: &str) -> Result<Option<GeoPoint>> {
            Ok(self.0)
        }

        async fn reverse(&self, _point: GeoPoint) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct Unreachable;

    #[async_trait]
    impl Geocoder for Unreachable {
        async fn forward(&self, _address: &str) -> Result<Option<GeoPoint>> {
            Err(Error::Geocoding("connection refused".to_string()))
        }

        async fn reverse(&self, _point: GeoPoint) -> Result<Option<String>> {
            Err(Error::Geocoding("connection refused".to_string()))
        }
    }

    fn org(address: Option<&str>) -> Organization {
        Organization {
            id: 4,
            name: "Riverside Works".to_string(),
            address: address.map(String::from),
            location: None,
            geofence_radius_m: 100.0,
            location_source: LocationSource::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_success_sets_location_and_provenance() {
        let point = GeoPoint {
            lat: 51.5,
            lon: -0.12,
        };
        let mut o = org(Some("10 Downing St, London"));

        assert!(geocode_from_address(&FixedForward(Some(point)), &mut o).await);
        assert_eq!(o.location, Some(point));
        assert_eq!(o.location_source, LocationSource::Geocode);
    }

    #[tokio::test]
    async fn test_no_match_reports_failure() {
        let mut o = org(Some("Nowhere"));
        assert!(!geocode_from_address(&FixedForward(None), &mut o).await);
        assert!(o.location.is_none());
        assert_eq!(o.location_source, LocationSource::Pending);
    }

    #[tokio::test]
    async fn test_service_error_reports_failure() {
        let mut o = org(Some("1 Main St"));
        assert!(!geocode_from_address(&Unreachable, &mut o).await);
        assert!(o.location.is_none());
    }

    #[tokio::test]
    async fn test_missing_address() {
        let point = GeoPoint { lat: 1.0, lon: 1.0 };
        let mut o = org(None);
        assert!(!geocode_from_address(&FixedForward(Some(point)), &mut o).await);

        let mut blank = org(Some("   "));
        assert!(!geocode_from_address(&FixedForward(Some(point)), &mut blank).await);
    }

    #[tokio::test]
    async fn test_invalid_point_rejected() {
        let bogus = GeoPoint {
            lat: 123.0,
            lon: 0.0,
        };
        let mut o = org(Some("1 Main St"));
        assert!(!geocode_from_address(&FixedForward(Some(bogus)), &mut o).await);
        assert!(o.location.is_none());
    }
}
