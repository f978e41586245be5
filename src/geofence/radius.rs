//! Radius tuning from historical check-ins.

use super::distance_m;
use crate::models::GeoPoint;

/// Share of check-ins a tuned radius should cover
pub const DEFAULT_COVERAGE: f64 = 0.95;

/// Smallest radius around `center` that covers `coverage` of `points`.
///
/// Returns `None` when there are no points or `coverage` is not in (0, 1].
pub fn optimal_radius(center: GeoPoint, points: &[GeoPoint], coverage: f64) -> Option<f64> {
    if points.is_empty() || !(coverage > 0.0 && coverage <= 1.0) {
        return None;
    }

    let mut distances: Vec<f64> = points.iter().map(|p| distance_m(center, *p)).collect();
    distances.sort_by(|a, b| a.total_cmp(b));

    let needed = (distances.len() as f64 * coverage).ceil() as usize;
    let index = needed.clamp(1, distances.len()) - 1;
    Some(distances[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Destination, Haversine};

    fn center() -> GeoPoint {
        GeoPoint {
            lat: 40.0,
            lon: -73.0,
        }
    }

    fn ring(meters: &[f64]) -> Vec<GeoPoint> {
        meters
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let bearing = (i as f64 * 37.0) % 360.0;
                Haversine.destination(center().to_geo(), bearing, *m).into()
            })
            .collect()
    }

    #[test]
    fn test_covers_95_percent() {
        let meters: Vec<f64> = (1..=20).map(|m| m as f64).collect();
        let radius = optimal_radius(center(), &ring(&meters), DEFAULT_COVERAGE).unwrap();
        assert!((radius - 19.0).abs() < 1e-6, "got {}", radius);
    }

    #[test]
    fn test_full_coverage_is_max_distance() {
        let radius = optimal_radius(center(), &ring(&[30.0, 10.0, 20.0]), 1.0).unwrap();
        assert!((radius - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_point() {
        let radius = optimal_radius(center(), &ring(&[42.0]), 0.5).unwrap();
        assert!((radius - 42.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(optimal_radius(center(), &[], 0.95).is_none());
        assert!(optimal_radius(center(), &ring(&[1.0]), 0.0).is_none());
        assert!(optimal_radius(center(), &ring(&[1.0]), 1.5).is_none());
        assert!(optimal_radius(center(), &ring(&[1.0]), f64::NAN).is_none());
    }
}
