//! Append-only check-in record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// Display width used by `address_short`
pub const ADDRESS_SHORT_LEN: usize = 50;

/// Geofence membership computed at ingest time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceStatus {
    Inside,
    Outside,
    /// The organization had no location when the check-in arrived
    Unconfigured,
}

impl GeofenceStatus {
    /// `None` when no geofence was configured
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GeofenceStatus::Inside => Some(true),
            GeofenceStatus::Outside => Some(false),
            GeofenceStatus::Unconfigured => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeofenceStatus::Inside => "inside",
            GeofenceStatus::Outside => "outside",
            GeofenceStatus::Unconfigured => "unconfigured",
        }
    }
}

impl std::fmt::Display for GeofenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row contents before the store assigns an id
#[derive(Debug, Clone)]
pub struct NewLocationLog {
    pub intern_id: u64,
    pub organization_id: u64,
    pub point: GeoPoint,
    pub timestamp: DateTime<Utc>,
    pub address: String,
    pub accuracy: Option<f64>,
    pub geofence: GeofenceStatus,
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationLog {
    pub id: u64,
    pub intern_id: u64,
    pub organization_id: u64,
    pub point: GeoPoint,
    pub timestamp: DateTime<Utc>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub geofence: GeofenceStatus,
    /// Distance to the organization center, when one was configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

impl LocationLog {
    pub fn from_new(id: u64, new: NewLocationLog) -> Self {
        Self {
            id,
            intern_id: new.intern_id,
            organization_id: new.organization_id,
            point: new.point,
            timestamp: new.timestamp,
            address: new.address,
            accuracy: new.accuracy,
            geofence: new.geofence,
            distance_m: new.distance_m,
        }
    }

    /// Address cut to `ADDRESS_SHORT_LEN` characters for listings
    pub fn address_short(&self) -> String {
        truncate_address(&self.address, ADDRESS_SHORT_LEN)
    }
}

pub fn truncate_address(address: &str, max_chars: usize) -> String {
    if address.chars().count() <= max_chars {
        return address.to_string();
    }
    let mut short: String = address.chars().take(max_chars).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tristate() {
        assert_eq!(GeofenceStatus::Inside.as_bool(), Some(true));
        assert_eq!(GeofenceStatus::Outside.as_bool(), Some(false));
        assert_eq!(GeofenceStatus::Unconfigured.as_bool(), None);
    }

    #[test]
    fn test_truncate_address() {
        assert_eq!(truncate_address("short", 50), "short");
        assert_eq!(truncate_address("", 50), "");

        let long = "a".repeat(60);
        let short = truncate_address(&long, 50);
        assert_eq!(short.len(), 53);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let address = "Straße ".repeat(10);
        let short = truncate_address(&address, 8);
        assert_eq!(short, "Straße S...");
    }
}
