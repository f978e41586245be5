//! Organization record with its geofence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GeoPoint;
use crate::error::{Error, Result};

/// How an organization's location was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// Entered by an administrator
    Manual,
    /// Resolved from the organization's address
    Geocode,
    /// Taken from the first intern check-in
    FirstCheckin,
    /// No location yet
    Pending,
}

impl LocationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationSource::Manual => "manual",
            LocationSource::Geocode => "geocode",
            LocationSource::FirstCheckin => "first_checkin",
            LocationSource::Pending => "pending",
        }
    }
}

impl std::fmt::Display for LocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields supplied when creating an organization
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
    pub geofence_radius_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Geofence center
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub geofence_radius_m: f64,
    pub location_source: LocationSource,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// Build a validated organization. `default_radius_m` applies when the
    /// request carries no radius.
    pub fn from_new(id: u64, new: NewOrganization, default_radius_m: f64) -> Result<Self> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation(
                "organization name must not be empty".to_string(),
            ));
        }

        let radius = new.geofence_radius_m.unwrap_or(default_radius_m);
        validate_radius(radius)?;

        if let Some(ref location) = new.location {
            location.validate()?;
        }

        let address = new
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        let location_source = if new.location.is_some() {
            LocationSource::Manual
        } else {
            LocationSource::Pending
        };

        Ok(Self {
            id,
            name,
            address,
            location: new.location,
            geofence_radius_m: radius,
            location_source,
            created_at: Utc::now(),
        })
    }

    pub fn has_location(&self) -> bool {
        self.location.is_some()
    }

    /// Set the geofence center along with its provenance
    pub fn set_location(&mut self, location: GeoPoint, source: LocationSource) -> Result<()> {
        location.validate()?;
        self.location = Some(location);
        self.location_source = source;
        Ok(())
    }

    pub fn set_radius(&mut self, radius_m: f64) -> Result<()> {
        validate_radius(radius_m)?;
        self.geofence_radius_m = radius_m;
        Ok(())
    }

    /// Check the record invariants (used before persisting edits)
    pub fn validate(&self) -> Result<()> {
        validate_radius(self.geofence_radius_m)?;
        if let Some(ref location) = self.location {
            location.validate()?;
        }
        Ok(())
    }
}

fn validate_radius(radius_m: f64) -> Result<()> {
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(Error::Validation(format!(
            "geofence radius must be a non-negative number of meters, got {}",
            radius_m
        )));
    }
    Ok(())
}
