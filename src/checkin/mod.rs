//! Location ingest: validate, reverse geocode, evaluate, append.

mod payload;

pub use payload::{Coordinate, LocationPayload, ValidatedLocation};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::geocoding::{geocode_from_address, Geocoder};
use crate::geofence;
use crate::models::{
    GeoPoint, GeofenceStatus, LocationLog, LocationSource, NewLocationLog, Organization,
};
use crate::store::Store;

/// Address stored when reverse geocoding fails, times out or finds nothing
pub const UNKNOWN_ADDRESS: &str = "Unknown location";

#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Upper bound on a reverse geocoding call
    pub geocode_timeout: Duration,
    /// Run `bootstrap_organization_location` after a check-in against an
    /// organization that has no location yet
    pub bootstrap_on_first_checkin: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            geocode_timeout: Duration::from_secs(5),
            bootstrap_on_first_checkin: true,
        }
    }
}

impl From<&Config> for IngestSettings {
    fn from(config: &Config) -> Self {
        Self {
            geocode_timeout: config.geocoder.timeout(),
            bootstrap_on_first_checkin: config.geofence.bootstrap_on_first_checkin,
        }
    }
}

/// Result of one check-in
#[derive(Debug, Clone, Serialize)]
pub struct CheckinOutcome {
    pub log: LocationLog,
    /// The check-in became the organization's location
    pub organization_bootstrapped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeocodeOutcome {
    pub geocoded: bool,
    pub organization: Organization,
}

/// Check-in pipeline with its collaborators passed in at construction
#[derive(Clone)]
pub struct LocationIngest {
    store: Store,
    geocoder: Arc<dyn Geocoder>,
    settings: IngestSettings,
}

impl LocationIngest {
    pub fn new(store: Store, geocoder: Arc<dyn Geocoder>, settings: IngestSettings) -> Self {
        Self {
            store,
            geocoder,
            settings,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Record a check-in for `intern_id`.
    ///
    /// Invalid coordinates and unknown interns are rejected before anything
    /// is written. Exactly one log row is appended otherwise, even when the
    /// address lookup fails.
    pub async fn record_location(
        &self,
        intern_id: u64,
        payload: &LocationPayload,
    ) -> Result<CheckinOutcome> {
        let location = payload.validate()?;
        let intern = self.store.require_intern(intern_id)?;
        let organization = self.store.require_organization(intern.organization_id)?;

        let check = geofence::evaluate(location.point, &organization);
        let address = self.resolve_address(location.point).await;

        let log = self.store.append_location_log(NewLocationLog {
            intern_id: intern.id,
            organization_id: organization.id,
            point: location.point,
            timestamp: Utc::now(),
            address,
            accuracy: location.accuracy,
            geofence: check.status,
            distance_m: check.distance_m,
        })?;

        info!(
            intern = intern.id,
            organization = organization.id,
            status = %log.geofence,
            "Recorded check-in {}",
            log.id
        );

        let organization_bootstrapped = if self.settings.bootstrap_on_first_checkin
            && check.status == GeofenceStatus::Unconfigured
        {
            // The log row is already written; a failed bootstrap must not fail the check-in
            match self.bootstrap_organization_location(organization.id, location.point) {
                Ok(done) => done,
                Err(e) => {
                    warn!(
                        "Failed to bootstrap location of organization {}: {}",
                        organization.id, e
                    );
                    false
                }
            }
        } else {
            false
        };

        Ok(CheckinOutcome {
            log,
            organization_bootstrapped,
        })
    }

    /// Adopt `point` as the organization's location if it has none.
    ///
    /// Returns whether the location was set. An existing location is never
    /// replaced.
    pub fn bootstrap_organization_location(
        &self,
        organization_id: u64,
        point: GeoPoint,
    ) -> Result<bool> {
        let updated = self.store.set_organization_location_if_unset(
            organization_id,
            point,
            LocationSource::FirstCheckin,
        )?;
        if updated {
            info!(
                "Organization {} location set from first check-in at {}",
                organization_id, point
            );
        }
        Ok(updated)
    }

    /// Best-effort reverse geocoding bounded by the configured timeout
    pub async fn resolve_address(&self, point: GeoPoint) -> String {
        let lookup = self.geocoder.reverse(point);
        match tokio::time::timeout(self.settings.geocode_timeout, lookup).await {
            Ok(Ok(Some(address))) => address,
            Ok(Ok(None)) => {
                debug!("No address found for {}", point);
                UNKNOWN_ADDRESS.to_string()
            }
            Ok(Err(e)) => {
                warn!("Reverse geocoding failed for {}: {}", point, e);
                UNKNOWN_ADDRESS.to_string()
            }
            Err(_) => {
                warn!(
                    "Reverse geocoding timed out after {:?} for {}",
                    self.settings.geocode_timeout, point
                );
                UNKNOWN_ADDRESS.to_string()
            }
        }
    }

    /// Geocode the organization's address and save the result.
    ///
    /// An organization that already has a location is refused with
    /// `Conflict` unless `force` is set.
    pub async fn geocode_organization(
        &self,
        organization_id: u64,
        force: bool,
    ) -> Result<GeocodeOutcome> {
        let mut organization = self.store.require_organization(organization_id)?;
        if organization.has_location() && !force {
            return Err(Error::Conflict(format!(
                "organization {} already has a {} location",
                organization_id, organization.location_source
            )));
        }

        let geocoded = geocode_from_address(self.geocoder.as_ref(), &mut organization).await;
        if geocoded {
            self.store.save_organization(&organization)?;
        }

        Ok(GeocodeOutcome {
            geocoded,
            organization,
        })
    }
}
