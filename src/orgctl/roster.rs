//! CSV roster import for organizations and interns.

use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{info, warn};

use fencepost::models::{GeoPoint, NewIntern, NewOrganization, Organization};
use fencepost::store::Store;

// name,address,latitude,longitude,radius_m
// Harbor Clinic,12 Dock St,40.7011,-74.0132,150
// Valley Farm,,,,
#[derive(Debug, Deserialize)]
struct OrganizationRow {
    name: String,
    address: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_m: Option<f64>,
}

// full_name,organization,department,phone_number
// Ada Obi,Harbor Clinic,Triage,555-0100
#[derive(Debug, Deserialize)]
struct InternRow {
    full_name: String,
    /// Organization id or name
    organization: String,
    department: Option<String>,
    phone_number: Option<String>,
}

/// Import counts: (created, skipped)
pub type ImportStats = (usize, usize);

pub fn import_organizations(
    store: &Store,
    path: &Path,
    default_radius_m: f64,
) -> Result<ImportStats> {
    info!("Importing organizations from {}", path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("Failed to open organizations file")?;

    let mut created = 0;
    let mut skipped = 0;

    for (line, row) in reader.deserialize::<OrganizationRow>().enumerate() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping organization row {}: {}", line + 2, e);
                skipped += 1;
                continue;
            }
        };

        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
            (None, None) => None,
            _ => {
                warn!(
                    "Skipping organization '{}': latitude and longitude must be given together",
                    row.name
                );
                skipped += 1;
                continue;
            }
        };

        let new = NewOrganization {
            name: row.name,
            address: row.address,
            location,
            geofence_radius_m: row.radius_m,
        };

        match store.insert_organization(new, default_radius_m) {
            Ok(org) => {
                info!("Created organization {} ({})", org.id, org.name);
                created += 1;
            }
            Err(e) => {
                warn!("Skipping organization row {}: {}", line + 2, e);
                skipped += 1;
            }
        }
    }

    Ok((created, skipped))
}

pub fn import_interns(store: &Store, path: &Path) -> Result<ImportStats> {
    info!("Importing interns from {}", path.display());

    let organizations = store.list_organizations()?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("Failed to open interns file")?;

    let mut created = 0;
    let mut skipped = 0;

    for (line, row) in reader.deserialize::<InternRow>().enumerate() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping intern row {}: {}", line + 2, e);
                skipped += 1;
                continue;
            }
        };

        let Some(org) = resolve_organization(&organizations, &row.organization) else {
            warn!(
                "Skipping intern '{}': unknown organization '{}'",
                row.full_name, row.organization
            );
            skipped += 1;
            continue;
        };

        let new = NewIntern {
            full_name: row.full_name,
            organization_id: org.id,
            department: row.department,
            phone_number: row.phone_number,
        };

        match store.insert_intern(new) {
            Ok(_) => created += 1,
            Err(e) => {
                warn!("Skipping intern row {}: {}", line + 2, e);
                skipped += 1;
            }
        }
    }

    Ok((created, skipped))
}

/// Match by numeric id first, then case-insensitive name
fn resolve_organization<'a>(organizations: &'a [Organization], key: &str) -> Option<&'a Organization> {
    if let Ok(id) = key.parse::<u64>() {
        if let Some(org) = organizations.iter().find(|o| o.id == id) {
            return Some(org);
        }
    }
    organizations
        .iter()
        .find(|o| o.name.eq_ignore_ascii_case(key))
}
