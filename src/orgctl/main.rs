//! Organization administration CLI.
//!
//! Imports rosters, manages organization geofences and runs batch
//! geocoding against the configured Nominatim service.

mod roster;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fencepost::config::Config;
use fencepost::geocoding::{geocode_from_address, NominatimGeocoder};
use fencepost::geofence::{optimal_radius, DEFAULT_COVERAGE};
use fencepost::models::{GeoPoint, LocationSource, NewOrganization};
use fencepost::store::{LogQuery, Store};

use crate::roster::{import_interns, import_organizations};

#[derive(Parser, Debug)]
#[command(name = "orgctl")]
#[command(about = "Manage organizations, interns and geofences")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database directory (overrides config)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import organizations from CSV (name,address,latitude,longitude,radius_m)
    ImportOrgs {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Import interns from CSV (full_name,organization,department,phone_number)
    ImportInterns {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Create one organization
    AddOrg {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Geofence radius in meters
        #[arg(long)]
        radius: Option<f64>,
    },

    /// List organizations with their geofences
    ListOrgs,

    /// Geocode organization addresses into geofence centers
    Geocode {
        /// Only this organization (default: all with an address and no location)
        #[arg(long)]
        id: Option<u64>,

        /// Also re-geocode organizations that already have a location
        #[arg(long)]
        force: bool,
    },

    /// Set an unlocated organization's center from a known check-in point
    Bootstrap {
        #[arg(long)]
        id: u64,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Fit the radius to cover a share of historical check-ins
    TuneRadius {
        #[arg(long)]
        id: u64,

        /// Share of check-ins to cover, in (0, 1]
        #[arg(long, default_value_t = DEFAULT_COVERAGE)]
        coverage: f64,

        /// Print the result without saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Set an organization's radius
    SetRadius {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        meters: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load config")?;
    if let Some(path) = args.db_path {
        config.storage.path = path;
    }

    let store = Store::open(&config.storage.path).context("Failed to open attendance store")?;

    match args.command {
        Command::ImportOrgs { file } => {
            let (created, skipped) =
                import_organizations(&store, &file, config.geofence.default_radius_m)?;
            info!("Imported {} organizations ({} skipped)", created, skipped);
        }
        Command::ImportInterns { file } => {
            let (created, skipped) = import_interns(&store, &file)?;
            info!("Imported {} interns ({} skipped)", created, skipped);
        }
        Command::AddOrg {
            name,
            address,
            lat,
            lon,
            radius,
        } => {
            let location = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)?),
                _ => None,
            };
            let org = store.insert_organization(
                NewOrganization {
                    name,
                    address,
                    location,
                    geofence_radius_m: radius,
                },
                config.geofence.default_radius_m,
            )?;
            println!("{}", serde_json::to_string_pretty(&org)?);
        }
        Command::ListOrgs => {
            for org in store.list_organizations()? {
                let location = org
                    .location
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>20}  {:<30}  {:>22}  {:>8.1} m  {}",
                    org.id, org.name, location, org.geofence_radius_m, org.location_source
                );
            }
        }
        Command::Geocode { id, force } => {
            run_geocode(&store, &config, id, force).await?;
        }
        Command::Bootstrap { id, lat, lon } => {
            let point = GeoPoint::new(lat, lon)?;
            let updated =
                store.set_organization_location_if_unset(id, point, LocationSource::FirstCheckin)?;
            if updated {
                info!("Organization {} located at {},{}", id, lat, lon);
            } else {
                warn!("Organization {} already has a location; left unchanged", id);
            }
        }
        Command::TuneRadius {
            id,
            coverage,
            dry_run,
        } => {
            let mut org = store.require_organization(id)?;
            let center = org
                .location
                .with_context(|| format!("Organization {} has no location", id))?;

            let points: Vec<GeoPoint> = store
                .query_logs(&LogQuery::for_organization(id))?
                .into_iter()
                .map(|log| log.point)
                .collect();

            let Some(radius) = optimal_radius(center, &points, coverage) else {
                anyhow::bail!(
                    "Cannot tune organization {}: {} check-ins, coverage {}",
                    id,
                    points.len(),
                    coverage
                );
            };

            info!(
                "Radius covering {:.0}% of {} check-ins: {:.1} m (was {:.1} m)",
                coverage * 100.0,
                points.len(),
                radius,
                org.geofence_radius_m
            );

            if !dry_run {
                org.set_radius(radius)?;
                store.save_organization(&org)?;
                info!("Updated radius for {}", org.name);
            }
        }
        Command::SetRadius { id, meters } => {
            let mut org = store.require_organization(id)?;
            org.set_radius(meters)?;
            store.save_organization(&org)?;
            info!("Radius for {} set to {:.1} m", org.name, meters);
        }
    }

    store.flush()?;
    Ok(())
}

/// Sequential batch geocoding, pausing between requests
async fn run_geocode(store: &Store, config: &Config, id: Option<u64>, force: bool) -> Result<()> {
    let geocoder = NominatimGeocoder::new(&config.geocoder)?;

    let candidates: Vec<_> = match id {
        Some(id) => {
            let org = store.require_organization(id)?;
            if org.has_location() && !force {
                warn!(
                    "Organization {} already has a {} location; pass --force to replace it",
                    id, org.location_source
                );
                return Ok(());
            }
            vec![org]
        }
        None => store
            .list_organizations()?
            .into_iter()
            .filter(|o| o.address.is_some() && (force || !o.has_location()))
            .collect(),
    };

    if candidates.is_empty() {
        info!("Nothing to geocode");
        return Ok(());
    }

    info!("Geocoding {} organizations...", candidates.len());

    let pb = ProgressBar::new(candidates.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut succeeded = 0;
    let mut failed = 0;

    for (i, mut org) in candidates.into_iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(config.geocoder.batch_delay()).await;
        }
        pb.set_message(org.name.clone());

        if geocode_from_address(&geocoder, &mut org).await {
            store.save_organization(&org)?;
            succeeded += 1;
        } else {
            pb.println(format!("Failed to geocode {}", org.name));
            failed += 1;
        }
        pb.inc(1);
    }

    pb.finish_with_message("done");
    info!("Geocoded {} organizations, {} failed", succeeded, failed);
    Ok(())
}
