//! HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use fencepost::checkin::{LocationIngest, LocationPayload};
use fencepost::history::{self, InternSummary, OrganizationSummary, TimeWindow};
use fencepost::models::{GeoPoint, GeofenceStatus, LocationLog, LocationSource};
use fencepost::{Error, Result};

/// Application state shared across handlers
pub struct AppState {
    pub ingest: LocationIngest,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/v1/interns/{id}/locations",
            post(record_location_handler).get(history_handler),
        )
        .route("/v1/interns/{id}/violations", get(intern_violations_handler))
        .route("/v1/interns/{id}/summary", get(intern_summary_handler))
        .route(
            "/v1/organizations/{id}/violations",
            get(organization_violations_handler),
        )
        .route(
            "/v1/organizations/{id}/summary",
            get(organization_summary_handler),
        )
        .route("/v1/organizations/{id}/geocode", post(geocode_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    organizations: usize,
    location_logs: usize,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = state.ingest.store();
    Json(HealthResponse {
        status: "ok",
        organizations: store.organization_count(),
        location_logs: store.log_count(),
    })
}

#[derive(Serialize)]
struct CheckinResponse {
    status: &'static str,
    /// `null` when the organization has no geofence yet
    is_inside: Option<bool>,
    geofence: GeofenceStatus,
    address: String,
    organization_bootstrapped: bool,
    log_id: u64,
}

/// Record a check-in
async fn record_location_handler(
    State(state): State<Arc<AppState>>,
    Path(intern_id): Path<u64>,
    payload: std::result::Result<Json<LocationPayload>, JsonRejection>,
) -> Result<Json<CheckinResponse>> {
    let Json(payload) = payload.map_err(|e| Error::Validation(e.body_text()))?;

    let outcome = state.ingest.record_location(intern_id, &payload).await?;

    Ok(Json(CheckinResponse {
        status: "success",
        is_inside: outcome.log.geofence.as_bool(),
        geofence: outcome.log.geofence,
        address: outcome.log.address,
        organization_bootstrapped: outcome.organization_bootstrapped,
        log_id: outcome.log.id,
    }))
}

#[derive(Deserialize)]
struct HistoryParams {
    /// "today", "week" or "month"
    time: Option<String>,
}

/// Log entry with the address cut down for listings
#[derive(Serialize)]
struct LocationEntry {
    #[serde(flatten)]
    log: LocationLog,
    address_short: String,
}

impl From<LocationLog> for LocationEntry {
    fn from(log: LocationLog) -> Self {
        Self {
            address_short: log.address_short(),
            log,
        }
    }
}

#[derive(Serialize)]
struct HistoryResponse {
    time: TimeWindow,
    violations: usize,
    locations: Vec<LocationEntry>,
}

async fn history_handler(
    State(state): State<Arc<AppState>>,
    Path(intern_id): Path<u64>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>> {
    let window = TimeWindow::from_param(params.time.as_deref());
    let now = Utc::now();
    let store = state.ingest.store();
    let logs = history::intern_history(store, intern_id, window, now)?;
    let violations = history::intern_window_violations(store, intern_id, window, now)?;

    Ok(Json(HistoryResponse {
        time: window,
        violations,
        locations: logs.into_iter().map(LocationEntry::from).collect(),
    }))
}

#[derive(Serialize)]
struct ViolationsResponse {
    count: usize,
    violations: Vec<LocationEntry>,
}

impl From<Vec<LocationLog>> for ViolationsResponse {
    fn from(logs: Vec<LocationLog>) -> Self {
        Self {
            count: logs.len(),
            violations: logs.into_iter().map(LocationEntry::from).collect(),
        }
    }
}

async fn intern_violations_handler(
    State(state): State<Arc<AppState>>,
    Path(intern_id): Path<u64>,
) -> Result<Json<ViolationsResponse>> {
    let logs = history::intern_violations(state.ingest.store(), intern_id)?;
    Ok(Json(logs.into()))
}

async fn organization_violations_handler(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<u64>,
) -> Result<Json<ViolationsResponse>> {
    let logs = history::organization_violations(state.ingest.store(), organization_id)?;
    Ok(Json(logs.into()))
}

async fn intern_summary_handler(
    State(state): State<Arc<AppState>>,
    Path(intern_id): Path<u64>,
) -> Result<Json<InternSummary>> {
    let summary = history::intern_summary(state.ingest.store(), intern_id, Utc::now())?;
    Ok(Json(summary))
}

async fn organization_summary_handler(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<u64>,
) -> Result<Json<OrganizationSummary>> {
    let summary =
        history::organization_summary(state.ingest.store(), organization_id, Utc::now())?;
    Ok(Json(summary))
}

#[derive(Serialize)]
struct GeocodeResponse {
    geocoded: bool,
    location: Option<GeoPoint>,
    location_source: LocationSource,
}

#[derive(Deserialize)]
struct GeocodeParams {
    /// Replace a location that is already set
    #[serde(default)]
    force: bool,
}

/// Geocode an organization's address into its geofence center
async fn geocode_handler(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<u64>,
    Query(params): Query<GeocodeParams>,
) -> Result<Json<GeocodeResponse>> {
    let outcome = state
        .ingest
        .geocode_organization(organization_id, params.force)
        .await?;
    Ok(Json(GeocodeResponse {
        geocoded: outcome.geocoded,
        location: outcome.organization.location,
        location_source: outcome.organization.location_source,
    }))
}
