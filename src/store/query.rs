//! Location log filters.

use chrono::{DateTime, Utc};

use crate::models::{GeofenceStatus, LocationLog};

/// Filter for location log queries. Time bounds are `[since, until)`.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub intern_id: Option<u64>,
    pub organization_id: Option<u64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<GeofenceStatus>,
    pub limit: Option<usize>,
}

impl LogQuery {
    pub fn for_intern(intern_id: u64) -> Self {
        Self {
            intern_id: Some(intern_id),
            ..Default::default()
        }
    }

    pub fn for_organization(organization_id: u64) -> Self {
        Self {
            organization_id: Some(organization_id),
            ..Default::default()
        }
    }

    pub fn since(mut self, ts: DateTime<Utc>) -> Self {
        self.since = Some(ts);
        self
    }

    pub fn until(mut self, ts: DateTime<Utc>) -> Self {
        self.until = Some(ts);
        self
    }

    pub fn status(mut self, status: GeofenceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, log: &LocationLog) -> bool {
        self.intern_id.map_or(true, |id| log.intern_id == id)
            && self
                .organization_id
                .map_or(true, |id| log.organization_id == id)
            && self.since.map_or(true, |ts| log.timestamp >= ts)
            && self.until.map_or(true, |ts| log.timestamp < ts)
            && self.status.map_or(true, |s| log.geofence == s)
    }
}
