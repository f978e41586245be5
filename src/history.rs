//! Attendance history, violations and summaries.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{GeofenceStatus, Intern, LocationLog, Organization};
use crate::store::{LogQuery, Store};

/// Most entries returned by a history listing
pub const HISTORY_LIMIT: usize = 50;

/// Check-ins shown in an intern summary
pub const RECENT_LIMIT: usize = 10;

/// Rolling window for history listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    /// Last 24 hours
    #[default]
    Today,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
}

impl TimeWindow {
    /// Parse a `time` query value; anything unrecognised means `Today`
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("week") => TimeWindow::Week,
            Some("month") => TimeWindow::Month,
            _ => TimeWindow::Today,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Today => Duration::days(1),
            TimeWindow::Week => Duration::days(7),
            TimeWindow::Month => Duration::days(30),
        }
    }

    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

/// Midnight UTC of the day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Clone, Serialize)]
pub struct InternSummary {
    pub intern: Intern,
    pub organization: Organization,
    pub recent: Vec<LocationLog>,
    pub violations_today: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationSummary {
    pub organization: Organization,
    pub total_interns: usize,
    pub active_interns: usize,
    pub checkins_today: usize,
    pub violations_today: usize,
}

/// Check-ins of one intern within `window`, newest first
pub fn intern_history(
    store: &Store,
    intern_id: u64,
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Result<Vec<LocationLog>> {
    store.require_intern(intern_id)?;
    let query = LogQuery::for_intern(intern_id)
        .since(window.since(now))
        .limit(HISTORY_LIMIT);
    store.query_logs(&query)
}

/// Violations of one intern within `window`, counted without the listing limit
pub fn intern_window_violations(
    store: &Store,
    intern_id: u64,
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Result<usize> {
    let query = LogQuery::for_intern(intern_id)
        .since(window.since(now))
        .status(GeofenceStatus::Outside);
    store.count_logs(&query)
}

pub fn intern_violations(store: &Store, intern_id: u64) -> Result<Vec<LocationLog>> {
    store.require_intern(intern_id)?;
    store.query_logs(&LogQuery::for_intern(intern_id).status(GeofenceStatus::Outside))
}

pub fn organization_violations(store: &Store, organization_id: u64) -> Result<Vec<LocationLog>> {
    store.require_organization(organization_id)?;
    store.query_logs(&LogQuery::for_organization(organization_id).status(GeofenceStatus::Outside))
}

pub fn intern_summary(store: &Store, intern_id: u64, now: DateTime<Utc>) -> Result<InternSummary> {
    let intern = store.require_intern(intern_id)?;
    let organization = store.require_organization(intern.organization_id)?;
    let today = LogQuery::for_intern(intern_id).since(start_of_day(now));

    let recent = store.query_logs(&today.clone().limit(RECENT_LIMIT))?;
    let violations_today = store.count_logs(&today.status(GeofenceStatus::Outside))?;

    Ok(InternSummary {
        intern,
        organization,
        recent,
        violations_today,
    })
}

pub fn organization_summary(
    store: &Store,
    organization_id: u64,
    now: DateTime<Utc>,
) -> Result<OrganizationSummary> {
    let organization = store.require_organization(organization_id)?;
    let interns = store.list_interns(Some(organization_id))?;
    let today = LogQuery::for_organization(organization_id).since(start_of_day(now));

    Ok(OrganizationSummary {
        total_interns: interns.len(),
        active_interns: interns.iter().filter(|i| i.is_active).count(),
        checkins_today: store.count_logs(&today)?,
        violations_today: store.count_logs(&today.status(GeofenceStatus::Outside))?,
        organization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{GeoPoint, NewIntern, NewLocationLog, NewOrganization};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 15, 15, 0, 0).unwrap()
    }

    fn seeded() -> (Store, u64, u64) {
        let store = Store::temporary().unwrap();
        let org = store
            .insert_organization(
                NewOrganization {
                    name: "Northside Library".to_string(),
                    location: Some(GeoPoint { lat: 1.0, lon: 1.0 }),
                    ..Default::default()
                },
                100.0,
            )
            .unwrap();
        let intern = store
            .insert_intern(NewIntern {
                full_name: "Jo Park".to_string(),
                organization_id: org.id,
                department: None,
                phone_number: None,
            })
            .unwrap();

        let entries = [
            (Duration::hours(2), GeofenceStatus::Inside),
            (Duration::hours(5), GeofenceStatus::Outside),
            (Duration::hours(20), GeofenceStatus::Outside),
            (Duration::days(3), GeofenceStatus::Inside),
            (Duration::days(20), GeofenceStatus::Outside),
            (Duration::days(45), GeofenceStatus::Inside),
        ];
        for (ago, status) in entries {
            store
                .append_location_log(NewLocationLog {
                    intern_id: intern.id,
                    organization_id: org.id,
                    point: GeoPoint { lat: 1.0, lon: 1.0 },
                    timestamp: now() - ago,
                    address: "Main Hall".to_string(),
                    accuracy: None,
                    geofence: status,
                    distance_m: Some(1.0),
                })
                .unwrap();
        }

        (store, org.id, intern.id)
    }

    #[test]
    fn test_time_window_param() {
        assert_eq!(TimeWindow::from_param(Some("week")), TimeWindow::Week);
        assert_eq!(TimeWindow::from_param(Some("MONTH")), TimeWindow::Month);
        assert_eq!(TimeWindow::from_param(Some("today")), TimeWindow::Today);
        assert_eq!(TimeWindow::from_param(Some("fortnight")), TimeWindow::Today);
        assert_eq!(TimeWindow::from_param(None), TimeWindow::Today);
    }

    #[test]
    fn test_start_of_day() {
        assert_eq!(
            start_of_day(now()),
            Utc.with_ymd_and_hms(2026, 4, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_history_windows() {
        let (store, _, intern) = seeded();
        let count = |w| intern_history(&store, intern, w, now()).unwrap().len();
        assert_eq!(count(TimeWindow::Today), 3);
        assert_eq!(count(TimeWindow::Week), 4);
        assert_eq!(count(TimeWindow::Month), 5);
    }

    #[test]
    fn test_window_violations() {
        let (store, _, intern) = seeded();
        let count = |w| intern_window_violations(&store, intern, w, now()).unwrap();
        assert_eq!(count(TimeWindow::Today), 2);
        assert_eq!(count(TimeWindow::Week), 2);
        assert_eq!(count(TimeWindow::Month), 3);
    }

    #[test]
    fn test_violations() {
        let (store, org, intern) = seeded();
        assert_eq!(intern_violations(&store, intern).unwrap().len(), 3);
        assert_eq!(organization_violations(&store, org).unwrap().len(), 3);
        assert!(matches!(
            intern_violations(&store, intern + 1000),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_intern_summary_counts_calendar_day() {
        let (store, _, intern) = seeded();
        let summary = intern_summary(&store, intern, now()).unwrap();
        // 13:00 and 10:00 today; 19:00 yesterday falls outside the calendar day
        assert_eq!(summary.recent.len(), 2);
        assert_eq!(summary.violations_today, 1);
        assert_eq!(summary.intern.id, intern);
    }

    #[test]
    fn test_organization_summary() {
        let (store, org, _) = seeded();
        let summary = organization_summary(&store, org, now()).unwrap();
        assert_eq!(summary.total_interns, 1);
        assert_eq!(summary.active_interns, 1);
        assert_eq!(summary.checkins_today, 2);
        assert_eq!(summary.violations_today, 1);
    }
}
