//! Embedded attendance store.
//!
//! Organizations, interns and location logs live in sled trees as JSON
//! values keyed by big-endian ids. Location logs are append-only: there is
//! no update or delete path, and inserts refuse to overwrite a key. Two
//! index trees (`logs_by_intern`, `logs_by_org`) keep `(owner, time, id)`
//! keys so history queries are range scans.

mod keys;
mod query;

pub use query::LogQuery;

use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{
    GeoPoint, Intern, LocationLog, LocationSource, NewIntern, NewLocationLog, NewOrganization,
    Organization,
};
use keys::{id_key, index_key, index_range, key_id};

#[derive(Clone)]
pub struct Store {
    db: Db,
    organizations: Tree,
    interns: Tree,
    logs: Tree,
    logs_by_intern: Tree,
    logs_by_org: Tree,
}

impl Store {
    /// Open (or create) the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening attendance store at {}", path.display());
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// In-memory store that disappears on drop
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        Ok(Self {
            organizations: db.open_tree("organizations")?,
            interns: db.open_tree("interns")?,
            logs: db.open_tree("location_logs")?,
            logs_by_intern: db.open_tree("logs_by_intern")?,
            logs_by_org: db.open_tree("logs_by_org")?,
            db,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    // --- organizations ---

    pub fn insert_organization(
        &self,
        new: NewOrganization,
        default_radius_m: f64,
    ) -> Result<Organization> {
        let id = self.db.generate_id()?;
        let org = Organization::from_new(id, new, default_radius_m)?;
        self.organizations
            .insert(id_key(id), serde_json::to_vec(&org)?)?;
        debug!("Created organization {} ({})", org.id, org.name);
        Ok(org)
    }

    pub fn get_organization(&self, id: u64) -> Result<Option<Organization>> {
        match self.organizations.get(id_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn require_organization(&self, id: u64) -> Result<Organization> {
        self.get_organization(id)?
            .ok_or_else(|| Error::NotFound(format!("organization {}", id)))
    }

    pub fn list_organizations(&self) -> Result<Vec<Organization>> {
        let mut organizations = Vec::new();
        for value in self.organizations.iter().values() {
            organizations.push(serde_json::from_slice(&value?)?);
        }
        Ok(organizations)
    }

    /// Persist edits to an existing organization (last write wins)
    pub fn save_organization(&self, org: &Organization) -> Result<()> {
        org.validate()?;
        if !self.organizations.contains_key(id_key(org.id))? {
            return Err(Error::NotFound(format!("organization {}", org.id)));
        }
        self.organizations
            .insert(id_key(org.id), serde_json::to_vec(org)?)?;
        Ok(())
    }

    /// Set the organization's location only if it has none.
    ///
    /// Returns whether the location was written. Concurrent callers race
    /// through compare-and-swap, so at most one of them wins.
    pub fn set_organization_location_if_unset(
        &self,
        id: u64,
        point: GeoPoint,
        source: LocationSource,
    ) -> Result<bool> {
        let key = id_key(id);
        loop {
            let current = self
                .organizations
                .get(key)?
                .ok_or_else(|| Error::NotFound(format!("organization {}", id)))?;

            let mut org: Organization = serde_json::from_slice(&current)?;
            if org.location.is_some() {
                return Ok(false);
            }
            org.set_location(point, source)?;

            let swapped = self.organizations.compare_and_swap(
                key,
                Some(&current),
                Some(serde_json::to_vec(&org)?),
            )?;
            match swapped {
                Ok(()) => return Ok(true),
                // Someone else edited the record; re-read and decide again
                Err(_) => continue,
            }
        }
    }

    // --- interns ---

    pub fn insert_intern(&self, new: NewIntern) -> Result<Intern> {
        if !self.organizations.contains_key(id_key(new.organization_id))? {
            return Err(Error::Validation(format!(
                "organization {} does not exist",
                new.organization_id
            )));
        }

        let id = self.db.generate_id()?;
        let intern = Intern::from_new(id, new)?;
        self.interns
            .insert(id_key(id), serde_json::to_vec(&intern)?)?;
        debug!(
            "Created intern {} in organization {}",
            intern.id, intern.organization_id
        );
        Ok(intern)
    }

    pub fn get_intern(&self, id: u64) -> Result<Option<Intern>> {
        match self.interns.get(id_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn require_intern(&self, id: u64) -> Result<Intern> {
        self.get_intern(id)?
            .ok_or_else(|| Error::NotFound(format!("intern {}", id)))
    }

    pub fn list_interns(&self, organization_id: Option<u64>) -> Result<Vec<Intern>> {
        let mut interns = Vec::new();
        for value in self.interns.iter().values() {
            let intern: Intern = serde_json::from_slice(&value?)?;
            if organization_id.map_or(true, |org| intern.organization_id == org) {
                interns.push(intern);
            }
        }
        Ok(interns)
    }

    // --- location logs ---

    /// Append a log row and its index entries atomically
    pub fn append_location_log(&self, new: NewLocationLog) -> Result<LocationLog> {
        let id = self.db.generate_id()?;
        let log = LocationLog::from_new(id, new);

        let value = serde_json::to_vec(&log)?;
        let log_key = id_key(id);
        let intern_key = index_key(log.intern_id, log.timestamp, id);
        let org_key = index_key(log.organization_id, log.timestamp, id);

        let result: std::result::Result<(), TransactionError<()>> =
            (&self.logs, &self.logs_by_intern, &self.logs_by_org).transaction(
                |(logs, by_intern, by_org)| {
                    if logs.get(&log_key[..])?.is_some() {
                        return Err(ConflictableTransactionError::Abort(()));
                    }
                    logs.insert(&log_key[..], value.as_slice())?;
                    by_intern.insert(intern_key.as_slice(), &log_key[..])?;
                    by_org.insert(org_key.as_slice(), &log_key[..])?;
                    Ok(())
                },
            );

        match result {
            Ok(()) => Ok(log),
            Err(TransactionError::Abort(())) => Err(Error::Conflict(format!(
                "location log {} already exists",
                id
            ))),
            Err(TransactionError::Storage(e)) => Err(Error::Storage(e)),
        }
    }

    pub fn get_location_log(&self, id: u64) -> Result<Option<LocationLog>> {
        match self.logs.get(id_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Logs matching `query`, newest first
    pub fn query_logs(&self, query: &LogQuery) -> Result<Vec<LocationLog>> {
        let limit = query.limit.unwrap_or(usize::MAX);
        let mut results = Vec::new();
        if limit == 0 {
            return Ok(results);
        }

        // Pick the narrowest index available
        let index = match (query.intern_id, query.organization_id) {
            (Some(intern), _) => Some((&self.logs_by_intern, intern)),
            (None, Some(org)) => Some((&self.logs_by_org, org)),
            (None, None) => None,
        };

        match index {
            Some((tree, owner)) => {
                let (start, end) = index_range(owner, query.since, query.until);
                for entry in tree.range(start..end).rev() {
                    let (key, _) = entry?;
                    let Some(log) = self.get_location_log(key_id(&key))? else {
                        continue;
                    };
                    if query.matches(&log) {
                        results.push(log);
                        if results.len() >= limit {
                            break;
                        }
                    }
                }
            }
            None => {
                // Id order is not time order, so the limit applies after sorting
                for value in self.logs.iter().values() {
                    let log: LocationLog = serde_json::from_slice(&value?)?;
                    if query.matches(&log) {
                        results.push(log);
                    }
                }
            }
        }

        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        results.truncate(limit);
        Ok(results)
    }

    pub fn count_logs(&self, query: &LogQuery) -> Result<usize> {
        let unlimited = LogQuery {
            limit: None,
            ..query.clone()
        };
        Ok(self.query_logs(&unlimited)?.len())
    }

    pub fn log_count(&self) -> usize {
        self.logs.len()
    }

    pub fn organization_count(&self) -> usize {
        self.organizations.len()
    }
}
