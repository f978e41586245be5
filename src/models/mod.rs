//! Core data models for attendance tracking.

pub mod intern;
pub mod location_log;
pub mod organization;
pub mod point;

pub use intern::{Intern, NewIntern};
pub use location_log::{GeofenceStatus, LocationLog, NewLocationLog};
pub use organization::{LocationSource, NewOrganization, Organization};
pub use point::GeoPoint;
