//! Intern profile linked to one organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct NewIntern {
    pub full_name: String,
    pub organization_id: u64,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// The organization link is fixed at creation; the store offers no way to change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intern {
    pub id: u64,
    pub full_name: String,
    pub organization_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Intern {
    pub fn from_new(id: u64, new: NewIntern) -> Result<Self> {
        let full_name = new.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(Error::Validation("intern name must not be empty".to_string()));
        }

        Ok(Self {
            id,
            full_name,
            organization_id: new.organization_id,
            department: non_blank(new.department),
            phone_number: non_blank(new.phone_number),
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
