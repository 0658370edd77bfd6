use crate::models::pricing::CreditProfile;
use crate::models::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Academic department. Referenced by accounts, never owned by them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: u32,
    pub name: String,
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Account {
    pub id: u32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Whether the account may log in
    pub active: bool,
    pub department: Option<Department>,
    /// Set once by staff; never cleared
    pub verified: bool,
    pub joined_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    /// Jobs that may be pending, approved or printing at once
    pub max_concurrent_jobs: u32,
    pub credit: CreditProfile,
}

impl Account {
    /// A newly registered account: active, unverified, no department.
    pub fn new(id: u32, username: impl Into<String>, role: Role, joined_at: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.into(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role,
            active: true,
            department: None,
            verified: false,
            joined_at,
            last_login: None,
            max_concurrent_jobs: 1,
            credit: CreditProfile::default(),
        }
    }

    pub fn department_id(&self) -> Option<u32> {
        self.department.as_ref().map(|d| d.id)
    }

    /// "First Last", falling back to the username when both are blank.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    /// Verified and active accounts may submit jobs.
    pub fn can_print(&self) -> bool {
        self.verified && self.active
    }
}
