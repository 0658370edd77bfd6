use crate::filter::{contains_term, normalize_search, parse_optional};
use crate::models::account::Account;
use crate::models::role::Role;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Raw account filter as it arrives in a query string
/// (`search=ana&role=STU&active=true`). Empty values mean "unset".
#[derive(Debug, Default, Deserialize)]
pub struct AccountQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub active: String,
    #[serde(default)]
    pub verified: String,
}

/// Validated account filter. Every `None` field imposes no constraint;
/// present fields combine with logical AND.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AccountFilter {
    /// Lowercased, trimmed search term
    pub search: Option<String>,
    pub role: Option<Role>,
    pub department_id: Option<u32>,
    pub active: Option<bool>,
    pub verified: Option<bool>,
}

impl AccountQuery {
    pub fn from_query(query: &str) -> Result<Self> {
        serde_urlencoded::from_str(query).context("Failed to decode account filter query")
    }

    pub fn validate(self) -> Result<AccountFilter> {
        Ok(AccountFilter {
            search: normalize_search(&self.search),
            role: parse_optional(&self.role).context("Invalid role filter")?,
            department_id: parse_optional(&self.department).context("Invalid department filter")?,
            active: parse_optional(&self.active).context("Invalid active filter")?,
            verified: parse_optional(&self.verified).context("Invalid verified filter")?,
        })
    }
}

impl AccountFilter {
    pub fn from_query(query: &str) -> Result<Self> {
        AccountQuery::from_query(query)?.validate()
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = normalize_search(search);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, account: &Account) -> bool {
        if let Some(term) = &self.search {
            let hit = contains_term(&account.first_name, term)
                || contains_term(&account.last_name, term)
                || contains_term(&account.username, term)
                || contains_term(&account.email, term)
                || contains_term(&account.full_name(), term);
            if !hit {
                return false;
            }
        }
        if let Some(role) = self.role {
            if account.role != role {
                return false;
            }
        }
        if let Some(department_id) = self.department_id {
            if account.department_id() != Some(department_id) {
                return false;
            }
        }
        if let Some(active) = self.active {
            if account.active != active {
                return false;
            }
        }
        if let Some(verified) = self.verified {
            if account.verified != verified {
                return false;
            }
        }
        true
    }
}

/// Order-preserving filter over an account collection.
pub fn filter_accounts<'a>(accounts: &'a [Account], filter: &AccountFilter) -> Vec<&'a Account> {
    accounts.iter().filter(|account| filter.matches(account)).collect()
}
