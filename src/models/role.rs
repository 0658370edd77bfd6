use crate::core::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role.
///
/// Declaration order is the natural enumeration order used to break ties
/// in breakdown listings. It says nothing about authority; see
/// [`crate::access::hierarchy`] for the (partial) authority ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Student,
    Teacher,
    Technician,
    Admin,
    External,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Student,
        Role::Teacher,
        Role::Technician,
        Role::Admin,
        Role::External,
    ];

    /// Canonical long name, e.g. `STUDENT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Teacher => "TEACHER",
            Role::Technician => "TECHNICIAN",
            Role::Admin => "ADMIN",
            Role::External => "EXTERNAL",
        }
    }

    /// Three-letter code used by the backend feed, e.g. `STU`.
    pub fn code(&self) -> &'static str {
        match self {
            Role::Student => "STU",
            Role::Teacher => "TEA",
            Role::Technician => "TEC",
            Role::Admin => "ADM",
            Role::External => "EXT",
        }
    }

    /// Position in [`Role::ALL`], used as a table index.
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    /// Accepts the long name or the backend code, case-insensitively.
    /// Anything else is rejected; there is no fallback role.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == upper || role.code() == upper)
            .ok_or_else(|| ParseError::UnknownRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, ParseError> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}
