use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::BorrowerId;

/// Account role. Roles only matter to the presentation layer; the loan
/// policy treats every borrower the same.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowerRole {
    #[default]
    Member,
    Librarian,
    Admin,
}

impl fmt::Display for BorrowerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Member => "member",
            Self::Librarian => "librarian",
            Self::Admin => "admin",
        };
        f.write_str(name)
    }
}

impl FromStr for BorrowerRole {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" | "student" | "lecturer" => Ok(Self::Member),
            "librarian" => Ok(Self::Librarian),
            "admin" => Ok(Self::Admin),
            other => Err(TypeError::UnknownRole(other.to_string())),
        }
    }
}

/// A registered account that may take books out on loan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: BorrowerId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: BorrowerRole,
}

impl Borrower {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: BorrowerId::new(),
            name: name.into(),
            email: email.into(),
            role: BorrowerRole::Member,
        }
    }

    pub fn with_role(mut self, role: BorrowerRole) -> Self {
        self.role = role;
        self
    }
}
