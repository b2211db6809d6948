//! Who the current principal is, in portal terms.

pub mod accounts;
pub mod context;
pub mod resolver;

pub use accounts::{display_name, register_admin, register_applicant};
pub use context::{ProfileState, SessionContext};
pub use resolver::ProfileResolver;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::models::{Admin, Applicant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Applicant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Applicant => "applicant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<Uuid>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Admin> for Profile {
    fn from(admin: Admin) -> Self {
        Self { id: admin.id, role: Role::Admin, full_name: admin.full_name, admin_id: None }
    }
}

impl From<Applicant> for Profile {
    fn from(applicant: Applicant) -> Self {
        Self {
            id: applicant.id,
            role: Role::Applicant,
            full_name: applicant.full_name,
            admin_id: applicant.admin_id,
        }
    }
}
