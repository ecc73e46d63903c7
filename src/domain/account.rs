use crate::domain::IdKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Studio role. Stored as an explicit column and carried in token claims —
/// never inferred from the shape of an account ID.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Client,
    Instructor,
    Manager,
}

/// What a role is allowed to do. Handlers check exactly one capability per
/// protected route via [`Role::allows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageAccounts,
    ManageClasses,
    ManagePasses,
    ViewReports,
    TakeAttendance,
    BookClasses,
}

impl Role {
    pub fn allows(self, capability: Capability) -> bool {
        match self {
            Role::Manager => true,
            Role::Instructor => matches!(
                capability,
                Capability::TakeAttendance | Capability::BookClasses
            ),
            Role::Client => matches!(capability, Capability::BookClasses),
        }
    }

    /// ID family used when an account of this role is first registered.
    /// Promotion never re-issues an ID, so the prefix reflects the role at
    /// registration time only.
    pub fn id_kind(self) -> IdKind {
        match self {
            Role::Client => IdKind::Client,
            Role::Instructor => IdKind::Instructor,
            Role::Manager => IdKind::Manager,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContactMethod {
    Phone,
    Email,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub account_id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub preferred_contact: ContactMethod,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: String,
        firstname: String,
        lastname: String,
        email: String,
        phone: String,
        address: String,
        preferred_contact: ContactMethod,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            firstname,
            lastname,
            email,
            phone,
            address,
            preferred_contact,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Login secret, one-to-one with an account. Kept out of `Account` so it can
/// never leak through an account response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credential {
    pub account_id: String,
    pub password_hash: String,
    pub last_changed: DateTime<Utc>,
    pub is_active: bool,
}

impl Credential {
    pub fn new(account_id: String, password_hash: String) -> Self {
        Self {
            account_id,
            password_hash,
            last_changed: Utc::now(),
            is_active: true,
        }
    }
}

/// Instructor extension of an account, keyed by the account ID. Created on
/// promotion; deleting it reverts the account to `Role::Client`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructorProfile {
    pub account_id: String,
    pub specialties: Vec<String>,
    pub hire_date: DateTime<Utc>,
    pub is_active: bool,
}

impl InstructorProfile {
    pub fn new(account_id: String, specialties: Vec<String>) -> Self {
        Self {
            account_id,
            specialties,
            hire_date: Utc::now(),
            is_active: true,
        }
    }
}

/// Manager extension of an account, same lifecycle as [`InstructorProfile`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagerProfile {
    pub account_id: String,
    pub department: String,
    pub is_active: bool,
}

impl ManagerProfile {
    pub fn new(account_id: String, department: String) -> Self {
        Self {
            account_id,
            department,
            is_active: true,
        }
    }
}

pub const DEFAULT_DEPARTMENT: &str = "Operations";
