use crate::domain::{
    Account, Attendee, ClassOffering, InstructorProfile, ManagerProfile, OwnedPass,
    PassDefinition, Registration, Slot,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Serialize, ToSchema)]
pub(super) struct HealthResponse {
    pub(super) status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct MessageResponse {
    pub(super) message: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub(super) struct RegisterRequest {
    pub(super) firstname: String,
    pub(super) lastname: String,
    #[validate(email)]
    #[schema(example = "ada@example.com")]
    pub(super) email: String,
    pub(super) phone: String,
    pub(super) address: String,
    #[schema(example = "email")]
    pub(super) preferred_contact: String,
    #[schema(example = "client")]
    pub(super) role: String,
    #[validate(length(min = 6))]
    pub(super) password: String,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct LoginRequest {
    pub(super) email: String,
    pub(super) password: String,
}

#[derive(Serialize, ToSchema)]
pub(super) struct LoginResponse {
    pub(super) token: String,
    pub(super) account: AccountResponse,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct ChangePasswordRequest {
    pub(super) current_password: String,
    pub(super) new_password: String,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct UpdateAccountRequest {
    pub(super) firstname: Option<String>,
    pub(super) lastname: Option<String>,
    pub(super) email: Option<String>,
    pub(super) phone: Option<String>,
    pub(super) address: Option<String>,
    pub(super) preferred_contact: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct PromoteInstructorRequest {
    #[serde(default)]
    pub(super) specialties: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct PromoteManagerRequest {
    pub(super) department: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct AccountResponse {
    pub(super) account_id: String,
    pub(super) firstname: String,
    pub(super) lastname: String,
    pub(super) email: String,
    pub(super) phone: String,
    pub(super) address: String,
    pub(super) preferred_contact: String,
    pub(super) role: String,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.account_id,
            firstname: account.firstname,
            lastname: account.lastname,
            email: account.email,
            phone: account.phone,
            address: account.address,
            preferred_contact: account.preferred_contact.to_string(),
            role: account.role.to_string(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct NextIdResponse {
    pub(super) role: String,
    pub(super) next_id: String,
}

#[derive(Serialize, ToSchema)]
pub(super) struct InstructorProfileResponse {
    pub(super) account_id: String,
    pub(super) specialties: Vec<String>,
    pub(super) hire_date: DateTime<Utc>,
    pub(super) is_active: bool,
}

impl From<InstructorProfile> for InstructorProfileResponse {
    fn from(profile: InstructorProfile) -> Self {
        Self {
            account_id: profile.account_id,
            specialties: profile.specialties,
            hire_date: profile.hire_date,
            is_active: profile.is_active,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct ManagerProfileResponse {
    pub(super) account_id: String,
    pub(super) department: String,
    pub(super) is_active: bool,
}

impl From<ManagerProfile> for ManagerProfileResponse {
    fn from(profile: ManagerProfile) -> Self {
        Self {
            account_id: profile.account_id,
            department: profile.department,
            is_active: profile.is_active,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub(super) struct SlotRequest {
    #[schema(example = "monday")]
    pub(super) day: String,
    #[schema(example = "09:00")]
    pub(super) time: String,
    pub(super) duration_minutes: i32,
}

#[derive(Serialize, ToSchema)]
pub(super) struct SlotResponse {
    pub(super) day: String,
    pub(super) time: String,
    pub(super) duration_minutes: i32,
}

impl From<&Slot> for SlotResponse {
    fn from(slot: &Slot) -> Self {
        Self {
            day: slot.day.to_string(),
            time: slot.time.clone(),
            duration_minutes: slot.duration_minutes,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub(super) struct CreateClassRequest {
    pub(super) name: String,
    #[schema(example = "vinyasa")]
    pub(super) class_type: String,
    pub(super) description: Option<String>,
    pub(super) instructor_id: String,
    pub(super) slots: Vec<SlotRequest>,
    pub(super) capacity: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct UpdateClassRequest {
    pub(super) name: Option<String>,
    pub(super) class_type: Option<String>,
    pub(super) description: Option<String>,
    pub(super) slots: Option<Vec<SlotRequest>>,
    pub(super) capacity: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct RegistrationResponse {
    pub(super) account_id: String,
    pub(super) owned_pass_id: String,
    pub(super) registered_at: DateTime<Utc>,
}

impl From<&Registration> for RegistrationResponse {
    fn from(registration: &Registration) -> Self {
        Self {
            account_id: registration.account_id.clone(),
            owned_pass_id: registration.owned_pass_id.clone(),
            registered_at: registration.registered_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct ClassResponse {
    pub(super) class_id: String,
    pub(super) name: String,
    pub(super) class_type: String,
    pub(super) description: Option<String>,
    pub(super) instructor_id: String,
    pub(super) slots: Vec<SlotResponse>,
    pub(super) capacity: i32,
    pub(super) registered: usize,
    pub(super) roster: Vec<RegistrationResponse>,
    pub(super) is_active: bool,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl From<ClassOffering> for ClassResponse {
    fn from(class: ClassOffering) -> Self {
        Self {
            class_id: class.class_id,
            name: class.name,
            class_type: class.class_type,
            description: class.description,
            instructor_id: class.instructor_id,
            slots: class.slots.iter().map(Into::into).collect(),
            capacity: class.capacity,
            registered: class.roster.len(),
            roster: class.roster.iter().map(Into::into).collect(),
            is_active: class.is_active,
            created_at: class.created_at,
            updated_at: class.updated_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub(super) struct RegisterForClassRequest {
    pub(super) owned_pass_id: String,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct AttendanceRequest {
    pub(super) date: NaiveDate,
    pub(super) attendees: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct AttendeeResponse {
    pub(super) account_id: String,
    pub(super) owned_pass_id: String,
    pub(super) checked_in_at: DateTime<Utc>,
}

impl From<&Attendee> for AttendeeResponse {
    fn from(attendee: &Attendee) -> Self {
        Self {
            account_id: attendee.account_id.clone(),
            owned_pass_id: attendee.owned_pass_id.clone(),
            checked_in_at: attendee.checked_in_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct AttendanceResponse {
    pub(super) accepted: usize,
    pub(super) submitted: usize,
    pub(super) class: ClassResponse,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct CreatePassRequest {
    pub(super) name: String,
    pub(super) description: Option<String>,
    pub(super) duration_value: u32,
    #[schema(example = "months")]
    pub(super) duration_unit: String,
    pub(super) sessions: i32,
    pub(super) price: f64,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct UpdatePassRequest {
    pub(super) name: Option<String>,
    pub(super) description: Option<String>,
    pub(super) duration_value: Option<u32>,
    pub(super) duration_unit: Option<String>,
    pub(super) sessions: Option<i32>,
    pub(super) price: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct PassDefinitionResponse {
    pub(super) pass_id: String,
    pub(super) name: String,
    pub(super) description: Option<String>,
    pub(super) duration_value: u32,
    pub(super) duration_unit: String,
    pub(super) sessions: i32,
    pub(super) price: f64,
    pub(super) is_active: bool,
    pub(super) created_at: DateTime<Utc>,
}

impl From<PassDefinition> for PassDefinitionResponse {
    fn from(definition: PassDefinition) -> Self {
        Self {
            pass_id: definition.pass_id,
            name: definition.name,
            description: definition.description,
            duration_value: definition.duration.value,
            duration_unit: definition.duration.unit.to_string(),
            sessions: definition.sessions,
            price: definition.price,
            is_active: definition.is_active,
            created_at: definition.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub(super) struct PurchaseRequest {
    #[schema(example = "credit_card")]
    pub(super) payment_method: String,
}

#[derive(Serialize, ToSchema)]
pub(super) struct OwnedPassResponse {
    pub(super) owned_pass_id: String,
    pub(super) account_id: String,
    pub(super) pass_id: String,
    pub(super) purchase_date: DateTime<Utc>,
    pub(super) expiration_date: DateTime<Utc>,
    pub(super) sessions_remaining: i32,
    pub(super) total_sessions: i32,
    pub(super) is_active: bool,
    pub(super) purchase_price: f64,
    pub(super) payment_method: String,
    pub(super) payment_status: String,
    pub(super) days_remaining: i64,
}

impl From<OwnedPass> for OwnedPassResponse {
    fn from(pass: OwnedPass) -> Self {
        let days_remaining = pass.days_remaining(Utc::now());
        Self {
            owned_pass_id: pass.owned_pass_id,
            account_id: pass.account_id,
            pass_id: pass.pass_id,
            purchase_date: pass.purchase_date,
            expiration_date: pass.expiration_date,
            sessions_remaining: pass.sessions_remaining,
            total_sessions: pass.total_sessions,
            is_active: pass.is_active,
            purchase_price: pass.purchase_price,
            payment_method: pass.payment_method.to_string(),
            payment_status: pass.payment_status.to_string(),
            days_remaining,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct ValidPassResponse {
    pub(super) has_valid_pass: bool,
}

/// Shared query for the report endpoints; `instructor_id` only applies to
/// instructor-performance.
#[derive(Deserialize, Debug, IntoParams)]
pub(super) struct ReportQuery {
    pub(super) year: Option<i32>,
    pub(super) month: Option<u32>,
    pub(super) instructor_id: Option<String>,
}
