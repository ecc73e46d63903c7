//! Integration tests for yoga-track: account lifecycle, class scheduling and
//! registration, pass purchase, attendance debiting and reports, wired
//! through in-memory repositories.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use yoga_track::{
    application::{
        AccountError, AccountService, ClassService, NewClass, NewPassDefinition, PassService,
        RegisterAccount, ReportService, ReportWindow, ScheduleError,
    },
    domain::{
        Account, ClassOffering, ContactMethod, Credential, Day, DurationUnit, InstructorProfile,
        ManagerProfile, OwnedPass, PassDefinition, PassDuration, PaymentMethod, PaymentStatus,
        Role, Slot,
    },
    infrastructure::{
        AccountRepository, ClassRepository, CredentialRepository, InstructorProfileRepository,
        ManagerProfileRepository, OwnedPassRepository, PassDefinitionRepository, RepositoryError,
    },
};

// ============================================================================
// In-memory repositories
// ============================================================================

#[derive(Clone, Default)]
struct InMemoryAccounts {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
}

#[async_trait]
impl AccountRepository for InMemoryAccounts {
    async fn create(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&account.account_id) {
            return Err(RepositoryError::InvalidData(
                "Account already exists".to_string(),
            ));
        }
        accounts.insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Account, RepositoryError> {
        self.accounts
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("Account {}", id)))
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, RepositoryError> {
        self.accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("Account {}", email)))
    }

    async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let mut all: Vec<Account> = self.accounts.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        Ok(all)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, RepositoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|a| a.role == role)
            .collect())
    }

    async fn update(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.lock().unwrap();
        if !accounts.contains_key(&account.account_id) {
            return Err(RepositoryError::NotFound(format!(
                "Account {}",
                account.account_id
            )));
        }
        accounts.insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Account {}", id)))?;
        account.role = role;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.accounts.lock().unwrap().remove(id);
        Ok(())
    }

    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.accounts.lock().unwrap().keys().cloned().collect())
    }

    async fn count_created_between(
        &self,
        role: Role,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.role == role && a.created_at >= from && a.created_at < to)
            .count() as i64)
    }
}

#[derive(Clone, Default)]
struct InMemoryCredentials {
    credentials: Arc<Mutex<HashMap<String, Credential>>>,
}

#[async_trait]
impl CredentialRepository for InMemoryCredentials {
    async fn create(&self, credential: &Credential) -> Result<(), RepositoryError> {
        self.credentials
            .lock()
            .unwrap()
            .insert(credential.account_id.clone(), credential.clone());
        Ok(())
    }

    async fn get_by_account(&self, account_id: &str) -> Result<Credential, RepositoryError> {
        self.credentials
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("Credential {}", account_id)))
    }

    async fn update(&self, credential: &Credential) -> Result<(), RepositoryError> {
        self.credentials
            .lock()
            .unwrap()
            .insert(credential.account_id.clone(), credential.clone());
        Ok(())
    }

    async fn delete_by_account(&self, account_id: &str) -> Result<(), RepositoryError> {
        self.credentials.lock().unwrap().remove(account_id);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct InMemoryInstructorProfiles {
    profiles: Arc<Mutex<HashMap<String, InstructorProfile>>>,
}

#[async_trait]
impl InstructorProfileRepository for InMemoryInstructorProfiles {
    async fn create(&self, profile: &InstructorProfile) -> Result<(), RepositoryError> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.account_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_by_account(&self, account_id: &str) -> Result<InstructorProfile, RepositoryError> {
        self.profiles
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("InstructorProfile {}", account_id)))
    }

    async fn delete_by_account(&self, account_id: &str) -> Result<(), RepositoryError> {
        self.profiles.lock().unwrap().remove(account_id);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct InMemoryManagerProfiles {
    profiles: Arc<Mutex<HashMap<String, ManagerProfile>>>,
}

#[async_trait]
impl ManagerProfileRepository for InMemoryManagerProfiles {
    async fn create(&self, profile: &ManagerProfile) -> Result<(), RepositoryError> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.account_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_by_account(&self, account_id: &str) -> Result<ManagerProfile, RepositoryError> {
        self.profiles
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("ManagerProfile {}", account_id)))
    }

    async fn delete_by_account(&self, account_id: &str) -> Result<(), RepositoryError> {
        self.profiles.lock().unwrap().remove(account_id);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct InMemoryPassDefinitions {
    definitions: Arc<Mutex<HashMap<String, PassDefinition>>>,
}

#[async_trait]
impl PassDefinitionRepository for InMemoryPassDefinitions {
    async fn create(&self, definition: &PassDefinition) -> Result<(), RepositoryError> {
        self.definitions
            .lock()
            .unwrap()
            .insert(definition.pass_id.clone(), definition.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<PassDefinition, RepositoryError> {
        self.definitions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("PassDefinition {}", id)))
    }

    async fn list(&self) -> Result<Vec<PassDefinition>, RepositoryError> {
        let mut all: Vec<PassDefinition> =
            self.definitions.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.pass_id.cmp(&b.pass_id));
        Ok(all)
    }

    async fn list_active(&self) -> Result<Vec<PassDefinition>, RepositoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|d| d.is_active)
            .collect())
    }

    async fn update(&self, definition: &PassDefinition) -> Result<(), RepositoryError> {
        let mut definitions = self.definitions.lock().unwrap();
        if !definitions.contains_key(&definition.pass_id) {
            return Err(RepositoryError::NotFound(format!(
                "PassDefinition {}",
                definition.pass_id
            )));
        }
        definitions.insert(definition.pass_id.clone(), definition.clone());
        Ok(())
    }

    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.definitions.lock().unwrap().keys().cloned().collect())
    }
}

#[derive(Clone, Default)]
struct InMemoryOwnedPasses {
    passes: Arc<Mutex<HashMap<String, OwnedPass>>>,
}

#[async_trait]
impl OwnedPassRepository for InMemoryOwnedPasses {
    async fn create(&self, pass: &OwnedPass) -> Result<(), RepositoryError> {
        self.passes
            .lock()
            .unwrap()
            .insert(pass.owned_pass_id.clone(), pass.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<OwnedPass, RepositoryError> {
        self.passes
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("OwnedPass {}", id)))
    }

    async fn list_by_account(&self, account_id: &str) -> Result<Vec<OwnedPass>, RepositoryError> {
        let mut owned: Vec<OwnedPass> = self
            .passes
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.account_id == account_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        Ok(owned)
    }

    async fn update(&self, pass: &OwnedPass) -> Result<(), RepositoryError> {
        let mut passes = self.passes.lock().unwrap();
        if !passes.contains_key(&pass.owned_pass_id) {
            return Err(RepositoryError::NotFound(format!(
                "OwnedPass {}",
                pass.owned_pass_id
            )));
        }
        passes.insert(pass.owned_pass_id.clone(), pass.clone());
        Ok(())
    }

    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.passes.lock().unwrap().keys().cloned().collect())
    }

    async fn sales_summary_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(i64, f64), RepositoryError> {
        let passes = self.passes.lock().unwrap();
        let sold: Vec<&OwnedPass> = passes
            .values()
            .filter(|p| {
                p.payment_status == PaymentStatus::Completed
                    && p.purchase_date >= from
                    && p.purchase_date < to
            })
            .collect();
        let revenue = sold.iter().map(|p| p.purchase_price).sum();
        Ok((sold.len() as i64, revenue))
    }
}

#[derive(Clone, Default)]
struct InMemoryClasses {
    classes: Arc<Mutex<HashMap<String, ClassOffering>>>,
}

#[async_trait]
impl ClassRepository for InMemoryClasses {
    async fn create(&self, class: &ClassOffering) -> Result<(), RepositoryError> {
        self.classes
            .lock()
            .unwrap()
            .insert(class.class_id.clone(), class.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<ClassOffering, RepositoryError> {
        self.classes
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("Class {}", id)))
    }

    async fn list(&self) -> Result<Vec<ClassOffering>, RepositoryError> {
        let mut all: Vec<ClassOffering> = self.classes.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.class_id.cmp(&b.class_id));
        Ok(all)
    }

    async fn list_active(&self) -> Result<Vec<ClassOffering>, RepositoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .collect())
    }

    async fn list_by_instructor(
        &self,
        instructor_id: &str,
    ) -> Result<Vec<ClassOffering>, RepositoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|c| c.instructor_id == instructor_id)
            .collect())
    }

    async fn save(&self, class: &ClassOffering) -> Result<(), RepositoryError> {
        self.classes
            .lock()
            .unwrap()
            .insert(class.class_id.clone(), class.clone());
        Ok(())
    }

    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.classes.lock().unwrap().keys().cloned().collect())
    }
}

// ============================================================================
// Fixture
// ============================================================================

type Accounts = AccountService<
    InMemoryAccounts,
    InMemoryCredentials,
    InMemoryInstructorProfiles,
    InMemoryManagerProfiles,
>;
type Classes = ClassService<InMemoryClasses, InMemoryOwnedPasses, InMemoryAccounts>;
type Passes = PassService<InMemoryPassDefinitions, InMemoryOwnedPasses>;
type Reports = ReportService<InMemoryAccounts, InMemoryOwnedPasses, InMemoryClasses>;

struct Studio {
    owned_passes: Arc<InMemoryOwnedPasses>,
    accounts: Accounts,
    classes: Classes,
    passes: Passes,
    reports: Reports,
}

fn studio() -> Studio {
    let account_repo = Arc::new(InMemoryAccounts::default());
    let credential_repo = Arc::new(InMemoryCredentials::default());
    let instructor_repo = Arc::new(InMemoryInstructorProfiles::default());
    let manager_repo = Arc::new(InMemoryManagerProfiles::default());
    let definition_repo = Arc::new(InMemoryPassDefinitions::default());
    let owned_pass_repo = Arc::new(InMemoryOwnedPasses::default());
    let class_repo = Arc::new(InMemoryClasses::default());

    Studio {
        owned_passes: owned_pass_repo.clone(),
        accounts: AccountService::new(
            account_repo.clone(),
            credential_repo,
            instructor_repo,
            manager_repo,
            "integration-secret".to_string(),
            60,
        ),
        classes: ClassService::new(
            class_repo.clone(),
            owned_pass_repo.clone(),
            account_repo.clone(),
        ),
        passes: PassService::new(definition_repo, owned_pass_repo.clone()),
        reports: ReportService::new(account_repo, owned_pass_repo, class_repo),
    }
}

fn registration(name: &str, email: &str, role: Role) -> RegisterAccount {
    RegisterAccount {
        firstname: name.to_string(),
        lastname: "Tester".to_string(),
        email: email.to_string(),
        phone: "555-0100".to_string(),
        address: "12 Studio Lane".to_string(),
        preferred_contact: ContactMethod::Email,
        role,
        password: "s3cret-pw".to_string(),
    }
}

fn monday_morning() -> Slot {
    Slot {
        day: Day::Monday,
        time: "09:00".to_string(),
        duration_minutes: 60,
    }
}

fn vinyasa(instructor_id: &str, slots: Vec<Slot>, capacity: Option<i32>) -> NewClass {
    NewClass {
        name: "Morning Vinyasa".to_string(),
        class_type: "vinyasa".to_string(),
        description: None,
        instructor_id: instructor_id.to_string(),
        slots,
        capacity,
    }
}

fn ten_session_pass() -> NewPassDefinition {
    NewPassDefinition {
        name: "Ten Sessions".to_string(),
        description: None,
        duration: PassDuration {
            value: 1,
            unit: DurationUnit::Months,
        },
        sessions: 10,
        price: 120.0,
    }
}

async fn seed_instructor(studio: &Studio, email: &str) -> Account {
    studio
        .accounts
        .register(registration("Iris", email, Role::Instructor))
        .await
        .unwrap()
}

async fn seed_client_with_pass(studio: &Studio, email: &str) -> (Account, OwnedPass) {
    let client = studio
        .accounts
        .register(registration("Cleo", email, Role::Client))
        .await
        .unwrap();
    let manager = studio
        .accounts
        .register(registration(
            "Mona",
            &format!("mgr-{}", email),
            Role::Manager,
        ))
        .await
        .unwrap();
    let definition = studio
        .passes
        .create_definition(ten_session_pass(), &manager.account_id)
        .await
        .unwrap();
    let pass = studio
        .passes
        .purchase(
            &client.account_id,
            &definition.pass_id,
            PaymentMethod::CreditCard,
        )
        .await
        .unwrap();
    (client, pass)
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn registration_assigns_sequential_role_prefixed_ids() {
    let studio = studio();

    let first = studio
        .accounts
        .register(registration("Ada", "ada@example.com", Role::Client))
        .await
        .unwrap();
    let second = studio
        .accounts
        .register(registration("Bea", "bea@example.com", Role::Client))
        .await
        .unwrap();
    let instructor = seed_instructor(&studio, "iris@example.com").await;

    assert_eq!(first.account_id, "U00001");
    assert_eq!(second.account_id, "U00002");
    // Instructor numbering is independent of client numbering.
    assert_eq!(instructor.account_id, "I00001");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let studio = studio();
    studio
        .accounts
        .register(registration("Ada", "ada@example.com", Role::Client))
        .await
        .unwrap();

    let err = studio
        .accounts
        .register(registration("Imposter", "ada@example.com", Role::Client))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::DuplicateEmail(_)));
}

#[tokio::test]
async fn login_issues_token_and_rejects_bad_password_uniformly() {
    let studio = studio();
    studio
        .accounts
        .register(registration("Ada", "ada@example.com", Role::Client))
        .await
        .unwrap();

    let (token, account) = studio
        .accounts
        .login("ada@example.com", "s3cret-pw")
        .await
        .unwrap();
    assert!(!token.is_empty());
    assert_eq!(account.account_id, "U00001");

    let wrong_password = studio
        .accounts
        .login("ada@example.com", "wrong")
        .await
        .unwrap_err();
    let unknown_email = studio
        .accounts
        .login("nobody@example.com", "s3cret-pw")
        .await
        .unwrap_err();
    // Same error either way, so a probe can't tell which part was wrong.
    assert!(matches!(wrong_password, AccountError::InvalidCredentials));
    assert!(matches!(unknown_email, AccountError::InvalidCredentials));
}

#[tokio::test]
async fn promote_and_demote_keep_the_account_id() {
    let studio = studio();
    let account = studio
        .accounts
        .register(registration("Ada", "ada@example.com", Role::Client))
        .await
        .unwrap();

    let profile = studio
        .accounts
        .promote_to_instructor(&account.account_id, vec!["yin".to_string()])
        .await
        .unwrap();
    assert_eq!(profile.account_id, "U00001");

    let promoted = studio.accounts.get_account("U00001").await.unwrap();
    assert_eq!(promoted.role, Role::Instructor);

    // A second promotion is a conflict, not an overwrite.
    let err = studio
        .accounts
        .promote_to_manager("U00001", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::AlreadyPromoted(_, _)));

    studio.accounts.demote_instructor("U00001").await.unwrap();
    let demoted = studio.accounts.get_account("U00001").await.unwrap();
    assert_eq!(demoted.role, Role::Client);
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let studio = studio();
    studio
        .accounts
        .register(registration("Ada", "ada@example.com", Role::Client))
        .await
        .unwrap();

    let err = studio
        .accounts
        .change_password("U00001", "wrong", "new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::InvalidCredentials));

    studio
        .accounts
        .change_password("U00001", "s3cret-pw", "new-password")
        .await
        .unwrap();
    studio
        .accounts
        .login("ada@example.com", "new-password")
        .await
        .unwrap();
}

// ============================================================================
// Scheduling and registration
// ============================================================================

#[tokio::test]
async fn same_instructor_same_slot_conflicts_with_alternatives() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;

    studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();

    let err = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap_err();
    match err {
        ScheduleError::Conflict { conflict, .. } => {
            assert_eq!(conflict.class_id, "C00001");
            assert_eq!(
                conflict.alternative_times,
                vec!["08:00".to_string(), "10:00".to_string()]
            );
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    // Another instructor may hold the identical slot.
    let other = seed_instructor(&studio, "ivan@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&other.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    assert_eq!(class.class_id, "C00002");
}

#[tokio::test]
async fn deactivated_classes_free_their_slots() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;

    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    studio.classes.deactivate_class(&class.class_id).await.unwrap();

    studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
}

#[tokio::test]
async fn registration_requires_a_usable_pass() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;

    // Someone else's pass is no pass at all.
    let err = studio
        .classes
        .register_for_class(&class.class_id, "U00099", &pass.owned_pass_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(_)));

    let updated = studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap();
    assert_eq!(updated.roster.len(), 1);

    let duplicate = studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap_err();
    assert!(matches!(duplicate, ScheduleError::Validation(_)));
}

#[tokio::test]
async fn expired_passes_cannot_register() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;

    let mut expired = pass.clone();
    expired.expiration_date = Utc::now() - Duration::days(1);
    studio.owned_passes.update(&expired).await.unwrap();

    let err = studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(msg) if msg.contains("expired")));
}

#[tokio::test]
async fn full_classes_reject_further_registrations() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(
            &instructor.account_id,
            vec![monday_morning()],
            Some(1),
        ))
        .await
        .unwrap();

    let (first, first_pass) = seed_client_with_pass(&studio, "cleo@example.com").await;
    studio
        .classes
        .register_for_class(&class.class_id, &first.account_id, &first_pass.owned_pass_id)
        .await
        .unwrap();

    let (second, second_pass) = seed_client_with_pass(&studio, "dana@example.com").await;
    let err = studio
        .classes
        .register_for_class(
            &class.class_id,
            &second.account_id,
            &second_pass.owned_pass_id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(msg) if msg.contains("capacity")));
}

#[tokio::test]
async fn cancelling_frees_the_spot_without_touching_the_pass() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;

    studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap();
    let after = studio
        .classes
        .cancel_registration(&class.class_id, &client.account_id)
        .await
        .unwrap();
    assert!(after.roster.is_empty());

    let untouched = studio
        .owned_passes
        .get_by_id(&pass.owned_pass_id)
        .await
        .unwrap();
    assert_eq!(untouched.sessions_remaining, pass.sessions_remaining);
}

// ============================================================================
// Attendance
// ============================================================================

#[tokio::test]
async fn attendance_debits_one_session_per_attendee() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;
    studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    let outcome = studio
        .classes
        .mark_attendance(
            &class.class_id,
            &instructor.account_id,
            date,
            &[client.account_id.clone()],
        )
        .await
        .unwrap();
    assert_eq!(outcome.accepted, 1);

    let debited = studio
        .owned_passes
        .get_by_id(&pass.owned_pass_id)
        .await
        .unwrap();
    assert_eq!(debited.sessions_remaining, 9);
}

#[tokio::test]
async fn attendance_silently_drops_unregistered_candidates() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;
    studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    let outcome = studio
        .classes
        .mark_attendance(
            &class.class_id,
            &instructor.account_id,
            date,
            &[client.account_id.clone(), "U00099".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(outcome.accepted, 1);
    let attendees = studio
        .classes
        .class_attendance(&class.class_id, date, Some(&instructor.account_id))
        .await
        .unwrap();
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0].account_id, client.account_id);
}

#[tokio::test]
async fn remarking_a_date_replaces_the_record_without_refunding() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;
    studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    studio
        .classes
        .mark_attendance(
            &class.class_id,
            &instructor.account_id,
            date,
            &[client.account_id.clone()],
        )
        .await
        .unwrap();

    // Re-mark the same date with an empty list: record replaced, session kept.
    let outcome = studio
        .classes
        .mark_attendance(&class.class_id, &instructor.account_id, date, &[])
        .await
        .unwrap();
    assert_eq!(outcome.accepted, 0);

    let attendees = studio
        .classes
        .class_attendance(&class.class_id, date, None)
        .await
        .unwrap();
    assert!(attendees.is_empty());
    let debited = studio
        .owned_passes
        .get_by_id(&pass.owned_pass_id)
        .await
        .unwrap();
    assert_eq!(debited.sessions_remaining, 9);
}

#[tokio::test]
async fn exhausted_passes_stop_counting_and_deactivate() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;
    studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap();

    let mut nearly_spent = studio
        .owned_passes
        .get_by_id(&pass.owned_pass_id)
        .await
        .unwrap();
    nearly_spent.sessions_remaining = 1;
    studio.owned_passes.update(&nearly_spent).await.unwrap();

    let first = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    let outcome = studio
        .classes
        .mark_attendance(
            &class.class_id,
            &instructor.account_id,
            first,
            &[client.account_id.clone()],
        )
        .await
        .unwrap();
    assert_eq!(outcome.accepted, 1);

    let spent = studio
        .owned_passes
        .get_by_id(&pass.owned_pass_id)
        .await
        .unwrap();
    assert_eq!(spent.sessions_remaining, 0);
    assert!(!spent.is_active);

    // The next session finds nothing left to debit and drops the attendee.
    let second = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
    let outcome = studio
        .classes
        .mark_attendance(
            &class.class_id,
            &instructor.account_id,
            second,
            &[client.account_id.clone()],
        )
        .await
        .unwrap();
    assert_eq!(outcome.accepted, 0);
}

#[tokio::test]
async fn attendance_on_someone_elses_class_reads_as_not_found() {
    let studio = studio();
    let owner = seed_instructor(&studio, "iris@example.com").await;
    let intruder = seed_instructor(&studio, "ivan@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&owner.account_id, vec![monday_morning()], None))
        .await
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    let err = studio
        .classes
        .mark_attendance(&class.class_id, &intruder.account_id, date, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::NotFound(_)));

    let err = studio
        .classes
        .class_attendance(&class.class_id, date, Some(&intruder.account_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::NotFound(_)));
}

// ============================================================================
// Passes
// ============================================================================

#[tokio::test]
async fn purchase_sets_expiry_and_sessions_from_the_definition() {
    let studio = studio();
    let (_, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;

    assert_eq!(pass.owned_pass_id, "UP00001");
    assert_eq!(pass.sessions_remaining, 10);
    assert_eq!(pass.total_sessions, 10);
    assert_eq!(pass.payment_status, PaymentStatus::Completed);
    let lifetime = pass.expiration_date - pass.purchase_date;
    assert_eq!(lifetime.num_days(), 30);
}

#[tokio::test]
async fn deactivated_definitions_cannot_be_purchased() {
    let studio = studio();
    let manager = studio
        .accounts
        .register(registration("Mona", "mona@example.com", Role::Manager))
        .await
        .unwrap();
    let client = studio
        .accounts
        .register(registration("Cleo", "cleo@example.com", Role::Client))
        .await
        .unwrap();
    let definition = studio
        .passes
        .create_definition(ten_session_pass(), &manager.account_id)
        .await
        .unwrap();

    studio
        .passes
        .deactivate_definition(&definition.pass_id)
        .await
        .unwrap();
    let err = studio
        .passes
        .purchase(
            &client.account_id,
            &definition.pass_id,
            PaymentMethod::Cash,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        yoga_track::application::PassError::NotFound(_)
    ));
}

#[tokio::test]
async fn valid_pass_check_sees_only_usable_passes() {
    let studio = studio();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;

    assert!(studio.passes.has_valid_pass(&client.account_id).await.unwrap());

    let mut spent = pass.clone();
    spent.sessions_remaining = 0;
    spent.is_active = false;
    studio.owned_passes.update(&spent).await.unwrap();

    assert!(!studio.passes.has_valid_pass(&client.account_id).await.unwrap());
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn performance_report_counts_signups_and_sales() {
    let studio = studio();
    let (_, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;

    let now = Utc::now();
    let window = ReportWindow::resolve(Some(now.year()), Some(now.month())).unwrap();
    let report = studio.reports.performance(window).await.unwrap();

    assert_eq!(report.new_clients, 1);
    assert_eq!(report.new_instructors, 0);
    assert_eq!(report.pass_sales.sale_count, 1);
    assert!((report.pass_sales.revenue - pass.purchase_price).abs() < f64::EPSILON);
    // Monthly breakdown only comes with year-wide windows.
    assert!(report.monthly_sales.is_none());

    let yearly = ReportWindow::resolve(Some(now.year()), None).unwrap();
    let report = studio.reports.performance(yearly).await.unwrap();
    assert!(report.monthly_sales.is_some());
    assert_eq!(report.monthly_sales.unwrap().len(), 12);
}

#[tokio::test]
async fn instructor_performance_counts_registrations_and_attendance() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;
    studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap();

    let now = Utc::now();
    let date = now.date_naive();
    studio
        .classes
        .mark_attendance(
            &class.class_id,
            &instructor.account_id,
            date,
            &[client.account_id.clone()],
        )
        .await
        .unwrap();

    let window = ReportWindow::resolve(Some(now.year()), Some(now.month())).unwrap();
    let report = studio
        .reports
        .instructor_performance(window, None)
        .await
        .unwrap();

    assert_eq!(report.instructors.len(), 1);
    let stats = &report.instructors[0];
    assert_eq!(stats.instructor_id, instructor.account_id);
    assert_eq!(stats.classes.len(), 1);
    assert_eq!(stats.registrations, 1);
    assert_eq!(stats.attendance, 1);
    assert_eq!(stats.unique_students, 1);
}

#[tokio::test]
async fn customer_attendance_reports_scheduled_vs_attended() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;
    studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap();

    let now = Utc::now();
    let window = ReportWindow::resolve(Some(now.year()), Some(now.month())).unwrap();
    let report = studio.reports.customer_attendance(window).await.unwrap();

    assert_eq!(report.customers.len(), 1);
    let stats = &report.customers[0];
    assert_eq!(stats.account_id, client.account_id);
    assert_eq!(stats.scheduled, 1);
    assert_eq!(stats.attended, 0);
    assert!((stats.attendance_rate - 0.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn general_attendance_rolls_up_by_class_and_type() {
    let studio = studio();
    let instructor = seed_instructor(&studio, "iris@example.com").await;
    let class = studio
        .classes
        .create_class(vinyasa(&instructor.account_id, vec![monday_morning()], None))
        .await
        .unwrap();
    let (client, pass) = seed_client_with_pass(&studio, "cleo@example.com").await;
    studio
        .classes
        .register_for_class(&class.class_id, &client.account_id, &pass.owned_pass_id)
        .await
        .unwrap();

    let now = Utc::now();
    studio
        .classes
        .mark_attendance(
            &class.class_id,
            &instructor.account_id,
            now.date_naive(),
            &[client.account_id.clone()],
        )
        .await
        .unwrap();

    let window = ReportWindow::resolve(Some(now.year()), Some(now.month())).unwrap();
    let report = studio.reports.general_attendance(window).await.unwrap();

    assert_eq!(report.classes.len(), 1);
    assert_eq!(report.classes[0].sessions_held, 1);
    assert_eq!(report.classes[0].attendance, 1);
    assert_eq!(report.by_type.len(), 1);
    assert_eq!(report.by_type[0].class_type, "vinyasa");
}
