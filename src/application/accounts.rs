use crate::domain::{
    Account, ContactMethod, Credential, InstructorProfile, ManagerProfile, Role,
    DEFAULT_DEPARTMENT,
};
use crate::infrastructure::{
    auth, AccountRepository, AuthError, CredentialRepository, InstructorProfileRepository,
    ManagerProfileRepository, RepositoryError,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),
    #[error("Account not found: {0}")]
    NotFound(String),
    #[error("Account {0} already holds role {1}")]
    AlreadyPromoted(String, Role),
    #[error("Account {0} has no {1} profile")]
    NotPromoted(String, Role),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub preferred_contact: ContactMethod,
    pub role: Role,
    pub password: String,
}

/// Contact-field update. Role and account ID are immutable here; role changes
/// go through promotion/demotion only.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccount {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub preferred_contact: Option<ContactMethod>,
}

pub struct AccountService<A, C, I, M>
where
    A: AccountRepository,
    C: CredentialRepository,
    I: InstructorProfileRepository,
    M: ManagerProfileRepository,
{
    account_repo: Arc<A>,
    credential_repo: Arc<C>,
    instructor_repo: Arc<I>,
    manager_repo: Arc<M>,
    jwt_secret: String,
    token_ttl_minutes: i64,
}

impl<A, C, I, M> AccountService<A, C, I, M>
where
    A: AccountRepository,
    C: CredentialRepository,
    I: InstructorProfileRepository,
    M: ManagerProfileRepository,
{
    pub fn new(
        account_repo: Arc<A>,
        credential_repo: Arc<C>,
        instructor_repo: Arc<I>,
        manager_repo: Arc<M>,
        jwt_secret: String,
        token_ttl_minutes: i64,
    ) -> Self {
        Self {
            account_repo,
            credential_repo,
            instructor_repo,
            manager_repo,
            jwt_secret,
            token_ttl_minutes,
        }
    }

    /// ID the next account of this role would receive. Read-then-write: two
    /// concurrent registrations can collide at the unique constraint.
    pub async fn next_account_id(&self, role: Role) -> Result<String, AccountError> {
        let ids = self.account_repo.all_ids().await?;
        let kind = role.id_kind();
        Ok(kind.next(kind.max_sequence(ids.iter().map(String::as_str))))
    }

    pub async fn register(&self, request: RegisterAccount) -> Result<Account, AccountError> {
        if request.password.len() < auth::MIN_PASSWORD_LEN {
            return Err(AccountError::Validation(format!(
                "password must be at least {} characters",
                auth::MIN_PASSWORD_LEN
            )));
        }
        if !request.email.contains('@') {
            return Err(AccountError::Validation("invalid email address".into()));
        }

        match self.account_repo.get_by_email(&request.email).await {
            Ok(_) => return Err(AccountError::DuplicateEmail(request.email)),
            Err(RepositoryError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let account_id = self.next_account_id(request.role).await?;
        let account = Account::new(
            account_id.clone(),
            request.firstname,
            request.lastname,
            request.email,
            request.phone,
            request.address,
            request.preferred_contact,
            request.role,
        );
        self.account_repo.create(&account).await?;

        let hash = auth::hash_password(&request.password)?;
        self.credential_repo
            .create(&Credential::new(account_id.clone(), hash))
            .await?;

        // Direct instructor/manager registration gets a default profile;
        // specialties and department are filled in later through updates.
        match request.role {
            Role::Instructor => {
                self.instructor_repo
                    .create(&InstructorProfile::new(account_id.clone(), Vec::new()))
                    .await?;
            }
            Role::Manager => {
                self.manager_repo
                    .create(&ManagerProfile::new(
                        account_id.clone(),
                        DEFAULT_DEPARTMENT.to_string(),
                    ))
                    .await?;
            }
            Role::Client => {}
        }

        info!("Registered account {} ({})", account_id, account.role);
        Ok(account)
    }

    /// Any failure collapses to [`AccountError::InvalidCredentials`] so the
    /// response never reveals whether the email exists.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Account), AccountError> {
        let account = self
            .account_repo
            .get_by_email(email)
            .await
            .map_err(|_| AccountError::InvalidCredentials)?;
        let credential = self
            .credential_repo
            .get_by_account(&account.account_id)
            .await
            .map_err(|_| AccountError::InvalidCredentials)?;

        if !credential.is_active || !auth::verify_password(password, &credential.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        let token = auth::issue_token(&account, &self.jwt_secret, self.token_ttl_minutes)?;
        Ok((token, account))
    }

    pub async fn change_password(
        &self,
        account_id: &str,
        current: &str,
        new: &str,
    ) -> Result<(), AccountError> {
        if new.len() < auth::MIN_PASSWORD_LEN {
            return Err(AccountError::Validation(format!(
                "password must be at least {} characters",
                auth::MIN_PASSWORD_LEN
            )));
        }

        let mut credential = self.credential_repo.get_by_account(account_id).await?;
        if !auth::verify_password(current, &credential.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        credential.password_hash = auth::hash_password(new)?;
        credential.last_changed = chrono::Utc::now();
        self.credential_repo.update(&credential).await?;
        Ok(())
    }

    pub async fn get_account(&self, id: &str) -> Result<Account, AccountError> {
        self.account_repo.get_by_id(id).await.map_err(|e| match e {
            RepositoryError::NotFound(_) => AccountError::NotFound(id.to_string()),
            _ => e.into(),
        })
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.account_repo.list().await?)
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, AccountError> {
        Ok(self.account_repo.list_by_role(role).await?)
    }

    pub async fn update_account(
        &self,
        id: &str,
        update: UpdateAccount,
    ) -> Result<Account, AccountError> {
        let mut account = self.get_account(id).await?;

        if let Some(email) = &update.email {
            if email != &account.email {
                match self.account_repo.get_by_email(email).await {
                    Ok(_) => return Err(AccountError::DuplicateEmail(email.clone())),
                    Err(RepositoryError::NotFound(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        if let Some(v) = update.firstname {
            account.firstname = v;
        }
        if let Some(v) = update.lastname {
            account.lastname = v;
        }
        if let Some(v) = update.email {
            account.email = v;
        }
        if let Some(v) = update.phone {
            account.phone = v;
        }
        if let Some(v) = update.address {
            account.address = v;
        }
        if let Some(v) = update.preferred_contact {
            account.preferred_contact = v;
        }
        account.updated_at = chrono::Utc::now();

        self.account_repo.update(&account).await?;
        Ok(account)
    }

    pub async fn delete_account(&self, id: &str) -> Result<(), AccountError> {
        let account = self.get_account(id).await?;

        self.credential_repo.delete_by_account(id).await?;
        match account.role {
            Role::Instructor => self.instructor_repo.delete_by_account(id).await?,
            Role::Manager => self.manager_repo.delete_by_account(id).await?,
            Role::Client => {}
        }
        self.account_repo.delete(id).await?;

        info!("Deleted account {}", id);
        Ok(())
    }

    /// Promote a client to instructor. The account keeps its original ID;
    /// only the role column changes.
    pub async fn promote_to_instructor(
        &self,
        id: &str,
        specialties: Vec<String>,
    ) -> Result<InstructorProfile, AccountError> {
        let account = self.get_account(id).await?;
        if account.role != Role::Client {
            return Err(AccountError::AlreadyPromoted(id.to_string(), account.role));
        }

        let profile = InstructorProfile::new(id.to_string(), specialties);
        self.instructor_repo.create(&profile).await?;
        self.account_repo.update_role(id, Role::Instructor).await?;

        info!("Promoted {} to instructor", id);
        Ok(profile)
    }

    pub async fn promote_to_manager(
        &self,
        id: &str,
        department: Option<String>,
    ) -> Result<ManagerProfile, AccountError> {
        let account = self.get_account(id).await?;
        if account.role != Role::Client {
            return Err(AccountError::AlreadyPromoted(id.to_string(), account.role));
        }

        let profile = ManagerProfile::new(
            id.to_string(),
            department.unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
        );
        self.manager_repo.create(&profile).await?;
        self.account_repo.update_role(id, Role::Manager).await?;

        info!("Promoted {} to manager", id);
        Ok(profile)
    }

    pub async fn demote_instructor(&self, id: &str) -> Result<(), AccountError> {
        let account = self.get_account(id).await?;
        if account.role != Role::Instructor {
            return Err(AccountError::NotPromoted(id.to_string(), Role::Instructor));
        }

        self.instructor_repo.delete_by_account(id).await?;
        self.account_repo.update_role(id, Role::Client).await?;

        info!("Demoted {} to client", id);
        Ok(())
    }

    pub async fn demote_manager(&self, id: &str) -> Result<(), AccountError> {
        let account = self.get_account(id).await?;
        if account.role != Role::Manager {
            return Err(AccountError::NotPromoted(id.to_string(), Role::Manager));
        }

        self.manager_repo.delete_by_account(id).await?;
        self.account_repo.update_role(id, Role::Client).await?;

        info!("Demoted {} to client", id);
        Ok(())
    }

    pub async fn instructor_profile(&self, id: &str) -> Result<InstructorProfile, AccountError> {
        self.instructor_repo
            .get_by_account(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => {
                    AccountError::NotPromoted(id.to_string(), Role::Instructor)
                }
                _ => e.into(),
            })
    }

    pub async fn manager_profile(&self, id: &str) -> Result<ManagerProfile, AccountError> {
        self.manager_repo
            .get_by_account(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => {
                    AccountError::NotPromoted(id.to_string(), Role::Manager)
                }
                _ => e.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{
        MockAccountRepository, MockCredentialRepository, MockInstructorProfileRepository,
        MockManagerProfileRepository,
    };

    fn service(
        account_repo: MockAccountRepository,
        credential_repo: MockCredentialRepository,
        instructor_repo: MockInstructorProfileRepository,
        manager_repo: MockManagerProfileRepository,
    ) -> AccountService<
        MockAccountRepository,
        MockCredentialRepository,
        MockInstructorProfileRepository,
        MockManagerProfileRepository,
    > {
        AccountService::new(
            Arc::new(account_repo),
            Arc::new(credential_repo),
            Arc::new(instructor_repo),
            Arc::new(manager_repo),
            "test-secret".into(),
            60,
        )
    }

    fn register_request(role: Role) -> RegisterAccount {
        RegisterAccount {
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "555-0100".into(),
            address: "1 Analytical Way".into(),
            preferred_contact: ContactMethod::Email,
            role,
            password: "secret1".into(),
        }
    }

    fn existing_account() -> Account {
        Account::new(
            "U00001".into(),
            "Ada".into(),
            "Lovelace".into(),
            "ada@example.com".into(),
            "555-0100".into(),
            "1 Analytical Way".into(),
            ContactMethod::Email,
            Role::Client,
        )
    }

    #[tokio::test]
    async fn register_rejects_short_passwords_before_touching_the_store() {
        let svc = service(
            MockAccountRepository::new(),
            MockCredentialRepository::new(),
            MockInstructorProfileRepository::new(),
            MockManagerProfileRepository::new(),
        );

        let mut request = register_request(Role::Client);
        request.password = "short".into();
        let err = svc.register(request).await.unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_get_by_email()
            .returning(|_| Ok(existing_account()));

        let svc = service(
            accounts,
            MockCredentialRepository::new(),
            MockInstructorProfileRepository::new(),
            MockManagerProfileRepository::new(),
        );

        let err = svc.register(register_request(Role::Client)).await.unwrap_err();
        assert!(matches!(err, AccountError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn first_client_gets_u00001() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_get_by_email()
            .returning(|email| Err(RepositoryError::NotFound(email.to_string())));
        accounts.expect_all_ids().returning(|| Ok(Vec::new()));
        accounts.expect_create().returning(|_| Ok(()));
        let mut credentials = MockCredentialRepository::new();
        credentials.expect_create().returning(|_| Ok(()));

        let svc = service(
            accounts,
            credentials,
            MockInstructorProfileRepository::new(),
            MockManagerProfileRepository::new(),
        );

        let account = svc.register(register_request(Role::Client)).await.unwrap();
        assert_eq!(account.account_id, "U00001");
        assert_eq!(account.role, Role::Client);
    }

    #[tokio::test]
    async fn login_failures_are_uniform() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_get_by_email()
            .returning(|email| Err(RepositoryError::NotFound(email.to_string())));

        let svc = service(
            accounts,
            MockCredentialRepository::new(),
            MockInstructorProfileRepository::new(),
            MockManagerProfileRepository::new(),
        );

        let err = svc.login("ghost@example.com", "whatever").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_issues_a_verifiable_token() {
        let hash = auth::hash_password("secret1").unwrap();
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_get_by_email()
            .returning(|_| Ok(existing_account()));
        let mut credentials = MockCredentialRepository::new();
        credentials
            .expect_get_by_account()
            .returning(move |id| Ok(Credential::new(id.to_string(), hash.clone())));

        let svc = service(
            accounts,
            credentials,
            MockInstructorProfileRepository::new(),
            MockManagerProfileRepository::new(),
        );

        let (token, account) = svc.login("ada@example.com", "secret1").await.unwrap();
        let claims = auth::verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, account.account_id);
        assert_eq!(claims.role, Role::Client);
    }

    #[tokio::test]
    async fn promotion_requires_a_client_role() {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_get_by_id().returning(|_| {
            let mut account = existing_account();
            account.role = Role::Instructor;
            Ok(account)
        });

        let svc = service(
            accounts,
            MockCredentialRepository::new(),
            MockInstructorProfileRepository::new(),
            MockManagerProfileRepository::new(),
        );

        let err = svc
            .promote_to_instructor("U00001", vec!["vinyasa".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::AlreadyPromoted(_, Role::Instructor)));
    }
}
