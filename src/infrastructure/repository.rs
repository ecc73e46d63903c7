use crate::domain::{
    Account, AttendanceRecord, ClassOffering, ContactMethod, Credential, InstructorProfile,
    ManagerProfile, OwnedPass, PassDefinition, PassDuration, PaymentMethod, PaymentStatus,
    Registration, Role, Slot,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    #[must_use]
    async fn create(&self, account: &Account) -> Result<(), RepositoryError>;
    #[must_use]
    async fn get_by_id(&self, id: &str) -> Result<Account, RepositoryError>;
    #[must_use]
    async fn get_by_email(&self, email: &str) -> Result<Account, RepositoryError>;
    #[must_use]
    async fn list(&self) -> Result<Vec<Account>, RepositoryError>;
    #[must_use]
    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, RepositoryError>;
    #[must_use]
    async fn update(&self, account: &Account) -> Result<(), RepositoryError>;
    #[must_use]
    async fn update_role(&self, id: &str, role: Role) -> Result<(), RepositoryError>;
    #[must_use]
    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
    /// Every account ID in the store, for sequential ID issuance.
    #[must_use]
    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError>;
    #[must_use]
    async fn count_created_between(
        &self,
        role: Role,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    #[must_use]
    async fn create(&self, credential: &Credential) -> Result<(), RepositoryError>;
    #[must_use]
    async fn get_by_account(&self, account_id: &str) -> Result<Credential, RepositoryError>;
    #[must_use]
    async fn update(&self, credential: &Credential) -> Result<(), RepositoryError>;
    #[must_use]
    async fn delete_by_account(&self, account_id: &str) -> Result<(), RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstructorProfileRepository: Send + Sync {
    #[must_use]
    async fn create(&self, profile: &InstructorProfile) -> Result<(), RepositoryError>;
    #[must_use]
    async fn get_by_account(&self, account_id: &str) -> Result<InstructorProfile, RepositoryError>;
    #[must_use]
    async fn delete_by_account(&self, account_id: &str) -> Result<(), RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManagerProfileRepository: Send + Sync {
    #[must_use]
    async fn create(&self, profile: &ManagerProfile) -> Result<(), RepositoryError>;
    #[must_use]
    async fn get_by_account(&self, account_id: &str) -> Result<ManagerProfile, RepositoryError>;
    #[must_use]
    async fn delete_by_account(&self, account_id: &str) -> Result<(), RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PassDefinitionRepository: Send + Sync {
    #[must_use]
    async fn create(&self, definition: &PassDefinition) -> Result<(), RepositoryError>;
    #[must_use]
    async fn get_by_id(&self, id: &str) -> Result<PassDefinition, RepositoryError>;
    #[must_use]
    async fn list(&self) -> Result<Vec<PassDefinition>, RepositoryError>;
    #[must_use]
    async fn list_active(&self) -> Result<Vec<PassDefinition>, RepositoryError>;
    #[must_use]
    async fn update(&self, definition: &PassDefinition) -> Result<(), RepositoryError>;
    #[must_use]
    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OwnedPassRepository: Send + Sync {
    #[must_use]
    async fn create(&self, pass: &OwnedPass) -> Result<(), RepositoryError>;
    #[must_use]
    async fn get_by_id(&self, id: &str) -> Result<OwnedPass, RepositoryError>;
    #[must_use]
    async fn list_by_account(&self, account_id: &str) -> Result<Vec<OwnedPass>, RepositoryError>;
    #[must_use]
    async fn update(&self, pass: &OwnedPass) -> Result<(), RepositoryError>;
    #[must_use]
    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError>;
    /// Completed-sale count and revenue inside a window, aggregated in SQL.
    #[must_use]
    async fn sales_summary_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(i64, f64), RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClassRepository: Send + Sync {
    #[must_use]
    async fn create(&self, class: &ClassOffering) -> Result<(), RepositoryError>;
    #[must_use]
    async fn get_by_id(&self, id: &str) -> Result<ClassOffering, RepositoryError>;
    #[must_use]
    async fn list(&self) -> Result<Vec<ClassOffering>, RepositoryError>;
    #[must_use]
    async fn list_active(&self) -> Result<Vec<ClassOffering>, RepositoryError>;
    #[must_use]
    async fn list_by_instructor(
        &self,
        instructor_id: &str,
    ) -> Result<Vec<ClassOffering>, RepositoryError>;
    /// Persist the whole class document, roster and attendance included.
    #[must_use]
    async fn save(&self, class: &ClassOffering) -> Result<(), RepositoryError>;
    #[must_use]
    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError>;
}

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, firstname, lastname, email, phone, address,
                                  preferred_contact, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&account.account_id)
        .bind(&account.firstname)
        .bind(&account.lastname)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.address)
        .bind(account.preferred_contact.to_string())
        .bind(account.role.to_string())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Account, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT account_id, firstname, lastname, email, phone, address,
                   preferred_contact, role, created_at, updated_at
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(format!("Account {}", id)),
            _ => RepositoryError::DatabaseError(e),
        })?;

        row_to_account(&row)
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT account_id, firstname, lastname, email, phone, address,
                   preferred_contact, role, created_at, updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(format!("Account {}", email)),
            _ => RepositoryError::DatabaseError(e),
        })?;

        row_to_account(&row)
    }

    async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT account_id, firstname, lastname, email, phone, address,
                   preferred_contact, role, created_at, updated_at
            FROM accounts
            ORDER BY account_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_account).collect()
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT account_id, firstname, lastname, email, phone, address,
                   preferred_contact, role, created_at, updated_at
            FROM accounts
            WHERE role = $1
            ORDER BY account_id
            "#,
        )
        .bind(role.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_account).collect()
    }

    async fn update(&self, account: &Account) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET firstname = $1, lastname = $2, email = $3, phone = $4, address = $5,
                preferred_contact = $6, updated_at = $7
            WHERE account_id = $8
            "#,
        )
        .bind(&account.firstname)
        .bind(&account.lastname)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.address)
        .bind(account.preferred_contact.to_string())
        .bind(Utc::now())
        .bind(&account.account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET role = $1, updated_at = $2
            WHERE account_id = $3
            "#,
        )
        .bind(role.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM accounts WHERE account_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT account_id FROM accounts")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn count_created_between(
        &self,
        role: Role,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM accounts
            WHERE role = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(role.to_string())
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<Account, RepositoryError> {
    let contact_str: String = row.try_get("preferred_contact")?;
    let role_str: String = row.try_get("role")?;

    Ok(Account {
        account_id: row.try_get("account_id")?,
        firstname: row.try_get("firstname")?,
        lastname: row.try_get("lastname")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        preferred_contact: ContactMethod::from_str(&contact_str).map_err(|_| {
            RepositoryError::InvalidData(format!("Unknown contact method: {}", contact_str))
        })?,
        role: Role::from_str(&role_str)
            .map_err(|_| RepositoryError::InvalidData(format!("Unknown role: {}", role_str)))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub struct PostgresCredentialRepository {
    pool: PgPool,
}

impl PostgresCredentialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialRepository for PostgresCredentialRepository {
    async fn create(&self, credential: &Credential) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (account_id, password_hash, last_changed, is_active)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&credential.account_id)
        .bind(&credential.password_hash)
        .bind(credential.last_changed)
        .bind(credential.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_account(&self, account_id: &str) -> Result<Credential, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT account_id, password_hash, last_changed, is_active
            FROM credentials
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                RepositoryError::NotFound(format!("Credential for {}", account_id))
            }
            _ => RepositoryError::DatabaseError(e),
        })?;

        Ok(Credential {
            account_id: row.try_get("account_id")?,
            password_hash: row.try_get("password_hash")?,
            last_changed: row.try_get("last_changed")?,
            is_active: row.try_get("is_active")?,
        })
    }

    async fn update(&self, credential: &Credential) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE credentials
            SET password_hash = $1, last_changed = $2, is_active = $3
            WHERE account_id = $4
            "#,
        )
        .bind(&credential.password_hash)
        .bind(credential.last_changed)
        .bind(credential.is_active)
        .bind(&credential.account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_by_account(&self, account_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM credentials WHERE account_id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

pub struct PostgresInstructorProfileRepository {
    pool: PgPool,
}

impl PostgresInstructorProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstructorProfileRepository for PostgresInstructorProfileRepository {
    async fn create(&self, profile: &InstructorProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO instructor_profiles (account_id, specialties, hire_date, is_active)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&profile.account_id)
        .bind(&profile.specialties)
        .bind(profile.hire_date)
        .bind(profile.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_account(&self, account_id: &str) -> Result<InstructorProfile, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT account_id, specialties, hire_date, is_active
            FROM instructor_profiles
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                RepositoryError::NotFound(format!("Instructor profile for {}", account_id))
            }
            _ => RepositoryError::DatabaseError(e),
        })?;

        Ok(InstructorProfile {
            account_id: row.try_get("account_id")?,
            specialties: row.try_get("specialties")?,
            hire_date: row.try_get("hire_date")?,
            is_active: row.try_get("is_active")?,
        })
    }

    async fn delete_by_account(&self, account_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM instructor_profiles WHERE account_id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

pub struct PostgresManagerProfileRepository {
    pool: PgPool,
}

impl PostgresManagerProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ManagerProfileRepository for PostgresManagerProfileRepository {
    async fn create(&self, profile: &ManagerProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO manager_profiles (account_id, department, is_active)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&profile.account_id)
        .bind(&profile.department)
        .bind(profile.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_account(&self, account_id: &str) -> Result<ManagerProfile, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT account_id, department, is_active
            FROM manager_profiles
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                RepositoryError::NotFound(format!("Manager profile for {}", account_id))
            }
            _ => RepositoryError::DatabaseError(e),
        })?;

        Ok(ManagerProfile {
            account_id: row.try_get("account_id")?,
            department: row.try_get("department")?,
            is_active: row.try_get("is_active")?,
        })
    }

    async fn delete_by_account(&self, account_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM manager_profiles WHERE account_id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

pub struct PostgresPassDefinitionRepository {
    pool: PgPool,
}

impl PostgresPassDefinitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PassDefinitionRepository for PostgresPassDefinitionRepository {
    async fn create(&self, definition: &PassDefinition) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO pass_definitions (pass_id, name, description, duration, sessions, price,
                                          is_active, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&definition.pass_id)
        .bind(&definition.name)
        .bind(&definition.description)
        .bind(Json(definition.duration))
        .bind(definition.sessions)
        .bind(definition.price)
        .bind(definition.is_active)
        .bind(&definition.created_by)
        .bind(definition.created_at)
        .bind(definition.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<PassDefinition, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT pass_id, name, description, duration, sessions, price,
                   is_active, created_by, created_at, updated_at
            FROM pass_definitions
            WHERE pass_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(format!("Pass {}", id)),
            _ => RepositoryError::DatabaseError(e),
        })?;

        row_to_pass_definition(&row)
    }

    async fn list(&self) -> Result<Vec<PassDefinition>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT pass_id, name, description, duration, sessions, price,
                   is_active, created_by, created_at, updated_at
            FROM pass_definitions
            ORDER BY pass_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_pass_definition).collect()
    }

    async fn list_active(&self) -> Result<Vec<PassDefinition>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT pass_id, name, description, duration, sessions, price,
                   is_active, created_by, created_at, updated_at
            FROM pass_definitions
            WHERE is_active = TRUE
            ORDER BY pass_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_pass_definition).collect()
    }

    async fn update(&self, definition: &PassDefinition) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE pass_definitions
            SET name = $1, description = $2, duration = $3, sessions = $4, price = $5,
                is_active = $6, updated_at = $7
            WHERE pass_id = $8
            "#,
        )
        .bind(&definition.name)
        .bind(&definition.description)
        .bind(Json(definition.duration))
        .bind(definition.sessions)
        .bind(definition.price)
        .bind(definition.is_active)
        .bind(Utc::now())
        .bind(&definition.pass_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT pass_id FROM pass_definitions")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}

fn row_to_pass_definition(row: &sqlx::postgres::PgRow) -> Result<PassDefinition, RepositoryError> {
    let duration: Json<PassDuration> = row.try_get("duration")?;

    Ok(PassDefinition {
        pass_id: row.try_get("pass_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        duration: duration.0,
        sessions: row.try_get("sessions")?,
        price: row.try_get("price")?,
        is_active: row.try_get("is_active")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub struct PostgresOwnedPassRepository {
    pool: PgPool,
}

impl PostgresOwnedPassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OwnedPassRepository for PostgresOwnedPassRepository {
    async fn create(&self, pass: &OwnedPass) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO owned_passes (owned_pass_id, account_id, pass_id, purchase_date,
                                      start_date, expiration_date, sessions_remaining,
                                      total_sessions, is_active, purchase_price,
                                      payment_method, payment_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&pass.owned_pass_id)
        .bind(&pass.account_id)
        .bind(&pass.pass_id)
        .bind(pass.purchase_date)
        .bind(pass.start_date)
        .bind(pass.expiration_date)
        .bind(pass.sessions_remaining)
        .bind(pass.total_sessions)
        .bind(pass.is_active)
        .bind(pass.purchase_price)
        .bind(pass.payment_method.to_string())
        .bind(pass.payment_status.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<OwnedPass, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT owned_pass_id, account_id, pass_id, purchase_date, start_date,
                   expiration_date, sessions_remaining, total_sessions, is_active,
                   purchase_price, payment_method, payment_status
            FROM owned_passes
            WHERE owned_pass_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(format!("Owned pass {}", id)),
            _ => RepositoryError::DatabaseError(e),
        })?;

        row_to_owned_pass(&row)
    }

    async fn list_by_account(&self, account_id: &str) -> Result<Vec<OwnedPass>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT owned_pass_id, account_id, pass_id, purchase_date, start_date,
                   expiration_date, sessions_remaining, total_sessions, is_active,
                   purchase_price, payment_method, payment_status
            FROM owned_passes
            WHERE account_id = $1
            ORDER BY purchase_date DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_owned_pass).collect()
    }

    async fn update(&self, pass: &OwnedPass) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE owned_passes
            SET sessions_remaining = $1, is_active = $2, payment_status = $3,
                expiration_date = $4
            WHERE owned_pass_id = $5
            "#,
        )
        .bind(pass.sessions_remaining)
        .bind(pass.is_active)
        .bind(pass.payment_status.to_string())
        .bind(pass.expiration_date)
        .bind(&pass.owned_pass_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT owned_pass_id FROM owned_passes")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn sales_summary_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(i64, f64), RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS sale_count,
                   COALESCE(SUM(purchase_price), 0) AS revenue
            FROM owned_passes
            WHERE payment_status = 'completed'
              AND purchase_date >= $1 AND purchase_date < $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let sale_count: i64 = row.try_get("sale_count")?;
        let revenue: f64 = row.try_get("revenue")?;

        Ok((sale_count, revenue))
    }
}

fn row_to_owned_pass(row: &sqlx::postgres::PgRow) -> Result<OwnedPass, RepositoryError> {
    let method_str: String = row.try_get("payment_method")?;
    let status_str: String = row.try_get("payment_status")?;

    Ok(OwnedPass {
        owned_pass_id: row.try_get("owned_pass_id")?,
        account_id: row.try_get("account_id")?,
        pass_id: row.try_get("pass_id")?,
        purchase_date: row.try_get("purchase_date")?,
        start_date: row.try_get("start_date")?,
        expiration_date: row.try_get("expiration_date")?,
        sessions_remaining: row.try_get("sessions_remaining")?,
        total_sessions: row.try_get("total_sessions")?,
        is_active: row.try_get("is_active")?,
        purchase_price: row.try_get("purchase_price")?,
        payment_method: PaymentMethod::from_str(&method_str).map_err(|_| {
            RepositoryError::InvalidData(format!("Unknown payment method: {}", method_str))
        })?,
        payment_status: PaymentStatus::from_str(&status_str).map_err(|_| {
            RepositoryError::InvalidData(format!("Unknown payment status: {}", status_str))
        })?,
    })
}

pub struct PostgresClassRepository {
    pool: PgPool,
}

impl PostgresClassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClassRepository for PostgresClassRepository {
    async fn create(&self, class: &ClassOffering) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO classes (class_id, name, class_type, description, instructor_id,
                                 slots, capacity, roster, attendance, is_active,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&class.class_id)
        .bind(&class.name)
        .bind(&class.class_type)
        .bind(&class.description)
        .bind(&class.instructor_id)
        .bind(Json(&class.slots))
        .bind(class.capacity)
        .bind(Json(&class.roster))
        .bind(Json(&class.attendance))
        .bind(class.is_active)
        .bind(class.created_at)
        .bind(class.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<ClassOffering, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT class_id, name, class_type, description, instructor_id, slots,
                   capacity, roster, attendance, is_active, created_at, updated_at
            FROM classes
            WHERE class_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(format!("Class {}", id)),
            _ => RepositoryError::DatabaseError(e),
        })?;

        row_to_class(&row)
    }

    async fn list(&self) -> Result<Vec<ClassOffering>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT class_id, name, class_type, description, instructor_id, slots,
                   capacity, roster, attendance, is_active, created_at, updated_at
            FROM classes
            ORDER BY class_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_class).collect()
    }

    async fn list_active(&self) -> Result<Vec<ClassOffering>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT class_id, name, class_type, description, instructor_id, slots,
                   capacity, roster, attendance, is_active, created_at, updated_at
            FROM classes
            WHERE is_active = TRUE
            ORDER BY class_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_class).collect()
    }

    async fn list_by_instructor(
        &self,
        instructor_id: &str,
    ) -> Result<Vec<ClassOffering>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT class_id, name, class_type, description, instructor_id, slots,
                   capacity, roster, attendance, is_active, created_at, updated_at
            FROM classes
            WHERE instructor_id = $1
            ORDER BY class_id
            "#,
        )
        .bind(instructor_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_class).collect()
    }

    async fn save(&self, class: &ClassOffering) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE classes
            SET name = $1, class_type = $2, description = $3, instructor_id = $4,
                slots = $5, capacity = $6, roster = $7, attendance = $8,
                is_active = $9, updated_at = $10
            WHERE class_id = $11
            "#,
        )
        .bind(&class.name)
        .bind(&class.class_type)
        .bind(&class.description)
        .bind(&class.instructor_id)
        .bind(Json(&class.slots))
        .bind(class.capacity)
        .bind(Json(&class.roster))
        .bind(Json(&class.attendance))
        .bind(class.is_active)
        .bind(Utc::now())
        .bind(&class.class_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn all_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT class_id FROM classes")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}

fn row_to_class(row: &sqlx::postgres::PgRow) -> Result<ClassOffering, RepositoryError> {
    let slots: Json<Vec<Slot>> = row.try_get("slots")?;
    let roster: Json<Vec<Registration>> = row.try_get("roster")?;
    let attendance: Json<Vec<AttendanceRecord>> = row.try_get("attendance")?;

    Ok(ClassOffering {
        class_id: row.try_get("class_id")?,
        name: row.try_get("name")?,
        class_type: row.try_get("class_type")?,
        description: row.try_get("description")?,
        instructor_id: row.try_get("instructor_id")?,
        slots: slots.0,
        capacity: row.try_get("capacity")?,
        roster: roster.0,
        attendance: attendance.0,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
