use crate::application::{AccountService, ClassService, PassService, ReportService};
use crate::infrastructure::{
    AppConfig, PostgresAccountRepository, PostgresClassRepository, PostgresCredentialRepository,
    PostgresInstructorProfileRepository, PostgresManagerProfileRepository,
    PostgresOwnedPassRepository, PostgresPassDefinitionRepository,
};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

pub type AccountServiceType = AccountService<
    PostgresAccountRepository,
    PostgresCredentialRepository,
    PostgresInstructorProfileRepository,
    PostgresManagerProfileRepository,
>;

pub type ClassServiceType =
    ClassService<PostgresClassRepository, PostgresOwnedPassRepository, PostgresAccountRepository>;

pub type PassServiceType =
    PassService<PostgresPassDefinitionRepository, PostgresOwnedPassRepository>;

pub type ReportServiceType = ReportService<
    PostgresAccountRepository,
    PostgresOwnedPassRepository,
    PostgresClassRepository,
>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub accounts: Arc<AccountServiceType>,
    pub classes: Arc<ClassServiceType>,
    pub passes: Arc<PassServiceType>,
    pub reports: Arc<ReportServiceType>,
}

/// Build full state from config + an existing pool.
///
/// Intended for embedding into a larger service that already manages a `PgPool`.
pub async fn build_state_with_pool(
    config: AppConfig,
    pool: PgPool,
    run_migrations: bool,
) -> anyhow::Result<AppState> {
    if run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
    }

    let account_repo = Arc::new(PostgresAccountRepository::new(pool.clone()));
    let credential_repo = Arc::new(PostgresCredentialRepository::new(pool.clone()));
    let instructor_repo = Arc::new(PostgresInstructorProfileRepository::new(pool.clone()));
    let manager_repo = Arc::new(PostgresManagerProfileRepository::new(pool.clone()));
    let definition_repo = Arc::new(PostgresPassDefinitionRepository::new(pool.clone()));
    let owned_pass_repo = Arc::new(PostgresOwnedPassRepository::new(pool.clone()));
    let class_repo = Arc::new(PostgresClassRepository::new(pool.clone()));

    let accounts = Arc::new(AccountService::new(
        account_repo.clone(),
        credential_repo,
        instructor_repo,
        manager_repo,
        config.jwt_secret.clone(),
        config.token_ttl_minutes,
    ));
    let classes = Arc::new(ClassService::new(
        class_repo.clone(),
        owned_pass_repo.clone(),
        account_repo.clone(),
    ));
    let passes = Arc::new(PassService::new(definition_repo, owned_pass_repo.clone()));
    let reports = Arc::new(ReportService::new(account_repo, owned_pass_repo, class_repo));

    Ok(AppState {
        pool,
        config,
        accounts,
        classes,
        passes,
        reports,
    })
}

/// Build state for the standalone server.
///
/// Creates the `PgPool`, runs migrations, and wires repositories/services.
pub async fn build_state_from_env(config: AppConfig) -> anyhow::Result<AppState> {
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("connect database")?;
    build_state_with_pool(config, pool, true).await
}
