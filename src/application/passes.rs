use crate::domain::{IdKind, OwnedPass, PassDefinition, PassDuration, PaymentMethod};
use crate::infrastructure::{OwnedPassRepository, PassDefinitionRepository, RepositoryError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PassError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Pass not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone)]
pub struct NewPassDefinition {
    pub name: String,
    pub description: Option<String>,
    pub duration: PassDuration,
    pub sessions: i32,
    pub price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePassDefinition {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub duration: Option<PassDuration>,
    pub sessions: Option<i32>,
    pub price: Option<f64>,
}

pub struct PassService<PD, OP>
where
    PD: PassDefinitionRepository,
    OP: OwnedPassRepository,
{
    definition_repo: Arc<PD>,
    owned_pass_repo: Arc<OP>,
}

impl<PD, OP> PassService<PD, OP>
where
    PD: PassDefinitionRepository,
    OP: OwnedPassRepository,
{
    pub fn new(definition_repo: Arc<PD>, owned_pass_repo: Arc<OP>) -> Self {
        Self {
            definition_repo,
            owned_pass_repo,
        }
    }

    pub async fn create_definition(
        &self,
        request: NewPassDefinition,
        created_by: &str,
    ) -> Result<PassDefinition, PassError> {
        validate_definition_fields(&request.name, request.duration, request.sessions, request.price)?;

        let ids = self.definition_repo.all_ids().await?;
        let pass_id = IdKind::Pass.next(IdKind::Pass.max_sequence(ids.iter().map(String::as_str)));

        let definition = PassDefinition::new(
            pass_id,
            request.name,
            request.description,
            request.duration,
            request.sessions,
            request.price,
            created_by.to_string(),
        );
        self.definition_repo.create(&definition).await?;

        info!("Created pass definition {} ({})", definition.pass_id, definition.name);
        Ok(definition)
    }

    pub async fn update_definition(
        &self,
        id: &str,
        update: UpdatePassDefinition,
    ) -> Result<PassDefinition, PassError> {
        let mut definition = self.get_definition(id).await?;

        if let Some(v) = update.name {
            definition.name = v;
        }
        if let Some(v) = update.description {
            definition.description = v;
        }
        if let Some(v) = update.duration {
            definition.duration = v;
        }
        if let Some(v) = update.sessions {
            definition.sessions = v;
        }
        if let Some(v) = update.price {
            definition.price = v;
        }
        validate_definition_fields(
            &definition.name,
            definition.duration,
            definition.sessions,
            definition.price,
        )?;
        definition.updated_at = Utc::now();

        self.definition_repo.update(&definition).await?;
        Ok(definition)
    }

    /// Definitions are never removed once sold; delete deactivates, which
    /// hides them from the purchasable list but keeps owned passes resolvable.
    pub async fn deactivate_definition(&self, id: &str) -> Result<(), PassError> {
        let mut definition = self.get_definition(id).await?;
        definition.is_active = false;
        definition.updated_at = Utc::now();
        self.definition_repo.update(&definition).await?;

        info!("Deactivated pass definition {}", id);
        Ok(())
    }

    pub async fn get_definition(&self, id: &str) -> Result<PassDefinition, PassError> {
        self.definition_repo
            .get_by_id(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => PassError::NotFound(id.to_string()),
                _ => e.into(),
            })
    }

    pub async fn list_definitions(&self) -> Result<Vec<PassDefinition>, PassError> {
        Ok(self.definition_repo.list().await?)
    }

    pub async fn list_active_definitions(&self) -> Result<Vec<PassDefinition>, PassError> {
        Ok(self.definition_repo.list_active().await?)
    }

    /// Purchase a pass. Payment is mock-approved on the spot; there is no
    /// gateway and no idempotency key, a double submit buys two passes.
    pub async fn purchase(
        &self,
        account_id: &str,
        pass_id: &str,
        payment_method: PaymentMethod,
    ) -> Result<OwnedPass, PassError> {
        let definition = self.get_definition(pass_id).await?;
        if !definition.is_active {
            return Err(PassError::NotFound(pass_id.to_string()));
        }

        let ids = self.owned_pass_repo.all_ids().await?;
        let owned_pass_id =
            IdKind::OwnedPass.next(IdKind::OwnedPass.max_sequence(ids.iter().map(String::as_str)));

        let owned = OwnedPass::purchase(
            owned_pass_id,
            account_id.to_string(),
            &definition,
            payment_method,
            Utc::now(),
        );
        self.owned_pass_repo.create(&owned).await?;

        info!(
            "Account {} purchased {} as {} ({} sessions)",
            account_id, pass_id, owned.owned_pass_id, owned.total_sessions
        );
        Ok(owned)
    }

    pub async fn get_owned_pass(&self, id: &str) -> Result<OwnedPass, PassError> {
        self.owned_pass_repo
            .get_by_id(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => PassError::NotFound(id.to_string()),
                _ => e.into(),
            })
    }

    pub async fn owned_passes(&self, account_id: &str) -> Result<Vec<OwnedPass>, PassError> {
        Ok(self.owned_pass_repo.list_by_account(account_id).await?)
    }

    /// Active, unexpired passes with sessions left.
    pub async fn active_passes(&self, account_id: &str) -> Result<Vec<OwnedPass>, PassError> {
        let now = Utc::now();
        let passes = self.owned_pass_repo.list_by_account(account_id).await?;
        Ok(passes.into_iter().filter(|p| p.is_usable(now)).collect())
    }

    pub async fn has_valid_pass(&self, account_id: &str) -> Result<bool, PassError> {
        Ok(!self.active_passes(account_id).await?.is_empty())
    }
}

fn validate_definition_fields(
    name: &str,
    duration: PassDuration,
    sessions: i32,
    price: f64,
) -> Result<(), PassError> {
    if name.trim().is_empty() {
        return Err(PassError::Validation("pass name is required".into()));
    }
    if duration.value == 0 {
        return Err(PassError::Validation("duration must be positive".into()));
    }
    if sessions <= 0 {
        return Err(PassError::Validation(
            "session count must be positive".into(),
        ));
    }
    if price < 0.0 {
        return Err(PassError::Validation("price cannot be negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DurationUnit;
    use crate::infrastructure::{MockOwnedPassRepository, MockPassDefinitionRepository};

    fn monthly_definition(active: bool) -> PassDefinition {
        let mut definition = PassDefinition::new(
            "P00001".into(),
            "Monthly 10".into(),
            None,
            PassDuration {
                value: 1,
                unit: DurationUnit::Months,
            },
            10,
            120.0,
            "M00001".into(),
        );
        definition.is_active = active;
        definition
    }

    #[tokio::test]
    async fn purchase_of_inactive_definition_is_not_found() {
        let mut definitions = MockPassDefinitionRepository::new();
        definitions
            .expect_get_by_id()
            .returning(|_| Ok(monthly_definition(false)));

        let svc = PassService::new(Arc::new(definitions), Arc::new(MockOwnedPassRepository::new()));
        let err = svc
            .purchase("U00001", "P00001", PaymentMethod::Mock)
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::NotFound(_)));
    }

    #[tokio::test]
    async fn purchase_issues_sequential_owned_pass_ids() {
        let mut definitions = MockPassDefinitionRepository::new();
        definitions
            .expect_get_by_id()
            .returning(|_| Ok(monthly_definition(true)));
        let mut owned = MockOwnedPassRepository::new();
        owned
            .expect_all_ids()
            .returning(|| Ok(vec!["UP00001".into(), "UP00003".into()]));
        owned.expect_create().returning(|_| Ok(()));

        let svc = PassService::new(Arc::new(definitions), Arc::new(owned));
        let pass = svc
            .purchase("U00001", "P00001", PaymentMethod::CreditCard)
            .await
            .unwrap();
        assert_eq!(pass.owned_pass_id, "UP00004");
        assert_eq!(pass.sessions_remaining, 10);
        assert_eq!(pass.total_sessions, 10);
        assert_eq!(pass.purchase_price, 120.0);
    }

    #[tokio::test]
    async fn definition_validation_rejects_zero_sessions() {
        let svc = PassService::new(
            Arc::new(MockPassDefinitionRepository::new()),
            Arc::new(MockOwnedPassRepository::new()),
        );
        let err = svc
            .create_definition(
                NewPassDefinition {
                    name: "Broken".into(),
                    description: None,
                    duration: PassDuration {
                        value: 1,
                        unit: DurationUnit::Months,
                    },
                    sessions: 0,
                    price: 50.0,
                },
                "M00001",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::Validation(_)));
    }
}
