use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DurationUnit {
    Days,
    Weeks,
    Months,
    Years,
}

/// Validity window of a pass, e.g. `{value: 1, unit: months}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassDuration {
    pub value: u32,
    pub unit: DurationUnit,
}

impl PassDuration {
    /// Unit conversion for expiration arithmetic. Months and years are
    /// deliberately approximate (30/365 days), not calendar-accurate.
    pub fn in_days(self) -> i64 {
        let factor = match self.unit {
            DurationUnit::Days => 1,
            DurationUnit::Weeks => 7,
            DurationUnit::Months => 30,
            DurationUnit::Years => 365,
        };
        i64::from(self.value) * factor
    }
}

/// A purchasable membership product. Delete is always a deactivation; once a
/// definition has been sold it must survive for the owned passes that
/// reference it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassDefinition {
    pub pass_id: String,
    pub name: String,
    pub description: Option<String>,
    pub duration: PassDuration,
    pub sessions: i32,
    pub price: f64,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PassDefinition {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pass_id: String,
        name: String,
        description: Option<String>,
        duration: PassDuration,
        sessions: i32,
        price: f64,
        created_by: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            pass_id,
            name,
            description,
            duration,
            sessions,
            price,
            is_active: true,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    Cash,
    Mock,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// A purchased instance of a [`PassDefinition`], carrying its own session
/// counters and expiration. `sessions_remaining` only ever decreases; the
/// pass deactivates itself when it hits zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnedPass {
    pub owned_pass_id: String,
    pub account_id: String,
    pub pass_id: String,
    pub purchase_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub sessions_remaining: i32,
    pub total_sessions: i32,
    pub is_active: bool,
    pub purchase_price: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
}

impl OwnedPass {
    /// Build the purchase record for a definition. Payment is always
    /// mock-approved; there is no gateway behind this.
    pub fn purchase(
        owned_pass_id: String,
        account_id: String,
        definition: &PassDefinition,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            owned_pass_id,
            account_id,
            pass_id: definition.pass_id.clone(),
            purchase_date: now,
            start_date: now,
            expiration_date: now + Duration::days(definition.duration.in_days()),
            sessions_remaining: definition.sessions,
            total_sessions: definition.sessions,
            is_active: true,
            purchase_price: definition.price,
            payment_method,
            payment_status: PaymentStatus::Completed,
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expiration_date > now && self.sessions_remaining > 0
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration_date
    }

    /// Consume one session. Returns `false` (and changes nothing) when no
    /// sessions remain.
    pub fn debit_session(&mut self) -> bool {
        if self.sessions_remaining <= 0 {
            return false;
        }
        self.sessions_remaining -= 1;
        if self.sessions_remaining == 0 {
            self.is_active = false;
        }
        true
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expiration_date - now).num_days().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn definition(sessions: i32, duration: PassDuration) -> PassDefinition {
        PassDefinition::new(
            "P00001".into(),
            "Monthly 10".into(),
            None,
            duration,
            sessions,
            120.0,
            "M00001".into(),
        )
    }

    #[test]
    fn duration_conversion_uses_fixed_factors() {
        let d = |value, unit| PassDuration { value, unit }.in_days();
        assert_eq!(d(10, DurationUnit::Days), 10);
        assert_eq!(d(2, DurationUnit::Weeks), 14);
        assert_eq!(d(1, DurationUnit::Months), 30);
        assert_eq!(d(2, DurationUnit::Years), 730);
    }

    #[test]
    fn purchase_copies_session_counts_and_price() {
        let def = definition(
            10,
            PassDuration {
                value: 1,
                unit: DurationUnit::Months,
            },
        );
        let owned = OwnedPass::purchase(
            "UP00001".into(),
            "U00001".into(),
            &def,
            PaymentMethod::Mock,
            Utc::now(),
        );
        assert_eq!(owned.sessions_remaining, 10);
        assert_eq!(owned.total_sessions, 10);
        assert_eq!(owned.purchase_price, 120.0);
        assert_eq!(owned.payment_status, PaymentStatus::Completed);
        assert!(owned.is_active);
    }

    #[test]
    fn one_month_purchase_expires_exactly_thirty_days_out() {
        let day = Utc.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap();
        let def = definition(
            5,
            PassDuration {
                value: 1,
                unit: DurationUnit::Months,
            },
        );
        let owned = OwnedPass::purchase(
            "UP00001".into(),
            "U00001".into(),
            &def,
            PaymentMethod::Mock,
            day,
        );
        assert_eq!(owned.expiration_date - owned.start_date, Duration::days(30));
        assert_eq!(
            owned.expiration_date,
            Utc.with_ymd_and_hms(2025, 4, 14, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn debit_decrements_and_deactivates_at_zero() {
        let def = definition(
            1,
            PassDuration {
                value: 1,
                unit: DurationUnit::Weeks,
            },
        );
        let mut owned = OwnedPass::purchase(
            "UP00001".into(),
            "U00001".into(),
            &def,
            PaymentMethod::Cash,
            Utc::now(),
        );
        assert!(owned.debit_session());
        assert_eq!(owned.sessions_remaining, 0);
        assert!(!owned.is_active);
        // Further debits refuse without going negative.
        assert!(!owned.debit_session());
        assert_eq!(owned.sessions_remaining, 0);
    }

    #[test]
    fn usability_requires_active_unexpired_and_sessions() {
        let now = Utc::now();
        let def = definition(
            2,
            PassDuration {
                value: 10,
                unit: DurationUnit::Days,
            },
        );
        let mut owned =
            OwnedPass::purchase("UP00001".into(), "U00001".into(), &def, PaymentMethod::Mock, now);
        assert!(owned.is_usable(now));
        assert!(!owned.is_usable(now + Duration::days(11)));
        owned.is_active = false;
        assert!(!owned.is_usable(now));
    }
}
