use crate::domain::{ContactMethod, Day, DurationUnit, PaymentMethod, Role};
use std::str::FromStr;

pub(super) fn parse_role(role: &str) -> Option<Role> {
    Role::from_str(role).ok()
}

pub(super) fn parse_contact_method(method: &str) -> Option<ContactMethod> {
    ContactMethod::from_str(method).ok()
}

pub(super) fn parse_day(day: &str) -> Option<Day> {
    Day::from_str(day).ok()
}

pub(super) fn parse_duration_unit(unit: &str) -> Option<DurationUnit> {
    DurationUnit::from_str(unit).ok()
}

pub(super) fn parse_payment_method(method: &str) -> Option<PaymentMethod> {
    PaymentMethod::from_str(method).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_strings_map_to_enums() {
        assert_eq!(parse_role("instructor"), Some(Role::Instructor));
        assert_eq!(parse_contact_method("phone"), Some(ContactMethod::Phone));
        assert_eq!(parse_day("wednesday"), Some(Day::Wednesday));
        assert_eq!(parse_duration_unit("months"), Some(DurationUnit::Months));
        assert_eq!(parse_payment_method("credit_card"), Some(PaymentMethod::CreditCard));
    }

    #[test]
    fn parse_invalid_inputs_return_none() {
        assert!(parse_role("admin").is_none());
        assert!(parse_contact_method("fax").is_none());
        assert!(parse_day("someday").is_none());
        assert!(parse_duration_unit("decades").is_none());
        assert!(parse_payment_method("barter").is_none());
    }
}
