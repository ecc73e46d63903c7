use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

pub const DEFAULT_CAPACITY: i32 = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// One recurring (day, time, duration) entry in a class schedule. Times are
/// studio-local `"HH:MM"` strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub day: Day,
    pub time: String,
    pub duration_minutes: i32,
}

impl Slot {
    /// Two slots collide when they share the exact (day, time) pair.
    pub fn collides_with(&self, other: &Slot) -> bool {
        self.day == other.day && self.time == other.time
    }
}

/// Roster entry: who registered and which owned pass backs the booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registration {
    pub account_id: String,
    pub owned_pass_id: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attendee {
    pub account_id: String,
    pub owned_pass_id: String,
    pub checked_in_at: DateTime<Utc>,
}

/// Per-date attendance snapshot embedded in the class document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub attendees: Vec<Attendee>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RosterError {
    #[error("account is already registered for this class")]
    AlreadyRegistered,
    #[error("class is at full capacity")]
    Full,
}

/// A scheduled class offering. The roster and attendance history live inside
/// the record (JSONB in storage) and the whole document is saved at once —
/// there is no join-time relation for either.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassOffering {
    pub class_id: String,
    pub name: String,
    pub class_type: String,
    pub description: Option<String>,
    pub instructor_id: String,
    pub slots: Vec<Slot>,
    pub capacity: i32,
    pub roster: Vec<Registration>,
    pub attendance: Vec<AttendanceRecord>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassOffering {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        class_id: String,
        name: String,
        class_type: String,
        description: Option<String>,
        instructor_id: String,
        slots: Vec<Slot>,
        capacity: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            class_id,
            name,
            class_type,
            description,
            instructor_id,
            slots,
            capacity,
            roster: Vec::new(),
            attendance: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_registered(&self, account_id: &str) -> bool {
        self.roster.iter().any(|r| r.account_id == account_id)
    }

    pub fn registration_for(&self, account_id: &str) -> Option<&Registration> {
        self.roster.iter().find(|r| r.account_id == account_id)
    }

    /// Append a roster entry, enforcing uniqueness and capacity. Does not
    /// debit a session — that happens at attendance time.
    pub fn add_registration(
        &mut self,
        account_id: String,
        owned_pass_id: String,
    ) -> Result<(), RosterError> {
        if self.is_registered(&account_id) {
            return Err(RosterError::AlreadyRegistered);
        }
        if self.roster.len() as i32 >= self.capacity {
            return Err(RosterError::Full);
        }
        self.roster.push(Registration {
            account_id,
            owned_pass_id,
            registered_at: Utc::now(),
        });
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn remove_registration(&mut self, account_id: &str) {
        self.roster.retain(|r| r.account_id != account_id);
        self.updated_at = Utc::now();
    }

    /// Record attendance for a date. A re-submission REPLACES the previous
    /// attendee list for that date; sessions debited by an earlier marking
    /// are not refunded.
    pub fn record_attendance(&mut self, date: NaiveDate, attendees: Vec<Attendee>) {
        match self.attendance.iter_mut().find(|r| r.date == date) {
            Some(record) => record.attendees = attendees,
            None => self.attendance.push(AttendanceRecord { date, attendees }),
        }
        self.updated_at = Utc::now();
    }

    pub fn attendance_for(&self, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.attendance.iter().find(|r| r.date == date)
    }

    /// First slot of this class colliding with any of `candidate` slots.
    pub fn conflicting_slot(&self, candidates: &[Slot]) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|s| candidates.iter().any(|c| s.collides_with(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendee(account_id: &str) -> Attendee {
        Attendee {
            account_id: account_id.into(),
            owned_pass_id: "UP00001".into(),
            checked_in_at: Utc::now(),
        }
    }

    fn offering(capacity: i32) -> ClassOffering {
        ClassOffering::new(
            "C00001".into(),
            "Morning Flow".into(),
            "vinyasa".into(),
            None,
            "I00001".into(),
            vec![Slot {
                day: Day::Monday,
                time: "09:00".into(),
                duration_minutes: 60,
            }],
            capacity,
        )
    }

    #[test]
    fn registration_grows_roster_by_one() {
        let mut class = offering(20);
        class
            .add_registration("U00001".into(), "UP00001".into())
            .unwrap();
        assert_eq!(class.roster.len(), 1);
        assert!(class.is_registered("U00001"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut class = offering(20);
        class
            .add_registration("U00001".into(), "UP00001".into())
            .unwrap();
        let err = class
            .add_registration("U00001".into(), "UP00002".into())
            .unwrap_err();
        assert_eq!(err, RosterError::AlreadyRegistered);
        assert_eq!(class.roster.len(), 1);
    }

    #[test]
    fn roster_never_exceeds_capacity() {
        let mut class = offering(2);
        class
            .add_registration("U00001".into(), "UP00001".into())
            .unwrap();
        class
            .add_registration("U00002".into(), "UP00002".into())
            .unwrap();
        let err = class
            .add_registration("U00003".into(), "UP00003".into())
            .unwrap_err();
        assert_eq!(err, RosterError::Full);
        assert_eq!(class.roster.len(), 2);
    }

    #[test]
    fn remarking_a_date_replaces_the_attendee_list() {
        let mut class = offering(20);
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        class.record_attendance(date, vec![attendee("U00001"), attendee("U00002")]);
        class.record_attendance(date, vec![attendee("U00003")]);

        let record = class.attendance_for(date).unwrap();
        assert_eq!(record.attendees.len(), 1);
        assert_eq!(record.attendees[0].account_id, "U00003");
        assert_eq!(class.attendance.len(), 1);
    }

    #[test]
    fn attendance_records_are_kept_per_date() {
        let mut class = offering(20);
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        class.record_attendance(monday, vec![attendee("U00001")]);
        class.record_attendance(wednesday, vec![attendee("U00001")]);
        assert_eq!(class.attendance.len(), 2);
        assert!(class.attendance_for(monday).is_some());
        assert!(class
            .attendance_for(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap())
            .is_none());
    }

    #[test]
    fn slot_conflicts_require_same_day_and_time() {
        let class = offering(20);
        let same = vec![Slot {
            day: Day::Monday,
            time: "09:00".into(),
            duration_minutes: 90,
        }];
        let different_time = vec![Slot {
            day: Day::Monday,
            time: "10:00".into(),
            duration_minutes: 60,
        }];
        assert!(class.conflicting_slot(&same).is_some());
        assert!(class.conflicting_slot(&different_time).is_none());
    }
}
