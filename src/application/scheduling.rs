use crate::domain::{
    Attendee, ClassOffering, IdKind, Role, RosterError, Slot, DEFAULT_CAPACITY,
};
use crate::infrastructure::{
    AccountRepository, ClassRepository, OwnedPassRepository, RepositoryError,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Payload carried on a 409 so the caller can pick another time.
#[derive(Debug, Clone, Serialize)]
pub struct SlotConflict {
    pub class_id: String,
    pub class_name: String,
    pub slot: Slot,
    pub alternative_times: Vec<String>,
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Class not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Instructor {instructor_id} already teaches {} at that time", conflict.class_name)]
    Conflict {
        instructor_id: String,
        conflict: Box<SlotConflict>,
    },
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub class_type: String,
    pub description: Option<String>,
    pub instructor_id: String,
    pub slots: Vec<Slot>,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateClass {
    pub name: Option<String>,
    pub class_type: Option<String>,
    pub description: Option<Option<String>>,
    pub slots: Option<Vec<Slot>>,
    pub capacity: Option<i32>,
}

/// Outcome of marking attendance: how many of the submitted candidates were
/// accepted, and the class as persisted.
#[derive(Debug)]
pub struct AttendanceOutcome {
    pub accepted: usize,
    pub class: ClassOffering,
}

pub struct ClassService<CR, OP, A>
where
    CR: ClassRepository,
    OP: OwnedPassRepository,
    A: AccountRepository,
{
    class_repo: Arc<CR>,
    owned_pass_repo: Arc<OP>,
    account_repo: Arc<A>,
}

impl<CR, OP, A> ClassService<CR, OP, A>
where
    CR: ClassRepository,
    OP: OwnedPassRepository,
    A: AccountRepository,
{
    pub fn new(class_repo: Arc<CR>, owned_pass_repo: Arc<OP>, account_repo: Arc<A>) -> Self {
        Self {
            class_repo,
            owned_pass_repo,
            account_repo,
        }
    }

    pub async fn create_class(&self, request: NewClass) -> Result<ClassOffering, ScheduleError> {
        if request.name.trim().is_empty() {
            return Err(ScheduleError::Validation("class name is required".into()));
        }
        if request.class_type.trim().is_empty() {
            return Err(ScheduleError::Validation("class type is required".into()));
        }
        if request.slots.is_empty() {
            return Err(ScheduleError::Validation(
                "at least one schedule slot is required".into(),
            ));
        }
        if let Some(capacity) = request.capacity {
            if capacity <= 0 {
                return Err(ScheduleError::Validation(
                    "capacity must be positive".into(),
                ));
            }
        }

        let instructor = self
            .account_repo
            .get_by_id(&request.instructor_id)
            .await
            .map_err(|_| {
                ScheduleError::Validation(format!(
                    "instructor {} does not exist",
                    request.instructor_id
                ))
            })?;
        if instructor.role != Role::Instructor {
            return Err(ScheduleError::Validation(format!(
                "{} is not an instructor",
                request.instructor_id
            )));
        }

        self.check_slot_conflicts(&request.instructor_id, &request.slots, None)
            .await?;

        let ids = self.class_repo.all_ids().await?;
        let class_id =
            IdKind::Class.next(IdKind::Class.max_sequence(ids.iter().map(String::as_str)));

        let class = ClassOffering::new(
            class_id,
            request.name,
            request.class_type,
            request.description,
            request.instructor_id,
            request.slots,
            request.capacity.unwrap_or(DEFAULT_CAPACITY),
        );
        self.class_repo.create(&class).await?;

        info!("Created class {} ({})", class.class_id, class.name);
        Ok(class)
    }

    pub async fn update_class(
        &self,
        id: &str,
        update: UpdateClass,
    ) -> Result<ClassOffering, ScheduleError> {
        let mut class = self.get_class(id).await?;

        if let Some(slots) = &update.slots {
            if slots.is_empty() {
                return Err(ScheduleError::Validation(
                    "at least one schedule slot is required".into(),
                ));
            }
            self.check_slot_conflicts(&class.instructor_id, slots, Some(id))
                .await?;
        }
        if let Some(capacity) = update.capacity {
            if capacity < class.roster.len() as i32 {
                return Err(ScheduleError::Validation(
                    "capacity cannot drop below current registrations".into(),
                ));
            }
        }

        if let Some(v) = update.name {
            class.name = v;
        }
        if let Some(v) = update.class_type {
            class.class_type = v;
        }
        if let Some(v) = update.description {
            class.description = v;
        }
        if let Some(v) = update.slots {
            class.slots = v;
        }
        if let Some(v) = update.capacity {
            class.capacity = v;
        }
        class.updated_at = Utc::now();

        self.class_repo.save(&class).await?;
        Ok(class)
    }

    /// Delete is a deactivation; the roster and attendance history survive
    /// for reporting.
    pub async fn deactivate_class(&self, id: &str) -> Result<(), ScheduleError> {
        let mut class = self.get_class(id).await?;
        class.is_active = false;
        class.updated_at = Utc::now();
        self.class_repo.save(&class).await?;

        info!("Deactivated class {}", id);
        Ok(())
    }

    pub async fn get_class(&self, id: &str) -> Result<ClassOffering, ScheduleError> {
        self.class_repo.get_by_id(id).await.map_err(|e| match e {
            RepositoryError::NotFound(_) => ScheduleError::NotFound(id.to_string()),
            _ => e.into(),
        })
    }

    pub async fn list_classes(&self) -> Result<Vec<ClassOffering>, ScheduleError> {
        Ok(self.class_repo.list().await?)
    }

    pub async fn list_active_classes(&self) -> Result<Vec<ClassOffering>, ScheduleError> {
        Ok(self.class_repo.list_active().await?)
    }

    pub async fn instructor_classes(
        &self,
        instructor_id: &str,
    ) -> Result<Vec<ClassOffering>, ScheduleError> {
        Ok(self.class_repo.list_by_instructor(instructor_id).await?)
    }

    /// Registration preconditions, checked in a fixed order so the first
    /// failure decides the response: class → pass ownership/validity →
    /// sessions → expiration → duplicate → capacity.
    pub async fn register_for_class(
        &self,
        class_id: &str,
        account_id: &str,
        owned_pass_id: &str,
    ) -> Result<ClassOffering, ScheduleError> {
        let mut class = self.get_class(class_id).await?;
        if !class.is_active {
            return Err(ScheduleError::NotFound(class_id.to_string()));
        }

        let pass = self
            .owned_pass_repo
            .get_by_id(owned_pass_id)
            .await
            .map_err(|_| ScheduleError::Validation("a valid pass is required".into()))?;
        if pass.account_id != account_id || !pass.is_active {
            return Err(ScheduleError::Validation("a valid pass is required".into()));
        }
        if pass.sessions_remaining <= 0 {
            return Err(ScheduleError::Validation(
                "no sessions remaining on this pass".into(),
            ));
        }
        if pass.is_expired(Utc::now()) {
            return Err(ScheduleError::Validation("this pass has expired".into()));
        }

        class
            .add_registration(account_id.to_string(), owned_pass_id.to_string())
            .map_err(|e| match e {
                RosterError::AlreadyRegistered => {
                    ScheduleError::Validation("already registered for this class".into())
                }
                RosterError::Full => {
                    ScheduleError::Validation("class is at full capacity".into())
                }
            })?;

        self.class_repo.save(&class).await?;
        info!("Registered {} for class {}", account_id, class_id);
        Ok(class)
    }

    pub async fn cancel_registration(
        &self,
        class_id: &str,
        account_id: &str,
    ) -> Result<ClassOffering, ScheduleError> {
        let mut class = self.get_class(class_id).await?;
        if !class.is_registered(account_id) {
            return Err(ScheduleError::Validation(
                "not registered for this class".into(),
            ));
        }

        class.remove_registration(account_id);
        self.class_repo.save(&class).await?;
        Ok(class)
    }

    /// Mark attendance for one date of the instructor's own class. Candidates
    /// that are not on the roster, or whose pass cannot cover a session, are
    /// dropped without failing the call. The submitted list replaces any
    /// earlier marking for the date; sessions debited then stay debited.
    pub async fn mark_attendance(
        &self,
        class_id: &str,
        instructor_id: &str,
        date: NaiveDate,
        candidates: &[String],
    ) -> Result<AttendanceOutcome, ScheduleError> {
        let mut class = self.get_class(class_id).await?;
        // A class that isn't yours doesn't exist, as far as attendance goes.
        if class.instructor_id != instructor_id {
            return Err(ScheduleError::NotFound(class_id.to_string()));
        }

        let now = Utc::now();
        let mut attendees = Vec::new();
        for candidate in candidates {
            let Some(registration) = class.registration_for(candidate) else {
                warn!(
                    "Attendance candidate {} not on roster of {}, skipping",
                    candidate, class_id
                );
                continue;
            };
            let owned_pass_id = registration.owned_pass_id.clone();

            let mut pass = match self.owned_pass_repo.get_by_id(&owned_pass_id).await {
                Ok(pass) => pass,
                Err(e) => {
                    warn!(
                        "Pass {} for attendee {} unavailable, skipping: {}",
                        owned_pass_id, candidate, e
                    );
                    continue;
                }
            };
            if !pass.debit_session() {
                warn!(
                    "Pass {} for attendee {} has no sessions left, skipping",
                    owned_pass_id, candidate
                );
                continue;
            }
            self.owned_pass_repo.update(&pass).await?;

            attendees.push(Attendee {
                account_id: candidate.clone(),
                owned_pass_id,
                checked_in_at: now,
            });
        }

        let accepted = attendees.len();
        class.record_attendance(date, attendees);
        self.class_repo.save(&class).await?;

        info!(
            "Recorded attendance for class {} on {}: {}/{} accepted",
            class_id,
            date,
            accepted,
            candidates.len()
        );
        Ok(AttendanceOutcome { accepted, class })
    }

    /// Attendance snapshot for one date. `instructor_filter` scopes the
    /// lookup to that instructor's classes (managers pass `None`).
    pub async fn class_attendance(
        &self,
        class_id: &str,
        date: NaiveDate,
        instructor_filter: Option<&str>,
    ) -> Result<Vec<Attendee>, ScheduleError> {
        let class = self.get_class(class_id).await?;
        if let Some(instructor_id) = instructor_filter {
            if class.instructor_id != instructor_id {
                return Err(ScheduleError::NotFound(class_id.to_string()));
            }
        }

        Ok(class
            .attendance_for(date)
            .map(|record| record.attendees.clone())
            .unwrap_or_default())
    }

    /// Per-instructor conflict check: only that instructor's active classes
    /// block a slot. Another instructor may hold the identical (day, time).
    async fn check_slot_conflicts(
        &self,
        instructor_id: &str,
        slots: &[Slot],
        exclude_class: Option<&str>,
    ) -> Result<(), ScheduleError> {
        let existing = self.class_repo.list_by_instructor(instructor_id).await?;
        for class in existing
            .iter()
            .filter(|c| c.is_active && Some(c.class_id.as_str()) != exclude_class)
        {
            if let Some(slot) = class.conflicting_slot(slots) {
                return Err(ScheduleError::Conflict {
                    instructor_id: instructor_id.to_string(),
                    conflict: Box::new(SlotConflict {
                        class_id: class.class_id.clone(),
                        class_name: class.name.clone(),
                        slot: slot.clone(),
                        alternative_times: adjacent_hours(&slot.time),
                    }),
                });
            }
        }
        Ok(())
    }
}

/// Suggested replacement times one hour either side of a taken slot.
fn adjacent_hours(time: &str) -> Vec<String> {
    let Some((hour_str, minute_str)) = time.split_once(':') else {
        return Vec::new();
    };
    let Ok(hour) = hour_str.parse::<i32>() else {
        return Vec::new();
    };

    let mut alternatives = Vec::new();
    if hour > 0 {
        alternatives.push(format!("{:02}:{}", hour - 1, minute_str));
    }
    if hour < 23 {
        alternatives.push(format!("{:02}:{}", hour + 1, minute_str));
    }
    alternatives
}
