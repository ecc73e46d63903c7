//! Manager-only business reports. The class roster and attendance history are
//! embedded documents, so everything past the pass-sale aggregate is computed
//! here by iterating classes rather than in SQL.

use crate::domain::{ClassOffering, Role};
use crate::infrastructure::{AccountRepository, ClassRepository, OwnedPassRepository, RepositoryError};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Calendar-exact reporting window: a whole year, or one month of it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportWindow {
    pub year: i32,
    pub month: Option<u32>,
    #[serde(skip)]
    pub from: DateTime<Utc>,
    #[serde(skip)]
    pub to: DateTime<Utc>,
}

impl ReportWindow {
    pub fn resolve(year: Option<i32>, month: Option<u32>) -> Result<Self, ReportError> {
        let year = year.unwrap_or_else(|| Utc::now().year());
        if let Some(month) = month {
            if !(1..=12).contains(&month) {
                return Err(ReportError::Validation(format!("invalid month: {}", month)));
            }
        }

        let (from, to) = match month {
            Some(month) => month_bounds(year, month)?,
            None => (start_of_month(year, 1)?, start_of_month(year + 1, 1)?),
        };

        Ok(Self {
            year,
            month,
            from,
            to,
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at < self.to
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        let from = self.from.date_naive();
        let to = self.to.date_naive();
        date >= from && date < to
    }
}

fn start_of_month(year: i32, month: u32) -> Result<DateTime<Utc>, ReportError> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ReportError::Validation(format!("invalid window: {}-{}", year, month)))
}

fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), ReportError> {
    let from = start_of_month(year, month)?;
    let to = if month == 12 {
        start_of_month(year + 1, 1)?
    } else {
        start_of_month(year, month + 1)?
    };
    Ok((from, to))
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesSummary {
    pub sale_count: i64,
    pub revenue: f64,
    pub average_price: f64,
}

impl SalesSummary {
    fn from_totals(sale_count: i64, revenue: f64) -> Self {
        let average_price = if sale_count == 0 {
            0.0
        } else {
            revenue / sale_count as f64
        };
        Self {
            sale_count,
            revenue,
            average_price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySales {
    pub month: u32,
    pub sale_count: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct PerformanceReport {
    pub window: ReportWindow,
    pub new_clients: i64,
    pub new_instructors: i64,
    pub pass_sales: SalesSummary,
    /// Present only for year-wide windows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_sales: Option<Vec<MonthlySales>>,
}

#[derive(Debug, Serialize)]
pub struct ClassActivity {
    pub class_id: String,
    pub name: String,
    pub registrations: usize,
    pub attendance: usize,
}

#[derive(Debug, Serialize)]
pub struct InstructorStats {
    pub instructor_id: String,
    pub name: String,
    pub registrations: usize,
    pub attendance: usize,
    pub unique_students: usize,
    pub attendance_rate: f64,
    pub classes: Vec<ClassActivity>,
}

#[derive(Debug, Serialize)]
pub struct InstructorPerformanceReport {
    pub window: ReportWindow,
    pub instructors: Vec<InstructorStats>,
}

#[derive(Debug, Serialize)]
pub struct CustomerStats {
    pub account_id: String,
    pub name: String,
    pub scheduled: usize,
    pub attended: usize,
    pub attendance_rate: f64,
    pub classes: Vec<ClassActivity>,
}

#[derive(Debug, Serialize)]
pub struct CustomerAttendanceReport {
    pub window: ReportWindow,
    pub customers: Vec<CustomerStats>,
}

#[derive(Debug, Serialize)]
pub struct ClassAttendanceStats {
    pub class_id: String,
    pub name: String,
    pub class_type: String,
    pub registrations: usize,
    pub attendance: usize,
    pub attendance_rate: f64,
    pub capacity_utilization: f64,
    pub sessions_held: usize,
    pub average_attendance: f64,
}

#[derive(Debug, Serialize)]
pub struct ClassTypeRollup {
    pub class_type: String,
    pub registrations: usize,
    pub attendance: usize,
    pub attendance_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct GeneralAttendanceReport {
    pub window: ReportWindow,
    pub classes: Vec<ClassAttendanceStats>,
    pub by_type: Vec<ClassTypeRollup>,
}

pub struct ReportService<A, OP, CR>
where
    A: AccountRepository,
    OP: OwnedPassRepository,
    CR: ClassRepository,
{
    account_repo: Arc<A>,
    owned_pass_repo: Arc<OP>,
    class_repo: Arc<CR>,
}

impl<A, OP, CR> ReportService<A, OP, CR>
where
    A: AccountRepository,
    OP: OwnedPassRepository,
    CR: ClassRepository,
{
    pub fn new(account_repo: Arc<A>, owned_pass_repo: Arc<OP>, class_repo: Arc<CR>) -> Self {
        Self {
            account_repo,
            owned_pass_repo,
            class_repo,
        }
    }

    pub async fn performance(&self, window: ReportWindow) -> Result<PerformanceReport, ReportError> {
        let new_clients = self
            .account_repo
            .count_created_between(Role::Client, window.from, window.to)
            .await?;
        let new_instructors = self
            .account_repo
            .count_created_between(Role::Instructor, window.from, window.to)
            .await?;
        let (sale_count, revenue) = self
            .owned_pass_repo
            .sales_summary_between(window.from, window.to)
            .await?;

        let monthly_sales = if window.month.is_none() {
            let mut months = Vec::with_capacity(12);
            for month in 1..=12 {
                let (from, to) = month_bounds(window.year, month)?;
                let (sale_count, revenue) =
                    self.owned_pass_repo.sales_summary_between(from, to).await?;
                months.push(MonthlySales {
                    month,
                    sale_count,
                    revenue,
                });
            }
            Some(months)
        } else {
            None
        };

        Ok(PerformanceReport {
            window,
            new_clients,
            new_instructors,
            pass_sales: SalesSummary::from_totals(sale_count, revenue),
            monthly_sales,
        })
    }

    pub async fn instructor_performance(
        &self,
        window: ReportWindow,
        instructor_id: Option<&str>,
    ) -> Result<InstructorPerformanceReport, ReportError> {
        let instructors = self.account_repo.list_by_role(Role::Instructor).await?;
        let classes = self.class_repo.list().await?;

        let mut stats = Vec::new();
        for instructor in instructors
            .iter()
            .filter(|a| instructor_id.map_or(true, |id| a.account_id == id))
        {
            let mut registrations = 0;
            let mut attendance = 0;
            let mut students = HashSet::new();
            let mut class_details = Vec::new();

            for class in classes
                .iter()
                .filter(|c| c.instructor_id == instructor.account_id)
            {
                let class_registrations = registrations_in_window(class, &window);
                let class_attendance = attendance_in_window(class, &window, Some(&mut students));
                if class_registrations == 0 && class_attendance == 0 {
                    continue;
                }

                registrations += class_registrations;
                attendance += class_attendance;
                class_details.push(ClassActivity {
                    class_id: class.class_id.clone(),
                    name: class.name.clone(),
                    registrations: class_registrations,
                    attendance: class_attendance,
                });
            }

            stats.push(InstructorStats {
                instructor_id: instructor.account_id.clone(),
                name: instructor.full_name(),
                registrations,
                attendance,
                unique_students: students.len(),
                attendance_rate: rate(attendance, registrations),
                classes: class_details,
            });
        }

        Ok(InstructorPerformanceReport {
            window,
            instructors: stats,
        })
    }

    /// Per-client scheduled-versus-attended. Clients with no registration in
    /// the window are left out entirely.
    pub async fn customer_attendance(
        &self,
        window: ReportWindow,
    ) -> Result<CustomerAttendanceReport, ReportError> {
        let clients = self.account_repo.list_by_role(Role::Client).await?;
        let classes = self.class_repo.list().await?;

        let mut customers = Vec::new();
        for client in &clients {
            let mut scheduled = 0;
            let mut attended = 0;
            let mut class_details = Vec::new();

            for class in &classes {
                let registered = class
                    .roster
                    .iter()
                    .any(|r| r.account_id == client.account_id && window.contains(r.registered_at));
                let class_attended = class
                    .attendance
                    .iter()
                    .filter(|record| window.contains_date(record.date))
                    .flat_map(|record| record.attendees.iter())
                    .filter(|a| a.account_id == client.account_id)
                    .count();

                if !registered && class_attended == 0 {
                    continue;
                }
                scheduled += usize::from(registered);
                attended += class_attended;
                class_details.push(ClassActivity {
                    class_id: class.class_id.clone(),
                    name: class.name.clone(),
                    registrations: usize::from(registered),
                    attendance: class_attended,
                });
            }

            if scheduled == 0 {
                continue;
            }
            customers.push(CustomerStats {
                account_id: client.account_id.clone(),
                name: client.full_name(),
                scheduled,
                attended,
                attendance_rate: rate(attended, scheduled),
                classes: class_details,
            });
        }

        Ok(CustomerAttendanceReport { window, customers })
    }

    pub async fn general_attendance(
        &self,
        window: ReportWindow,
    ) -> Result<GeneralAttendanceReport, ReportError> {
        let classes = self.class_repo.list_active().await?;

        let mut stats = Vec::new();
        let mut rollups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for class in &classes {
            let registrations = registrations_in_window(class, &window);
            let sessions_held = class
                .attendance
                .iter()
                .filter(|record| window.contains_date(record.date))
                .count();
            let attendance = attendance_in_window(class, &window, None);
            if registrations == 0 && attendance == 0 {
                continue;
            }

            let entry = rollups.entry(class.class_type.clone()).or_default();
            entry.0 += registrations;
            entry.1 += attendance;

            stats.push(ClassAttendanceStats {
                class_id: class.class_id.clone(),
                name: class.name.clone(),
                class_type: class.class_type.clone(),
                registrations,
                attendance,
                attendance_rate: rate(attendance, registrations),
                capacity_utilization: rate(registrations, class.capacity.max(0) as usize),
                sessions_held,
                average_attendance: if sessions_held == 0 {
                    0.0
                } else {
                    attendance as f64 / sessions_held as f64
                },
            });
        }

        let by_type = rollups
            .into_iter()
            .map(|(class_type, (registrations, attendance))| ClassTypeRollup {
                class_type,
                registrations,
                attendance,
                attendance_rate: rate(attendance, registrations),
            })
            .collect();

        Ok(GeneralAttendanceReport {
            window,
            classes: stats,
            by_type,
        })
    }
}

fn registrations_in_window(class: &ClassOffering, window: &ReportWindow) -> usize {
    class
        .roster
        .iter()
        .filter(|r| window.contains(r.registered_at))
        .count()
}

fn attendance_in_window(
    class: &ClassOffering,
    window: &ReportWindow,
    mut students: Option<&mut HashSet<String>>,
) -> usize {
    class
        .attendance
        .iter()
        .filter(|record| window.contains_date(record.date))
        .map(|record| {
            if let Some(students) = students.as_deref_mut() {
                for attendee in &record.attendees {
                    students.insert(attendee.account_id.clone());
                }
            }
            record.attendees.len()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_windows_are_calendar_exact() {
        let window = ReportWindow::resolve(Some(2025), Some(2)).unwrap();
        assert_eq!(window.from, Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(window.to, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert!(window.contains_date(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()));
        assert!(!window.contains_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
    }

    #[test]
    fn december_window_rolls_into_the_next_year() {
        let window = ReportWindow::resolve(Some(2025), Some(12)).unwrap();
        assert_eq!(window.to, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn year_window_spans_all_twelve_months() {
        let window = ReportWindow::resolve(Some(2025), None).unwrap();
        assert_eq!(window.from, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.to, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn out_of_range_month_is_rejected() {
        assert!(matches!(
            ReportWindow::resolve(Some(2025), Some(13)),
            Err(ReportError::Validation(_))
        ));
        assert!(matches!(
            ReportWindow::resolve(Some(2025), Some(0)),
            Err(ReportError::Validation(_))
        ));
    }

    #[test]
    fn rates_handle_empty_denominators() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(3, 4), 75.0);
    }
}
