//! # Report Service
//!
//! Runs each report as: load facts in one read transaction, then hand
//! them to the pure builders in [`lounge_core::report`].
//!
//! ## Deadline
//! ```text
//! timeout(report_timeout) {
//!     BEGIN
//!       settings, tables, users       (as needed)
//!       facts(window)                 (+ facts(previous window) for summary)
//!     COMMIT
//! }
//! elapsed → DbError::Timeout, the transaction is dropped and rolled back
//! ```
//!
//! A dropped report future aborts its queries; nothing partial is returned.

use std::future::Future;
use std::time::Duration;

use lounge_core::params::ReportQuery;
use lounge_core::report::analytics::{build_analytics_report, AnalyticsReport};
use lounge_core::report::discounts::{build_discounts_report, DiscountsReport};
use lounge_core::report::payroll::{build_admins_report, build_sales_report, AdminsReport, SalesReport};
use lounge_core::report::summary::{build_summary, SummaryContext, SummaryReport};
use lounge_core::report::tables::{build_tables_report, TablesReport};
use lounge_core::window::business_day_hours;
use lounge_core::{Settings, Tenant, User, VenueTable};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::report::{load_facts, tables, users};
use crate::repository::settings;

/// Default deadline for one report.
pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Report generation with a deadline.
#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
    timeout: Duration,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        ReportService {
            db,
            timeout: DEFAULT_REPORT_TIMEOUT,
        }
    }

    /// Sets the per-report deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Revenue, clients, load, demographics and period-over-period change.
    pub async fn summary(&self, tenant: Tenant, query: &ReportQuery) -> DbResult<SummaryReport> {
        self.deadline("summary", async {
            let mut tx = self.db.pool().begin().await?;
            let settings = settings::load(&mut tx, tenant).await?;
            let tables = tables(&mut tx, tenant).await?;
            let current = load_facts(&mut tx, tenant, &query.window, query.user_id).await?;
            let previous =
                load_facts(&mut tx, tenant, &query.window.previous(), query.user_id).await?;
            tx.commit().await?;

            let ctx = SummaryContext {
                tables_count: capacity_tables(&settings, &tables),
                business_day_hours: business_day_hours(
                    settings.work_time_from,
                    settings.work_time_to,
                ),
                day_count: query.window.day_count(),
                as_of: query.as_of,
            };
            Ok(build_summary(&current, &previous, &ctx))
        })
        .await
    }

    /// Payroll of every admin.
    pub async fn admins(&self, tenant: Tenant, query: &ReportQuery) -> DbResult<AdminsReport> {
        self.deadline("admins", async {
            let mut tx = self.db.pool().begin().await?;
            let staff = staff(users(&mut tx, tenant).await?, query);
            let facts = load_facts(&mut tx, tenant, &query.window, query.user_id).await?;
            tx.commit().await?;

            Ok(build_admins_report(&facts, &staff, &query.window))
        })
        .await
    }

    /// Payroll of every staff member with bookings, plus item sales.
    pub async fn sales(&self, tenant: Tenant, query: &ReportQuery) -> DbResult<SalesReport> {
        self.deadline("sales", async {
            let mut tx = self.db.pool().begin().await?;
            let staff = staff(users(&mut tx, tenant).await?, query);
            let facts = load_facts(&mut tx, tenant, &query.window, query.user_id).await?;
            tx.commit().await?;

            Ok(build_sales_report(&facts, &staff, &query.window))
        })
        .await
    }

    /// Daily revenue, hourly bookings and per-category stats.
    pub async fn analytics(&self, tenant: Tenant, query: &ReportQuery) -> DbResult<AnalyticsReport> {
        self.deadline("analytics", async {
            let mut tx = self.db.pool().begin().await?;
            let facts = load_facts(&mut tx, tenant, &query.window, query.user_id).await?;
            tx.commit().await?;

            Ok(build_analytics_report(&facts, &query.window))
        })
        .await
    }

    /// Discount totals, reasons and the discounted bookings.
    pub async fn discounts(&self, tenant: Tenant, query: &ReportQuery) -> DbResult<DiscountsReport> {
        self.deadline("discounts", async {
            let mut tx = self.db.pool().begin().await?;
            let facts = load_facts(&mut tx, tenant, &query.window, query.user_id).await?;
            tx.commit().await?;

            Ok(build_discounts_report(&facts))
        })
        .await
    }

    /// Per-table revenue and load, plus income per payment type.
    pub async fn tables(&self, tenant: Tenant, query: &ReportQuery) -> DbResult<TablesReport> {
        self.deadline("tables", async {
            let mut tx = self.db.pool().begin().await?;
            let settings = settings::load(&mut tx, tenant).await?;
            let tables = tables(&mut tx, tenant).await?;
            let facts = load_facts(&mut tx, tenant, &query.window, query.user_id).await?;
            tx.commit().await?;

            Ok(build_tables_report(
                &facts,
                &tables,
                business_day_hours(settings.work_time_from, settings.work_time_to),
                query.window.day_count(),
            ))
        })
        .await
    }

    async fn deadline<T>(
        &self,
        report: &'static str,
        work: impl Future<Output = DbResult<T>>,
    ) -> DbResult<T> {
        debug!(report, "Building report");

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(report, timeout_secs = self.timeout.as_secs(), "Report timed out");
                Err(DbError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

/// Configured table count, or the number of tables when unset.
fn capacity_tables(settings: &Settings, tables: &[VenueTable]) -> i64 {
    if settings.tables_count > 0 {
        settings.tables_count
    } else {
        tables.len() as i64
    }
}

fn staff(users: Vec<User>, query: &ReportQuery) -> Vec<User> {
    match query.user_id {
        Some(id) => users.into_iter().filter(|u| u.id == id).collect(),
        None => users,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::*;
    use chrono::NaiveDate;
    use lounge_core::TimeWindow;

    fn query(from: u32, to: u32) -> ReportQuery {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        ReportQuery {
            window: TimeWindow::all_day(d(from), d(to)).unwrap(),
            user_id: None,
            as_of: d(to),
        }
    }

    #[test]
    fn test_capacity_falls_back_to_table_count() {
        let mut settings = Settings::defaults_for(TENANT);
        let tables = vec![
            VenueTable { id: 1, company_id: 1, branch_id: 1, name: "1".into(), seats: 4 },
            VenueTable { id: 2, company_id: 1, branch_id: 1, name: "2".into(), seats: 2 },
        ];
        assert_eq!(capacity_tables(&settings, &tables), 2);
        settings.tables_count = 6;
        assert_eq!(capacity_tables(&settings, &tables), 6);
    }

    #[tokio::test]
    async fn test_summary_and_tables_agree_on_revenue() {
        let db = db().await;
        let f = seed(&db).await;
        db.bookings()
            .insert(TENANT, &booking_input(&f, at(2, 20, 0), at(2, 22, 0)))
            .await
            .unwrap();
        db.bookings()
            .insert(TENANT, &booking_input(&f, at(9, 20, 0), at(9, 22, 0)))
            .await
            .unwrap();

        let service = ReportService::new(db.clone());
        let q = query(8, 14);
        let summary = service.summary(TENANT, &q).await.unwrap();
        let tables = service.tables(TENANT, &q).await.unwrap();

        assert_eq!(summary.total_revenue, 2000);
        assert_eq!(tables.tables.iter().map(|t| t.revenue).sum::<i64>(), 2000);
        assert_eq!(summary.revenue_change, 0.0);
    }

    #[tokio::test]
    async fn test_admins_report_lists_idle_admins() {
        let db = db().await;
        seed(&db).await;

        let report = ReportService::new(db.clone())
            .admins(TENANT, &query(1, 7))
            .await
            .unwrap();
        assert_eq!(report.admins.len(), 1);
        assert_eq!(report.admins[0].salary.total, 0);
    }
}
