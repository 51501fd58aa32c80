//! # Report Repository
//!
//! Loads the fact rows every report is computed from.
//!
//! ## One Scope, Three Queries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WITH scoped AS (                                                       │
//! │      bookings of the tenant                                             │
//! │      ∧ window predicate on start_time    ← TimeWindow::predicate        │
//! │      ∧ optional staff filter                                            │
//! │      + effective hold_percent per booking                               │
//! │  )                                                                      │
//! │       │                                                                 │
//! │       ├──► booking facts  (client, channel, birth date)                 │
//! │       ├──► line facts     (item, category kind, set-has-hookah)         │
//! │       └──► payment facts  (split rows, or one synthetic row)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scope is written once, so a booking inside a window contributes the
//! same rows to every report. Aggregation happens in
//! [`lounge_core::report`].

use lounge_core::report::{BookingFact, LineFact, PaymentFact, ReportFacts};
use lounge_core::window::Predicate;
use lounge_core::{Tenant, TimeWindow, User, VenueTable};
use sqlx::query::QueryAs;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Effective hold: amount-weighted over split payments, else the booking's
/// payment type, else zero.
const SCOPE_CTE: &str = r#"
WITH scoped AS (
    SELECT
        b.id AS booking_id,
        b.client_id,
        b.table_id,
        b.user_id,
        b.start_time,
        b.total_amount,
        b.discount,
        b.discount_reason,
        b.payment_type_id,
        CAST(COALESCE(
            (SELECT SUM(bp.amount * pt.hold_percent) / NULLIF(SUM(bp.amount), 0)
             FROM booking_payments bp
             JOIN payment_types pt ON pt.id = bp.payment_type_id
             WHERE bp.booking_id = b.id),
            (SELECT pt.hold_percent FROM payment_types pt WHERE pt.id = b.payment_type_id),
            0
        ) AS REAL) AS hold_percent
    FROM bookings b
    WHERE b.company_id = ? AND b.branch_id = ?
      AND {window}
      AND (? IS NULL OR b.user_id = ?)
)
"#;

const BOOKINGS_SQL: &str = r#"
SELECT
    s.booking_id,
    s.client_id,
    c.name AS client_name,
    ch.name AS channel_name,
    c.birth_date AS client_birth_date,
    s.table_id,
    s.user_id,
    s.start_time,
    s.total_amount,
    s.discount,
    s.discount_reason,
    s.hold_percent
FROM scoped s
LEFT JOIN clients c ON c.id = s.client_id
LEFT JOIN channels ch ON ch.id = c.channel_id
ORDER BY s.start_time, s.booking_id
"#;

const LINES_SQL: &str = r#"
SELECT
    s.booking_id,
    s.user_id,
    s.table_id,
    s.start_time,
    bi.item_id,
    p.name AS item_name,
    p.category_id,
    cat.name AS category_name,
    cat.kind AS category_kind,
    bi.quantity,
    bi.price,
    bi.discount,
    p.buy_price,
    p.is_set,
    EXISTS (
        SELECT 1 FROM set_items si
        JOIN price_items cp ON cp.id = si.item_id
        JOIN categories cc ON cc.id = cp.category_id
        WHERE si.set_id = p.id AND cc.kind = 'hookah'
    ) AS set_has_hookah,
    s.hold_percent
FROM scoped s
JOIN booking_items bi ON bi.booking_id = s.booking_id
JOIN price_items p ON p.id = bi.item_id
JOIN categories cat ON cat.id = p.category_id
ORDER BY s.booking_id, bi.id
"#;

/// Bookings without split rows contribute their total under their own
/// payment type.
const PAYMENTS_SQL: &str = r#"
SELECT
    s.booking_id,
    s.table_id,
    bp.payment_type_id,
    pt.name AS payment_type_name,
    bp.amount,
    CAST(pt.hold_percent AS REAL) AS hold_percent
FROM scoped s
JOIN booking_payments bp ON bp.booking_id = s.booking_id
JOIN payment_types pt ON pt.id = bp.payment_type_id
UNION ALL
SELECT
    s.booking_id,
    s.table_id,
    s.payment_type_id,
    pt.name,
    s.total_amount,
    CAST(COALESCE(pt.hold_percent, 0) AS REAL)
FROM scoped s
LEFT JOIN payment_types pt ON pt.id = s.payment_type_id
WHERE NOT EXISTS (SELECT 1 FROM booking_payments bp WHERE bp.booking_id = s.booking_id)
"#;

/// Bound values of the `scoped` CTE.
struct Scope {
    tenant: Tenant,
    predicate: Predicate,
    user_id: Option<i64>,
}

impl Scope {
    fn sql(&self, body: &str) -> String {
        let cte = SCOPE_CTE.replace("{window}", &self.predicate.sql);
        format!("{cte}{body}")
    }

    /// Binds in placeholder order: tenant, window, staff filter (twice).
    fn bind<'q, O>(
        &self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        let mut query = query
            .bind(self.tenant.company_id)
            .bind(self.tenant.branch_id);
        for param in &self.predicate.params {
            query = query.bind(param.clone());
        }
        query.bind(self.user_id).bind(self.user_id)
    }
}

/// Repository for report fact rows.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Facts of the bookings inside `window`, optionally for one staff
    /// member.
    pub async fn facts(
        &self,
        tenant: Tenant,
        window: &TimeWindow,
        user_id: Option<i64>,
    ) -> DbResult<ReportFacts> {
        let mut conn = self.pool.acquire().await?;
        load_facts(&mut conn, tenant, window, user_id).await
    }
}

pub(crate) async fn load_facts(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    window: &TimeWindow,
    user_id: Option<i64>,
) -> DbResult<ReportFacts> {
    let scope = Scope {
        tenant,
        predicate: window.predicate("b.start_time"),
        user_id,
    };

    let sql = scope.sql(BOOKINGS_SQL);
    let bookings: Vec<BookingFact> = scope
        .bind(sqlx::query_as(&sql))
        .fetch_all(&mut *conn)
        .await?;

    let sql = scope.sql(LINES_SQL);
    let lines: Vec<LineFact> = scope
        .bind(sqlx::query_as(&sql))
        .fetch_all(&mut *conn)
        .await?;

    let sql = scope.sql(PAYMENTS_SQL);
    let payments: Vec<PaymentFact> = scope
        .bind(sqlx::query_as(&sql))
        .fetch_all(&mut *conn)
        .await?;

    debug!(
        from = %window.date_from,
        to = %window.date_to,
        bookings = bookings.len(),
        lines = lines.len(),
        payments = payments.len(),
        "Loaded report facts"
    );

    Ok(ReportFacts {
        bookings,
        lines,
        payments,
    })
}

pub(crate) async fn users(conn: &mut SqliteConnection, tenant: Tenant) -> DbResult<Vec<User>> {
    let users = sqlx::query_as(
        r#"
        SELECT id, company_id, branch_id, name, phone, role,
               salary_shift, salary_hookah, salary_bar, hookah_salary_type, permissions
        FROM users WHERE company_id = ?1 AND branch_id = ?2 ORDER BY id
        "#,
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(users)
}

pub(crate) async fn tables(conn: &mut SqliteConnection, tenant: Tenant) -> DbResult<Vec<VenueTable>> {
    let tables = sqlx::query_as(
        r#"
        SELECT id, company_id, branch_id, name, seats FROM venue_tables
        WHERE company_id = ?1 AND branch_id = ?2 ORDER BY id
        "#,
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::*;
    use chrono::{NaiveDate, NaiveTime};
    use lounge_core::BookingPaymentInput;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_wrapping_window_matches_predicate() {
        let db = db().await;
        let f = seed(&db).await;
        let repo = db.bookings();
        for (start, end) in [
            (at(2, 23, 30), at(3, 0, 30)),
            (at(4, 2, 0), at(4, 3, 0)),
            (at(2, 12, 0), at(2, 13, 0)),
        ] {
            repo.insert(TENANT, &booking_input(&f, start, end)).await.unwrap();
        }

        let window = TimeWindow::new(d(1), d(3), t(22), t(4)).unwrap();
        let facts = db.reports().facts(TENANT, &window, None).await.unwrap();

        let starts: Vec<_> = facts.bookings.iter().map(|b| b.start_time).collect();
        assert_eq!(starts, vec![at(2, 23, 30), at(4, 2, 0)]);
        assert!(starts.iter().all(|s| window.contains(*s)));
    }

    #[tokio::test]
    async fn test_line_and_payment_facts() {
        let db = db().await;
        let f = seed(&db).await;
        let card = db.catalog().create_payment_type(TENANT, "Карта", 2.0).await.unwrap();

        let mut input = booking_input(&f, at(2, 20, 0), at(2, 22, 0));
        input.payments = vec![BookingPaymentInput { payment_type_id: card, amount: 2000 }];
        db.bookings().insert(TENANT, &input).await.unwrap();
        db.bookings()
            .insert(TENANT, &booking_input(&f, at(3, 20, 0), at(3, 22, 0)))
            .await
            .unwrap();

        let window = TimeWindow::all_day(d(1), d(7)).unwrap();
        let facts = db.reports().facts(TENANT, &window, Some(f.user_id)).await.unwrap();

        assert_eq!(facts.bookings.len(), 2);
        assert!((facts.bookings[0].hold_percent - 2.0).abs() < 1e-9);
        assert_eq!(facts.bookings[1].hold_percent, 0.0);

        assert_eq!(facts.lines.len(), 4);
        assert!(facts.lines.iter().any(|l| l.is_hookah()));

        // One split row plus one synthetic row for the unpaid booking
        assert_eq!(facts.payments.len(), 2);
        assert!(facts.payments.iter().any(|p| p.payment_type_id.is_none()));

        let other = db.reports().facts(TENANT, &window, Some(f.user_id + 1)).await.unwrap();
        assert!(other.bookings.is_empty());
    }
}
