//! # Booking Repository
//!
//! Bookings are written as aggregates: the booking row, its lines and its
//! payments change together or not at all.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── INSERT bookings            (create)                               │
//! │   │   or UPDATE bookings         (update, NotFound if 0 rows)           │
//! │   ├── DELETE booking_items   WHERE booking_id = ?                       │
//! │   ├── DELETE booking_payments WHERE booking_id = ?                      │
//! │   ├── INSERT booking_items    × N                                       │
//! │   └── INSERT booking_payments × M                                       │
//! │  COMMIT   (any error → ROLLBACK, nothing visible)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Replaying an update with the same lines leaves exactly those lines.

use chrono::{NaiveDateTime, Utc};
use lounge_core::{nullable_id, Booking, BookingInput, BookingItem, BookingPayment, Tenant};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

const BOOKING_COLUMNS: &str = r#"
    id, company_id, branch_id, client_id, table_id, user_id,
    start_time, end_time, note, discount, discount_reason,
    total_amount, bonus_used, payment_status, payment_type_id,
    created_at, updated_at
"#;

/// Repository for booking aggregates.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Whether `table_id` is free over `[start, end)`.
    ///
    /// `exclude_id` is the booking being edited; `None` on create.
    pub async fn is_available(
        &self,
        tenant: Tenant,
        table_id: i64,
        exclude_id: Option<i64>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        table_is_free(&mut conn, tenant, table_id, exclude_id, start, end).await
    }

    /// Inserts a booking with its lines and payments in one transaction.
    ///
    /// Does not check availability; see `BookingService` for that.
    pub async fn insert(&self, tenant: Tenant, input: &BookingInput) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;
        let id = insert_booking(&mut tx, tenant, input).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Replaces a booking's fields, lines and payments in one transaction.
    pub async fn update(&self, tenant: Tenant, id: i64, input: &BookingInput) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        update_booking(&mut tx, tenant, id, input).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Gets a booking with its lines and payments.
    pub async fn get_by_id(&self, tenant: Tenant, id: i64) -> DbResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await?;

        let booking: Option<Booking> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3"
        ))
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(mut booking) = booking else {
            return Ok(None);
        };
        booking.items = load_items(&mut conn, id).await?;
        booking.payments = load_payments(&mut conn, id).await?;
        Ok(Some(booking))
    }

    /// Bookings of a table starting in `[from, to)`, without lines.
    pub async fn list_for_table(
        &self,
        tenant: Tenant,
        table_id: i64,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> DbResult<Vec<Booking>> {
        debug!(table_id, %from, %to, "Listing table bookings");

        let bookings = sqlx::query_as(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE company_id = ?1 AND branch_id = ?2 AND table_id = ?3
              AND start_time >= ?4 AND start_time < ?5
            ORDER BY start_time
            "#
        ))
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(table_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Hard-deletes a booking; lines and payments cascade.
    pub async fn delete(&self, tenant: Tenant, id: i64) -> DbResult<()> {
        debug!(id, "Deleting booking");

        let result =
            sqlx::query("DELETE FROM bookings WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3")
                .bind(id)
                .bind(tenant.company_id)
                .bind(tenant.branch_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", id));
        }
        Ok(())
    }
}

// =============================================================================
// Connection-level helpers (composable inside a transaction)
// =============================================================================

/// Half-open overlap test against every other booking of the table.
pub(crate) async fn table_is_free(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    table_id: i64,
    exclude_id: Option<i64>,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> DbResult<bool> {
    let conflicts: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM bookings
        WHERE company_id = ?1 AND branch_id = ?2 AND table_id = ?3
          AND id != ?4
          AND start_time < ?5 AND end_time > ?6
        "#,
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(table_id)
    .bind(exclude_id.unwrap_or(0))
    .bind(end)
    .bind(start)
    .fetch_one(&mut *conn)
    .await?;

    debug!(table_id, ?exclude_id, conflicts, "Checked table availability");
    Ok(conflicts == 0)
}

pub(crate) async fn insert_booking(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    input: &BookingInput,
) -> DbResult<i64> {
    debug!(
        table_id = input.table_id,
        user_id = input.user_id,
        items = input.items.len(),
        "Inserting booking"
    );

    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO bookings (
            company_id, branch_id, client_id, table_id, user_id,
            start_time, end_time, note, discount, discount_reason,
            total_amount, bonus_used, payment_status, payment_type_id,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
        "#,
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(nullable_id(input.client_id))
    .bind(nullable_id(input.table_id))
    .bind(input.user_id)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(&input.note)
    .bind(input.discount)
    .bind(&input.discount_reason)
    .bind(input.total_amount)
    .bind(input.bonus_used)
    .bind(input.payment_status)
    .bind(nullable_id(input.payment_type_id))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    replace_lines(conn, id, input).await?;
    Ok(id)
}

pub(crate) async fn update_booking(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    id: i64,
    input: &BookingInput,
) -> DbResult<()> {
    debug!(id, items = input.items.len(), "Updating booking");

    let result = sqlx::query(
        r#"
        UPDATE bookings SET
            client_id = ?4,
            table_id = ?5,
            user_id = ?6,
            start_time = ?7,
            end_time = ?8,
            note = ?9,
            discount = ?10,
            discount_reason = ?11,
            total_amount = ?12,
            bonus_used = ?13,
            payment_status = ?14,
            payment_type_id = ?15,
            updated_at = ?16
        WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3
        "#,
    )
    .bind(id)
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(nullable_id(input.client_id))
    .bind(nullable_id(input.table_id))
    .bind(input.user_id)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(&input.note)
    .bind(input.discount)
    .bind(&input.discount_reason)
    .bind(input.total_amount)
    .bind(input.bonus_used)
    .bind(input.payment_status)
    .bind(nullable_id(input.payment_type_id))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Booking", id));
    }

    replace_lines(conn, id, input).await
}

/// Deletes then re-inserts every line and payment of a booking.
async fn replace_lines(
    conn: &mut SqliteConnection,
    booking_id: i64,
    input: &BookingInput,
) -> DbResult<()> {
    sqlx::query("DELETE FROM booking_items WHERE booking_id = ?1")
        .bind(booking_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM booking_payments WHERE booking_id = ?1")
        .bind(booking_id)
        .execute(&mut *conn)
        .await?;

    for item in &input.items {
        sqlx::query(
            r#"
            INSERT INTO booking_items (booking_id, item_id, quantity, price, discount)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(booking_id)
        .bind(item.item_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.discount)
        .execute(&mut *conn)
        .await?;
    }

    for payment in &input.payments {
        sqlx::query(
            "INSERT INTO booking_payments (booking_id, payment_type_id, amount) VALUES (?1, ?2, ?3)",
        )
        .bind(booking_id)
        .bind(payment.payment_type_id)
        .bind(payment.amount)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn load_items(conn: &mut SqliteConnection, booking_id: i64) -> DbResult<Vec<BookingItem>> {
    let items = sqlx::query_as(
        r#"
        SELECT id, booking_id, item_id, quantity, price, discount
        FROM booking_items WHERE booking_id = ?1 ORDER BY id
        "#,
    )
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

async fn load_payments(
    conn: &mut SqliteConnection,
    booking_id: i64,
) -> DbResult<Vec<BookingPayment>> {
    let payments = sqlx::query_as(
        r#"
        SELECT id, booking_id, payment_type_id, amount
        FROM booking_payments WHERE booking_id = ?1 ORDER BY id
        "#,
    )
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(payments)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::*;
    use lounge_core::{BookingItemInput, BookingPaymentInput};

    #[tokio::test]
    async fn test_round_trip_preserves_lines() {
        let db = db().await;
        let f = seed(&db).await;
        let input = booking_input(&f, at(2, 20, 0), at(2, 22, 0));

        let id = db.bookings().insert(TENANT, &input).await.unwrap();
        let booking = db.bookings().get_by_id(TENANT, id).await.unwrap().unwrap();

        assert_eq!(booking.items.len(), 2);
        assert_eq!(booking.total_amount, 2000);
        assert_eq!(booking.client_id, None);
        assert_eq!(booking.table_id, Some(f.table_id));
        assert_eq!(booking.start_time, at(2, 20, 0));
        let lines: Vec<(i64, i64, i64)> = booking
            .items
            .iter()
            .map(|i| (i.item_id, i.quantity, i.price))
            .collect();
        assert_eq!(lines, vec![(f.hookah_id, 1, 1500), (f.cola_id, 2, 250)]);
    }

    #[tokio::test]
    async fn test_update_replaces_lines_idempotently() {
        let db = db().await;
        let f = seed(&db).await;
        let mut input = booking_input(&f, at(2, 20, 0), at(2, 22, 0));
        let id = db.bookings().insert(TENANT, &input).await.unwrap();

        input.items = vec![BookingItemInput {
            item_id: f.cola_id,
            quantity: 3,
            price: 250,
            discount: 0,
        }];
        input.total_amount = 750;
        db.bookings().update(TENANT, id, &input).await.unwrap();
        db.bookings().update(TENANT, id, &input).await.unwrap();

        let booking = db.bookings().get_by_id(TENANT, id).await.unwrap().unwrap();
        assert_eq!(booking.items.len(), 1);
        assert_eq!(booking.items[0].quantity, 3);
        assert_eq!(booking.total_amount, 750);
    }

    #[tokio::test]
    async fn test_failed_update_rolls_back() {
        let db = db().await;
        let f = seed(&db).await;
        let mut input = booking_input(&f, at(2, 20, 0), at(2, 22, 0));
        let id = db.bookings().insert(TENANT, &input).await.unwrap();

        // Second line references a missing item: FK violation after the
        // booking row and the first line were already written
        input.items.push(BookingItemInput {
            item_id: 9999,
            quantity: 1,
            price: 1,
            discount: 0,
        });
        input.total_amount = 1;
        let err = db.bookings().update(TENANT, id, &input).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let booking = db.bookings().get_by_id(TENANT, id).await.unwrap().unwrap();
        assert_eq!(booking.total_amount, 2000);
        assert_eq!(booking.items.len(), 2);
    }

    #[tokio::test]
    async fn test_availability_is_half_open_and_self_excluding() {
        let db = db().await;
        let f = seed(&db).await;
        let repo = db.bookings();
        let id = repo
            .insert(TENANT, &booking_input(&f, at(2, 20, 0), at(2, 22, 0)))
            .await
            .unwrap();

        assert!(!repo
            .is_available(TENANT, f.table_id, None, at(2, 21, 0), at(2, 23, 0))
            .await
            .unwrap());
        assert!(!repo
            .is_available(TENANT, f.table_id, None, at(2, 19, 0), at(2, 23, 0))
            .await
            .unwrap());
        assert!(repo
            .is_available(TENANT, f.table_id, None, at(2, 22, 0), at(2, 23, 0))
            .await
            .unwrap());
        assert!(repo
            .is_available(TENANT, f.table_id, Some(id), at(2, 21, 0), at(2, 23, 0))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_split_payments_and_delete() {
        let db = db().await;
        let f = seed(&db).await;
        let cash = db.catalog().create_payment_type(TENANT, "Наличные", 0.0).await.unwrap();
        let card = db.catalog().create_payment_type(TENANT, "Карта", 2.5).await.unwrap();

        let mut input = booking_input(&f, at(2, 20, 0), at(2, 22, 0));
        input.payments = vec![
            BookingPaymentInput { payment_type_id: cash, amount: 500 },
            BookingPaymentInput { payment_type_id: card, amount: 1500 },
        ];
        let id = db.bookings().insert(TENANT, &input).await.unwrap();

        let booking = db.bookings().get_by_id(TENANT, id).await.unwrap().unwrap();
        assert_eq!(booking.payments.len(), 2);
        assert!(booking.payments_reconcile());

        db.bookings().delete(TENANT, id).await.unwrap();
        assert!(db.bookings().get_by_id(TENANT, id).await.unwrap().is_none());
        assert!(matches!(
            db.bookings().delete(TENANT, id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_read() {
        let db = db().await;
        let f = seed(&db).await;
        let id = db
            .bookings()
            .insert(TENANT, &booking_input(&f, at(2, 20, 0), at(2, 22, 0)))
            .await
            .unwrap();

        let other = Tenant::new(2, 1);
        assert!(db.bookings().get_by_id(other, id).await.unwrap().is_none());
    }
}
