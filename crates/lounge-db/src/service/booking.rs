//! # Booking Service
//!
//! Composes the booking repository with availability policy and loyalty
//! accrual.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate input                                                         │
//! │       │                                                                 │
//! │       ├── advisory: is_available() before the write ── busy → reject    │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── strict: table_is_free() inside the write ─────── busy → rollback  │
//! │   └── insert booking + lines + payments                                 │
//! │  COMMIT                                          ← booking is durable   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  accrue bonus/visit/income to the client         ← best effort          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WriteOutcome { value: id, side_effect: Applied | Skipped | Degraded }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The advisory check is read-then-write: two concurrent creates may both
//! pass it. [`BookingPolicy::strict`] moves the check into the write
//! transaction, which SQLite serializes.

use lounge_core::validation::validate_booking_input;
use lounge_core::{
    nullable_id, Booking, BookingInput, CoreError, Money, SideEffect, Tenant, WriteOutcome,
};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::booking::{insert_booking, table_is_free, update_booking};
use crate::repository::client::accrue_booking;
use crate::repository::settings;

/// How table availability is enforced on writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicy {
    /// Re-check availability inside the write transaction.
    pub strict_availability: bool,
}

impl BookingPolicy {
    /// Check before writing only.
    pub const fn advisory() -> Self {
        BookingPolicy {
            strict_availability: false,
        }
    }

    /// Check inside the write transaction.
    pub const fn strict() -> Self {
        BookingPolicy {
            strict_availability: true,
        }
    }
}

/// Booking writes with availability and loyalty rules.
#[derive(Debug, Clone)]
pub struct BookingService {
    db: Database,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(db: Database, policy: BookingPolicy) -> Self {
        BookingService { db, policy }
    }

    pub fn policy(&self) -> BookingPolicy {
        self.policy
    }

    /// Creates a booking, then credits its client.
    ///
    /// Fails with `TableUnavailable` when the table is taken. A failed
    /// credit does not undo the booking; it is reported as
    /// [`SideEffect::Degraded`].
    pub async fn create(&self, tenant: Tenant, input: &BookingInput) -> DbResult<WriteOutcome<i64>> {
        validate_booking_input(input)?;

        if !self.policy.strict_availability {
            self.check_available(tenant, None, input).await?;
        }

        let mut tx = self.db.pool().begin().await?;
        if self.policy.strict_availability {
            ensure_free(&mut tx, tenant, None, input).await?;
        }
        let id = insert_booking(&mut tx, tenant, input).await?;
        tx.commit().await?;

        info!(booking_id = id, total = input.total_amount, "Booking created");

        let side_effect = self.accrue(tenant, input).await;
        Ok(WriteOutcome::new(id, side_effect))
    }

    /// Replaces a booking aggregate. The booking itself is excluded from
    /// the availability check.
    pub async fn update(&self, tenant: Tenant, id: i64, input: &BookingInput) -> DbResult<()> {
        validate_booking_input(input)?;

        if !self.policy.strict_availability {
            self.check_available(tenant, Some(id), input).await?;
        }

        let mut tx = self.db.pool().begin().await?;
        if self.policy.strict_availability {
            ensure_free(&mut tx, tenant, Some(id), input).await?;
        }
        update_booking(&mut tx, tenant, id, input).await?;
        tx.commit().await?;

        info!(booking_id = id, "Booking updated");
        Ok(())
    }

    pub async fn get(&self, tenant: Tenant, id: i64) -> DbResult<Option<Booking>> {
        self.db.bookings().get_by_id(tenant, id).await
    }

    pub async fn delete(&self, tenant: Tenant, id: i64) -> DbResult<()> {
        self.db.bookings().delete(tenant, id).await
    }

    async fn check_available(
        &self,
        tenant: Tenant,
        exclude_id: Option<i64>,
        input: &BookingInput,
    ) -> DbResult<()> {
        let mut conn = self.db.pool().acquire().await?;
        ensure_free(&mut conn, tenant, exclude_id, input).await
    }

    /// Credits `floor(total × bonus_percent / 100)`, one visit and the total
    /// to the booking's client.
    async fn accrue(&self, tenant: Tenant, input: &BookingInput) -> SideEffect {
        let Some(client_id) = nullable_id(input.client_id) else {
            return SideEffect::Skipped;
        };

        let result: DbResult<()> = async {
            let mut conn = self.db.pool().acquire().await?;
            let settings = settings::load(&mut conn, tenant).await?;
            let bonus = Money::from_units(input.total_amount)
                .percent_floor(settings.bonus_percent)
                .units();
            debug!(client_id, bonus, "Crediting client");
            accrue_booking(&mut conn, tenant, client_id, bonus, input.total_amount).await
        }
        .await;

        match result {
            Ok(()) => SideEffect::Applied,
            Err(e) => {
                warn!(client_id, error = %e, "Booking committed but client credit failed");
                SideEffect::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Rejects the write when a table is set and taken.
async fn ensure_free(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    exclude_id: Option<i64>,
    input: &BookingInput,
) -> DbResult<()> {
    let Some(table_id) = nullable_id(input.table_id) else {
        return Ok(());
    };

    if !table_is_free(conn, tenant, table_id, exclude_id, input.start_time, input.end_time).await? {
        return Err(CoreError::TableUnavailable {
            table_id,
            start: input.start_time,
            end: input.end_time,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testing::*;
    use lounge_core::{ClientProfile, Settings};

    async fn client(db: &Database) -> i64 {
        db.clients()
            .create(
                TENANT,
                &ClientProfile {
                    name: "Вера".to_string(),
                    phone: "+7911".to_string(),
                    channel_id: 0,
                    birth_date: None,
                },
            )
            .await
            .unwrap()
    }

    async fn with_bonus_percent(db: &Database, percent: i64) {
        let mut settings = Settings::defaults_for(TENANT);
        settings.bonus_percent = percent;
        db.settings().upsert(&settings).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_credits_client() {
        let db = db().await;
        let f = seed(&db).await;
        with_bonus_percent(&db, 5).await;
        let client_id = client(&db).await;

        let mut input = booking_input(&f, at(2, 20, 0), at(2, 22, 0));
        input.client_id = client_id;
        input.total_amount = 4599;

        let service = BookingService::new(db.clone(), BookingPolicy::advisory());
        let outcome = service.create(TENANT, &input).await.unwrap();
        assert_eq!(outcome.side_effect, SideEffect::Applied);

        let client = db.clients().get(TENANT, client_id).await.unwrap().unwrap();
        assert_eq!(client.bonus, 229);
        assert_eq!(client.visits, 1);
        assert_eq!(client.income, 4599);
    }

    #[tokio::test]
    async fn test_walk_in_skips_credit() {
        let db = db().await;
        let f = seed(&db).await;
        let service = BookingService::new(db.clone(), BookingPolicy::default());

        let outcome = service
            .create(TENANT, &booking_input(&f, at(2, 20, 0), at(2, 22, 0)))
            .await
            .unwrap();
        assert_eq!(outcome.side_effect, SideEffect::Skipped);
    }

    #[tokio::test]
    async fn test_deleted_client_degrades_but_keeps_booking() {
        let db = db().await;
        let f = seed(&db).await;
        let client_id = client(&db).await;
        db.clients().soft_delete(TENANT, client_id).await.unwrap();

        let mut input = booking_input(&f, at(2, 20, 0), at(2, 22, 0));
        input.client_id = client_id;

        let service = BookingService::new(db.clone(), BookingPolicy::advisory());
        let outcome = service.create(TENANT, &input).await.unwrap();
        assert!(outcome.is_degraded());
        assert!(service.get(TENANT, outcome.value).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overlap_rejected_in_both_modes() {
        for policy in [BookingPolicy::advisory(), BookingPolicy::strict()] {
            let db = db().await;
            let f = seed(&db).await;
            let service = BookingService::new(db.clone(), policy);

            service
                .create(TENANT, &booking_input(&f, at(2, 20, 0), at(2, 22, 0)))
                .await
                .unwrap();
            let err = service
                .create(TENANT, &booking_input(&f, at(2, 21, 0), at(2, 23, 0)))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                DbError::Business(CoreError::TableUnavailable { .. })
            ));
            assert!(err.is_client_error());

            // Back-to-back is fine
            service
                .create(TENANT, &booking_input(&f, at(2, 22, 0), at(2, 23, 0)))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_update_excludes_itself() {
        let db = db().await;
        let f = seed(&db).await;
        let service = BookingService::new(db.clone(), BookingPolicy::strict());

        let id = service
            .create(TENANT, &booking_input(&f, at(2, 20, 0), at(2, 22, 0)))
            .await
            .unwrap()
            .value;
        service
            .update(TENANT, id, &booking_input(&f, at(2, 21, 0), at(2, 23, 0)))
            .await
            .unwrap();

        let booking = service.get(TENANT, id).await.unwrap().unwrap();
        assert_eq!(booking.start_time, at(2, 21, 0));
    }

    #[tokio::test]
    async fn test_tableless_booking_never_conflicts() {
        let db = db().await;
        let f = seed(&db).await;
        let service = BookingService::new(db.clone(), BookingPolicy::strict());

        let mut input = booking_input(&f, at(2, 20, 0), at(2, 22, 0));
        input.table_id = 0;
        service.create(TENANT, &input).await.unwrap();
        let id = service.create(TENANT, &input).await.unwrap().value;

        let booking = service.get(TENANT, id).await.unwrap().unwrap();
        assert_eq!(booking.table_id, None);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_store() {
        let db = db().await;
        let f = seed(&db).await;
        let service = BookingService::new(db.clone(), BookingPolicy::default());

        let mut input = booking_input(&f, at(2, 22, 0), at(2, 20, 0));
        assert!(matches!(
            service.create(TENANT, &input).await,
            Err(DbError::Validation(_))
        ));

        input.end_time = at(2, 23, 0);
        input.discount = 101;
        assert!(matches!(
            service.create(TENANT, &input).await,
            Err(DbError::Validation(_))
        ));
    }
}
