//! # Client Repository
//!
//! Client profiles and the loyalty accumulators (`bonus`, `visits`,
//! `income`).
//!
//! ## Accumulators
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Accumulators are only changed by single UPDATE statements:            │
//! │                                                                         │
//! │    UPDATE clients SET bonus = bonus + ?   ← never read-modify-write    │
//! │                                                                         │
//! │  Two concurrent bookings for the same client both land.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Soft-deleted clients are invisible to every read and accrual.

use chrono::Utc;
use lounge_core::validation::{validate_amount, validate_name};
use lounge_core::{nullable_id, Client, ClientProfile, ClientStatus, CoreError, Tenant};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

const CLIENT_COLUMNS: &str = r#"
    id, company_id, branch_id, name, phone, channel_id, birth_date,
    bonus, visits, income, status, created_at
"#;

/// Repository for clients.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Creates a client. Phone numbers are unique per tenant.
    pub async fn create(&self, tenant: Tenant, profile: &ClientProfile) -> DbResult<i64> {
        validate_profile(profile)?;

        debug!(phone = %profile.phone, "Creating client");

        let result = sqlx::query(
            r#"
            INSERT INTO clients (company_id, branch_id, name, phone, channel_id, birth_date, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(profile.name.trim())
        .bind(profile.phone.trim())
        .bind(nullable_id(profile.channel_id))
        .bind(profile.birth_date)
        .bind(ClientStatus::Active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| phone_conflict(e, &profile.phone))?;

        Ok(result.last_insert_rowid())
    }

    /// Gets an active client.
    pub async fn get(&self, tenant: Tenant, id: i64) -> DbResult<Option<Client>> {
        let client = sqlx::query_as(&format!(
            r#"
            SELECT {CLIENT_COLUMNS} FROM clients
            WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3 AND status = ?4
            "#
        ))
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(ClientStatus::Active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Finds an active client by phone.
    pub async fn find_by_phone(&self, tenant: Tenant, phone: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as(&format!(
            r#"
            SELECT {CLIENT_COLUMNS} FROM clients
            WHERE company_id = ?1 AND branch_id = ?2 AND phone = ?3 AND status = ?4
            "#
        ))
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(phone.trim())
        .bind(ClientStatus::Active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Replaces profile fields. Accumulators are untouched.
    pub async fn update_profile(
        &self,
        tenant: Tenant,
        id: i64,
        profile: &ClientProfile,
    ) -> DbResult<()> {
        validate_profile(profile)?;

        let result = sqlx::query(
            r#"
            UPDATE clients SET name = ?4, phone = ?5, channel_id = ?6, birth_date = ?7
            WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3 AND status = ?8
            "#,
        )
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(profile.name.trim())
        .bind(profile.phone.trim())
        .bind(nullable_id(profile.channel_id))
        .bind(profile.birth_date)
        .bind(ClientStatus::Active)
        .execute(&self.pool)
        .await
        .map_err(|e| phone_conflict(e, &profile.phone))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }
        Ok(())
    }

    /// Marks a client deleted. Past bookings keep referencing it.
    pub async fn soft_delete(&self, tenant: Tenant, id: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE clients SET status = ?4
            WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3 AND status = ?5
            "#,
        )
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(ClientStatus::Deleted)
        .bind(ClientStatus::Active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }
        Ok(())
    }

    /// Atomically credits bonus points.
    pub async fn add_bonus(&self, tenant: Tenant, id: i64, amount: i64) -> DbResult<()> {
        validate_amount("bonus", amount)?;
        self.increment(tenant, id, "bonus = bonus + ?4", amount).await
    }

    /// Atomically records a visit worth `income`.
    pub async fn record_visit(&self, tenant: Tenant, id: i64, income: i64) -> DbResult<()> {
        validate_amount("income", income)?;
        self.increment(tenant, id, "visits = visits + 1, income = income + ?4", income)
            .await
    }

    /// Atomically spends bonus points; fails without touching the balance
    /// when it is insufficient.
    pub async fn spend_bonus(&self, tenant: Tenant, id: i64, amount: i64) -> DbResult<()> {
        validate_amount("bonus", amount)?;

        let result = sqlx::query(
            r#"
            UPDATE clients SET bonus = bonus - ?4
            WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3 AND status = ?5 AND bonus >= ?4
            "#,
        )
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(amount)
        .bind(ClientStatus::Active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get(tenant, id).await? {
                Some(client) => Err(CoreError::InvalidOperation(format!(
                    "client {id} has {} bonus, cannot spend {amount}",
                    client.bonus
                ))
                .into()),
                None => Err(DbError::not_found("Client", id)),
            };
        }
        Ok(())
    }

    async fn increment(&self, tenant: Tenant, id: i64, set: &str, value: i64) -> DbResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE clients SET {set} WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3 AND status = ?5"
        ))
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(value)
        .bind(ClientStatus::Active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }
        Ok(())
    }
}

/// Credits a completed booking to its client in one statement: bonus,
/// one visit and the booking income.
///
/// Returns `NotFound` when the client is missing or deleted.
pub(crate) async fn accrue_booking(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    client_id: i64,
    bonus: i64,
    income: i64,
) -> DbResult<()> {
    debug!(client_id, bonus, income, "Accruing booking to client");

    let result = sqlx::query(
        r#"
        UPDATE clients SET bonus = bonus + ?4, visits = visits + 1, income = income + ?5
        WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3 AND status = ?6
        "#,
    )
    .bind(client_id)
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(bonus)
    .bind(income)
    .bind(ClientStatus::Active)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Client", client_id));
    }
    Ok(())
}

fn validate_profile(profile: &ClientProfile) -> DbResult<()> {
    validate_name("name", &profile.name)?;
    validate_name("phone", &profile.phone)?;
    Ok(())
}

fn phone_conflict(err: sqlx::Error, phone: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("phone", phone),
        other => other,
    }
}
