//! # Settings Repository
//!
//! One settings row per tenant. A tenant that never saved settings reads
//! [`Settings::defaults_for`].

use lounge_core::validation::{validate_discount, validate_quantity};
use lounge_core::{Settings, Tenant};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

const SETTINGS_COLUMNS: &str = r#"
    company_id, branch_id, payment_type_id, block_time, bonus_percent,
    work_time_from, work_time_to, tables_count, notification_time
"#;

/// Repository for tenant settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Stored settings, or defaults.
    pub async fn get(&self, tenant: Tenant) -> DbResult<Settings> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, tenant).await
    }

    /// Inserts or replaces the tenant's settings.
    pub async fn upsert(&self, settings: &Settings) -> DbResult<()> {
        validate_discount("bonus_percent", settings.bonus_percent)?;
        validate_quantity("tables_count", settings.tables_count)?;
        validate_quantity("block_time", settings.block_time)?;

        debug!(
            company_id = settings.company_id,
            branch_id = settings.branch_id,
            "Saving settings"
        );

        sqlx::query(
            r#"
            INSERT INTO settings (
                company_id, branch_id, payment_type_id, block_time, bonus_percent,
                work_time_from, work_time_to, tables_count, notification_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (company_id, branch_id) DO UPDATE SET
                payment_type_id = excluded.payment_type_id,
                block_time = excluded.block_time,
                bonus_percent = excluded.bonus_percent,
                work_time_from = excluded.work_time_from,
                work_time_to = excluded.work_time_to,
                tables_count = excluded.tables_count,
                notification_time = excluded.notification_time
            "#,
        )
        .bind(settings.company_id)
        .bind(settings.branch_id)
        .bind(settings.payment_type_id)
        .bind(settings.block_time)
        .bind(settings.bonus_percent)
        .bind(settings.work_time_from)
        .bind(settings.work_time_to)
        .bind(settings.tables_count)
        .bind(settings.notification_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub(crate) async fn load(conn: &mut SqliteConnection, tenant: Tenant) -> DbResult<Settings> {
    let settings: Option<Settings> = sqlx::query_as(&format!(
        "SELECT {SETTINGS_COLUMNS} FROM settings WHERE company_id = ?1 AND branch_id = ?2"
    ))
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(settings.unwrap_or_else(|| Settings::defaults_for(tenant)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testing::*;
    use chrono::NaiveTime;

    #[tokio::test]
    async fn test_defaults_then_upsert() {
        let db = db().await;
        let defaults = db.settings().get(TENANT).await.unwrap();
        assert_eq!(defaults, Settings::defaults_for(TENANT));

        let mut settings = defaults.clone();
        settings.bonus_percent = 5;
        settings.work_time_from = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        db.settings().upsert(&settings).await.unwrap();
        settings.tables_count = 8;
        db.settings().upsert(&settings).await.unwrap();

        assert_eq!(db.settings().get(TENANT).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_bonus_percent_bounded() {
        let db = db().await;
        let mut settings = Settings::defaults_for(TENANT);
        settings.bonus_percent = 150;
        assert!(matches!(
            db.settings().upsert(&settings).await,
            Err(DbError::Validation(_))
        ));
    }
}
