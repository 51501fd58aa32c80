//! # Repair Repository
//!
//! Each repair has exactly one mirrored expense under the "Ремонт"
//! category. Repair and mirror change in the same transaction.
//!
//! ```text
//! create  → INSERT repairs  + INSERT expenses (source = repair, id)
//! update  → UPDATE repairs  + UPDATE expenses WHERE source = (repair, id)
//! delete  → DELETE expenses WHERE source = (repair, id) + DELETE repairs
//! ```

use lounge_core::ledger::REPAIR_EXPENSE_CATEGORY;
use lounge_core::validation::validate_repair;
use lounge_core::{nullable_id, ExpenseSource, NewExpense, NewRepair, Repair, Tenant};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::category::expense_category_id;
use crate::repository::expense::{delete_by_source, insert_expense, update_by_source};

/// Repository for repairs.
#[derive(Debug, Clone)]
pub struct RepairRepository {
    pool: SqlitePool,
}

impl RepairRepository {
    /// Creates a new RepairRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RepairRepository { pool }
    }

    /// Creates a repair and its expense.
    pub async fn create(&self, tenant: Tenant, repair: &NewRepair) -> DbResult<i64> {
        validate_repair(repair)?;

        debug!(title = %repair.title, price = repair.price, "Creating repair");

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO repairs (company_id, branch_id, equipment_id, title, description, price, date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(nullable_id(repair.equipment_id))
        .bind(repair.title.trim())
        .bind(&repair.description)
        .bind(repair.price)
        .bind(repair.date)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let expense = mirror(&mut tx, tenant, id, repair).await?;
        insert_expense(&mut tx, tenant, &expense).await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Updates a repair and its expense.
    pub async fn update(&self, tenant: Tenant, id: i64, repair: &NewRepair) -> DbResult<()> {
        validate_repair(repair)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE repairs SET equipment_id = ?4, title = ?5, description = ?6, price = ?7, date = ?8
            WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3
            "#,
        )
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(nullable_id(repair.equipment_id))
        .bind(repair.title.trim())
        .bind(&repair.description)
        .bind(repair.price)
        .bind(repair.date)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Repair", id));
        }

        let expense = mirror(&mut tx, tenant, id, repair).await?;
        if update_by_source(&mut tx, tenant, ExpenseSource::Repair, id, &expense).await? == 0 {
            warn!(repair_id = id, "Repair had no expense mirror, recreating it");
            insert_expense(&mut tx, tenant, &expense).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a repair and its expense.
    pub async fn delete(&self, tenant: Tenant, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        delete_by_source(&mut tx, tenant, ExpenseSource::Repair, id).await?;

        let result =
            sqlx::query("DELETE FROM repairs WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3")
                .bind(id)
                .bind(tenant.company_id)
                .bind(tenant.branch_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Repair", id));
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, tenant: Tenant, id: i64) -> DbResult<Option<Repair>> {
        let repair = sqlx::query_as(
            r#"
            SELECT id, company_id, branch_id, equipment_id, title, description, price, date
            FROM repairs WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3
            "#,
        )
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(repair)
    }
}

async fn mirror(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    repair_id: i64,
    repair: &NewRepair,
) -> DbResult<NewExpense> {
    let category_id = expense_category_id(conn, tenant, REPAIR_EXPENSE_CATEGORY).await?;

    Ok(NewExpense {
        date: repair.date,
        title: repair.title.trim().to_string(),
        category_id: Some(category_id),
        total: repair.price,
        description: repair.description.clone(),
        paid: true,
        source_type: Some(ExpenseSource::Repair),
        source_id: Some(repair_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::*;
    use chrono::NaiveDate;

    fn repair(price: i64) -> NewRepair {
        NewRepair {
            equipment_id: 0,
            title: "Замена шахты".to_string(),
            description: Some("Треснула".to_string()),
            price,
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_repair_expense_follows_lifecycle() {
        let db = db().await;
        let id = db.repairs().create(TENANT, &repair(2500)).await.unwrap();

        let expense = db
            .expenses()
            .find_by_source(TENANT, ExpenseSource::Repair, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(expense.total, 2500);
        assert!(expense.paid);
        let category = db
            .categories()
            .expense_category(TENANT, REPAIR_EXPENSE_CATEGORY)
            .await
            .unwrap();
        assert_eq!(expense.category_id, Some(category));

        db.repairs().update(TENANT, id, &repair(3100)).await.unwrap();
        let expense = db
            .expenses()
            .find_by_source(TENANT, ExpenseSource::Repair, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(expense.total, 3100);

        db.repairs().delete(TENANT, id).await.unwrap();
        assert!(db.repairs().get(TENANT, id).await.unwrap().is_none());
        assert!(db
            .expenses()
            .find_by_source(TENANT, ExpenseSource::Repair, id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_missing_repair_leaves_expenses_alone() {
        let db = db().await;
        let id = db.repairs().create(TENANT, &repair(900)).await.unwrap();

        assert!(matches!(
            db.repairs().delete(TENANT, id + 1).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(db
            .expenses()
            .find_by_source(TENANT, ExpenseSource::Repair, id)
            .await
            .unwrap()
            .is_some());
    }
}
