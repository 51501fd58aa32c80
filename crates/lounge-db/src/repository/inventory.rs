//! # Inventory Repository
//!
//! Applies physical stock counts to price items or equipment.
//!
//! ## Per-Item Transactions
//! ```text
//! counts: [item 3 → 42] [item 7 → 10] [item 9 → -1]
//!              │              │              │
//!           BEGIN          BEGIN          rejected (negative count)
//!           history        history
//!           expense?       expense?
//!           stock = 42     stock = 10
//!           COMMIT         COMMIT
//!
//! InventoryReport { applied: [3, 7], failed: [9] }
//! ```
//!
//! One failing item never undoes or blocks the others.

use chrono::{NaiveDate, Utc};
use lounge_core::ledger::{
    shortage_description, CountedStock, InventoryFailure, InventoryReport, StockTarget, Variance,
    INVENTORY_EXPENSE_CATEGORY,
};
use lounge_core::{ExpenseSource, NewExpense, Tenant, ValidationError, VarianceRecord};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::category::expense_category_id;
use crate::repository::expense::insert_expense;

/// Table names for a stock target.
struct StockTables {
    entity: &'static str,
    history: &'static str,
    history_key: &'static str,
    unit_cost: &'static str,
    label: &'static str,
    source: ExpenseSource,
}

fn tables(target: StockTarget) -> StockTables {
    match target {
        StockTarget::PriceItem => StockTables {
            entity: "price_items",
            history: "inventory_history",
            history_key: "item_id",
            unit_cost: "buy_price",
            label: "PriceItem",
            source: ExpenseSource::Inventory,
        },
        StockTarget::Equipment => StockTables {
            entity: "equipment",
            history: "equipment_inventory_history",
            history_key: "equipment_id",
            unit_cost: "price",
            label: "Equipment",
            source: ExpenseSource::EquipmentInventory,
        },
    }
}

#[derive(Debug, FromRow)]
struct StockRow {
    name: String,
    quantity: i64,
    unit_cost: i64,
}

/// Repository for stock counts.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Applies every count in its own transaction.
    ///
    /// Per item: write a variance row, book a shortage expense under
    /// "Инвентаризация" when stock is missing, then set stock to the count.
    pub async fn perform_inventory(
        &self,
        tenant: Tenant,
        target: StockTarget,
        counts: &[CountedStock],
        date: NaiveDate,
    ) -> DbResult<InventoryReport> {
        let mut report = InventoryReport::default();

        for count in counts {
            match self.apply_count(tenant, target, *count, date).await {
                Ok(()) => report.applied.push(count.entity_id),
                Err(e) => {
                    warn!(
                        entity_id = count.entity_id,
                        ?target,
                        error = %e,
                        "Inventory count not applied"
                    );
                    report.failed.push(InventoryFailure {
                        entity_id: count.entity_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            applied = report.applied.len(),
            failed = report.failed.len(),
            "Inventory finished"
        );
        Ok(report)
    }

    /// Variance rows for a target, oldest first.
    pub async fn history(&self, tenant: Tenant, target: StockTarget) -> DbResult<Vec<VarianceRecord>> {
        let t = tables(target);
        let rows = sqlx::query_as(&format!(
            r#"
            SELECT id, {key} AS entity_id, expected, actual, difference, created_at
            FROM {history}
            WHERE company_id = ?1 AND branch_id = ?2
            ORDER BY id
            "#,
            key = t.history_key,
            history = t.history,
        ))
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn apply_count(
        &self,
        tenant: Tenant,
        target: StockTarget,
        count: CountedStock,
        date: NaiveDate,
    ) -> DbResult<()> {
        if count.actual < 0 {
            return Err(ValidationError::Negative {
                field: "actual".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;
        apply_in(&mut tx, tenant, target, count, date).await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn apply_in(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    target: StockTarget,
    count: CountedStock,
    date: NaiveDate,
) -> DbResult<()> {
    let t = tables(target);

    let stock: StockRow = sqlx::query_as(&format!(
        r#"
        SELECT name, quantity, {cost} AS unit_cost FROM {entity}
        WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3
        "#,
        cost = t.unit_cost,
        entity = t.entity,
    ))
    .bind(count.entity_id)
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found(t.label, count.entity_id))?;

    let variance = Variance::new(stock.quantity, count.actual);
    debug!(
        entity_id = count.entity_id,
        expected = variance.expected,
        actual = variance.actual,
        "Applying stock count"
    );

    let history_id = sqlx::query(&format!(
        r#"
        INSERT INTO {history} (company_id, branch_id, {key}, expected, actual, difference, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        history = t.history,
        key = t.history_key,
    ))
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(count.entity_id)
    .bind(variance.expected)
    .bind(variance.actual)
    .bind(variance.difference())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    if variance.is_shortage() {
        let category_id = expense_category_id(conn, tenant, INVENTORY_EXPENSE_CATEGORY).await?;
        insert_expense(
            conn,
            tenant,
            &NewExpense {
                date,
                title: INVENTORY_EXPENSE_CATEGORY.to_string(),
                category_id: Some(category_id),
                total: variance.shortage_cost(stock.unit_cost),
                description: Some(shortage_description(&stock.name, variance.shortfall())),
                paid: true,
                source_type: Some(t.source),
                source_id: Some(history_id),
            },
        )
        .await?;
    }

    sqlx::query(&format!(
        "UPDATE {entity} SET quantity = ?1 WHERE id = ?2 AND company_id = ?3 AND branch_id = ?4",
        entity = t.entity,
    ))
    .bind(count.actual)
    .bind(count.entity_id)
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
    }

    #[tokio::test]
    async fn test_shortage_books_expense_and_sets_stock() {
        let db = db().await;
        let f = seed(&db).await;
        // Cola: stock 50, buy price 80
        db.inventory()
            .perform_inventory(
                TENANT,
                StockTarget::PriceItem,
                &[CountedStock { entity_id: f.cola_id, actual: 42 }],
                day(),
            )
            .await
            .unwrap();

        let item = db.catalog().get_price_item(TENANT, f.cola_id).await.unwrap().unwrap();
        assert_eq!(item.quantity, 42);

        let history = db.inventory().history(TENANT, StockTarget::PriceItem).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].difference, -8);

        let expense = db
            .expenses()
            .find_by_source(TENANT, ExpenseSource::Inventory, history[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(expense.total, 8 * 80);
        assert_eq!(expense.description.as_deref(), Some("Недостача: Кола, 8 шт."));
    }

    #[tokio::test]
    async fn test_excess_sets_stock_without_expense() {
        let db = db().await;
        let f = seed(&db).await;
        db.inventory()
            .perform_inventory(
                TENANT,
                StockTarget::PriceItem,
                &[CountedStock { entity_id: f.cola_id, actual: 55 }],
                day(),
            )
            .await
            .unwrap();

        let item = db.catalog().get_price_item(TENANT, f.cola_id).await.unwrap().unwrap();
        assert_eq!(item.quantity, 55);
        assert!(db.expenses().list(TENANT, day(), day()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_item_does_not_block_others() {
        let db = db().await;
        let f = seed(&db).await;

        let report = db
            .inventory()
            .perform_inventory(
                TENANT,
                StockTarget::PriceItem,
                &[
                    CountedStock { entity_id: 9999, actual: 1 },
                    CountedStock { entity_id: f.hookah_id, actual: -1 },
                    CountedStock { entity_id: f.cola_id, actual: 50 },
                ],
                day(),
            )
            .await
            .unwrap();

        assert_eq!(report.applied, vec![f.cola_id]);
        assert_eq!(report.failed.len(), 2);
        assert!(!report.is_complete());

        let hookah = db.catalog().get_price_item(TENANT, f.hookah_id).await.unwrap().unwrap();
        assert_eq!(hookah.quantity, 100);
    }

    #[tokio::test]
    async fn test_equipment_shortage_uses_unit_price() {
        let db = db().await;
        let id = db.catalog().create_equipment(TENANT, "Колба", 10, 700).await.unwrap();

        db.inventory()
            .perform_inventory(
                TENANT,
                StockTarget::Equipment,
                &[CountedStock { entity_id: id, actual: 8 }],
                day(),
            )
            .await
            .unwrap();

        let equipment = db.catalog().get_equipment(TENANT, id).await.unwrap().unwrap();
        assert_eq!(equipment.quantity, 8);

        let history = db.inventory().history(TENANT, StockTarget::Equipment).await.unwrap();
        assert_eq!(history[0].entity_id, id);
        let expense = db
            .expenses()
            .find_by_source(TENANT, ExpenseSource::EquipmentInventory, history[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(expense.total, 1400);
    }
}
