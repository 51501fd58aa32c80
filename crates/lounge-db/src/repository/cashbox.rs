//! # Cashbox Repository
//!
//! One balance row per tenant plus an append-only history.
//!
//! ## Mutation Pair
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── ensure cashbox row (INSERT .. ON CONFLICT DO NOTHING)             │
//! │   ├── UPDATE cashbox SET amount = amount ± ?  (never below zero)        │
//! │   ├── INSERT cashbox_history (operation label, |amount|)                │
//! │   └── (replenish only) INSERT expenses under "Касса"                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The balance always equals the signed sum of the history
//! (see [`lounge_core::ledger::reconstruct_balance`]) and never goes
//! negative: a withdrawal larger than the balance fails with
//! `CoreError::InsufficientCash` and changes nothing.

use chrono::{NaiveDate, Utc};
use lounge_core::ledger::{clamp_inventory_amount, CashboxOperation, CASHBOX_EXPENSE_CATEGORY};
use lounge_core::{
    Cashbox, CashboxHistory, CoreError, ExpenseSource, NewExpense, Tenant, ValidationError,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::category::expense_category_id;
use crate::repository::expense::insert_expense;

/// Repository for the cashbox ledger.
#[derive(Debug, Clone)]
pub struct CashboxRepository {
    pool: SqlitePool,
}

impl CashboxRepository {
    /// Creates a new CashboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashboxRepository { pool }
    }

    /// Current cashbox, created with a zero balance on first access.
    pub async fn get(&self, tenant: Tenant) -> DbResult<Cashbox> {
        let mut conn = self.pool.acquire().await?;
        ensure(&mut conn, tenant).await
    }

    /// Takes the whole balance out. Returns the amount taken.
    pub async fn inventory(&self, tenant: Tenant) -> DbResult<i64> {
        self.inventory_amount(tenant, 0).await
    }

    /// Takes `requested` out, clamped to the balance. Returns the amount
    /// taken.
    ///
    /// ## Clamping
    /// ```text
    /// balance 10000, requested 15000 → takes 10000, balance 0
    /// balance 10000, requested     0 → takes 10000, balance 0
    /// balance 10000, requested  2500 → takes  2500, balance 7500
    /// ```
    pub async fn inventory_amount(&self, tenant: Tenant, requested: i64) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let cashbox = ensure(&mut tx, tenant).await?;
        let amount = clamp_inventory_amount(requested, cashbox.amount);
        apply(&mut tx, tenant, CashboxOperation::Inventory, amount).await?;

        tx.commit().await?;

        info!(requested, amount, "Cashbox inventory");
        Ok(amount)
    }

    /// Books a booking payment into the cashbox.
    pub async fn add_income(&self, tenant: Tenant, amount: i64) -> DbResult<()> {
        self.mutate(tenant, CashboxOperation::BookingPayment, amount).await
    }

    /// Reverses a booking payment. Fails with `InsufficientCash` when the
    /// balance does not cover it.
    pub async fn remove_income(&self, tenant: Tenant, amount: i64) -> DbResult<()> {
        self.mutate(tenant, CashboxOperation::BookingRefund, amount).await
    }

    /// Adds cash and books the matching expense under "Касса".
    pub async fn replenish(&self, tenant: Tenant, amount: i64, date: NaiveDate) -> DbResult<()> {
        require_positive(amount)?;

        let mut tx = self.pool.begin().await?;

        ensure(&mut tx, tenant).await?;
        let history_id = apply(&mut tx, tenant, CashboxOperation::Replenishment, amount).await?;

        let category_id = expense_category_id(&mut tx, tenant, CASHBOX_EXPENSE_CATEGORY).await?;
        insert_expense(
            &mut tx,
            tenant,
            &NewExpense {
                date,
                title: CashboxOperation::Replenishment.label().to_string(),
                category_id: Some(category_id),
                total: amount,
                description: None,
                paid: true,
                source_type: Some(ExpenseSource::Cashbox),
                source_id: Some(history_id),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// History rows, oldest first.
    pub async fn history(&self, tenant: Tenant) -> DbResult<Vec<CashboxHistory>> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, company_id, branch_id, operation, amount, created_at
            FROM cashbox_history
            WHERE company_id = ?1 AND branch_id = ?2
            ORDER BY id
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn mutate(&self, tenant: Tenant, op: CashboxOperation, amount: i64) -> DbResult<()> {
        require_positive(amount)?;

        let mut tx = self.pool.begin().await?;
        ensure(&mut tx, tenant).await?;
        apply(&mut tx, tenant, op, amount).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Returns the tenant's cashbox, inserting an empty one if missing.
pub(crate) async fn ensure(conn: &mut SqliteConnection, tenant: Tenant) -> DbResult<Cashbox> {
    sqlx::query(
        r#"
        INSERT INTO cashbox (company_id, branch_id, amount) VALUES (?1, ?2, 0)
        ON CONFLICT (company_id, branch_id) DO NOTHING
        "#,
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .execute(&mut *conn)
    .await?;

    let cashbox = sqlx::query_as(
        "SELECT id, company_id, branch_id, amount FROM cashbox WHERE company_id = ?1 AND branch_id = ?2",
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(cashbox)
}

/// Moves `amount` in the operation's direction and records it. Returns the
/// history row id.
async fn apply(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    op: CashboxOperation,
    amount: i64,
) -> DbResult<i64> {
    debug!(operation = op.label(), amount, "Cashbox mutation");

    let updated = sqlx::query(
        r#"
        UPDATE cashbox SET amount = amount + ?1
        WHERE company_id = ?2 AND branch_id = ?3 AND amount + ?1 >= 0
        "#,
    )
    .bind(op.direction() * amount)
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 0 {
        let balance = ensure(conn, tenant).await?.amount;
        return Err(CoreError::InsufficientCash {
            balance,
            requested: amount,
        }
        .into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO cashbox_history (company_id, branch_id, operation, amount, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(op.label())
    .bind(amount)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

fn require_positive(amount: i64) -> Result<(), ValidationError> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testing::*;
    use lounge_core::ledger::reconstruct_balance;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[tokio::test]
    async fn test_inventory_amount_clamps_to_balance() {
        let db = db().await;
        let cashbox = db.cashbox();
        cashbox.add_income(TENANT, 10000).await.unwrap();

        let taken = cashbox.inventory_amount(TENANT, 15000).await.unwrap();
        assert_eq!(taken, 10000);
        assert_eq!(cashbox.get(TENANT).await.unwrap().amount, 0);

        let history = cashbox.history(TENANT).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.operation, CashboxOperation::Inventory.label());
        assert_eq!(last.amount, 10000);
    }

    #[tokio::test]
    async fn test_balance_matches_history() {
        let db = db().await;
        let cashbox = db.cashbox();
        cashbox.add_income(TENANT, 5000).await.unwrap();
        cashbox.replenish(TENANT, 2000, day()).await.unwrap();
        cashbox.remove_income(TENANT, 1500).await.unwrap();
        cashbox.inventory_amount(TENANT, 1000).await.unwrap();

        let balance = cashbox.get(TENANT).await.unwrap().amount;
        assert_eq!(balance, 4500);
        assert_eq!(reconstruct_balance(&cashbox.history(TENANT).await.unwrap()), balance);

        assert_eq!(cashbox.inventory(TENANT).await.unwrap(), 4500);
        assert_eq!(cashbox.get(TENANT).await.unwrap().amount, 0);
    }

    #[tokio::test]
    async fn test_refund_beyond_balance_rejected() {
        let db = db().await;
        let cashbox = db.cashbox();
        cashbox.add_income(TENANT, 1000).await.unwrap();

        let err = cashbox.remove_income(TENANT, 1500).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Business(CoreError::InsufficientCash {
                balance: 1000,
                requested: 1500
            })
        ));
        assert!(err.is_client_error());

        // Nothing changed, and inventory still works
        assert_eq!(cashbox.get(TENANT).await.unwrap().amount, 1000);
        assert_eq!(cashbox.history(TENANT).await.unwrap().len(), 1);
        assert_eq!(cashbox.inventory(TENANT).await.unwrap(), 1000);
        assert_eq!(cashbox.get(TENANT).await.unwrap().amount, 0);

        // An empty cashbox inventories to zero
        assert_eq!(cashbox.inventory(TENANT).await.unwrap(), 0);
        let history = cashbox.history(TENANT).await.unwrap();
        assert_eq!(reconstruct_balance(&history), 0);
    }

    #[tokio::test]
    async fn test_replenish_books_linked_expense() {
        let db = db().await;
        db.cashbox().replenish(TENANT, 3000, day()).await.unwrap();

        let history = db.cashbox().history(TENANT).await.unwrap();
        let expense = db
            .expenses()
            .find_by_source(TENANT, ExpenseSource::Cashbox, history[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(expense.total, 3000);

        let category = db
            .categories()
            .expense_category(TENANT, CASHBOX_EXPENSE_CATEGORY)
            .await
            .unwrap();
        assert_eq!(expense.category_id, Some(category));
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let db = db().await;
        assert!(matches!(
            db.cashbox().add_income(TENANT, 0).await,
            Err(DbError::Validation(_))
        ));
        assert!(db.cashbox().history(TENANT).await.unwrap().is_empty());
    }
}
