//! # Expense Repository
//!
//! Expenses entered by hand and expenses mirrored from repairs, inventory
//! shortages and cashbox replenishments.
//!
//! ## Source Links
//! Mirrored rows carry `(source_type, source_id)`, so the mirror can be
//! updated or removed together with its source without matching on
//! titles or amounts.

use chrono::{NaiveDate, Utc};
use lounge_core::validation::{validate_amount, validate_name};
use lounge_core::{Expense, ExpenseSource, NewExpense, Tenant};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

const EXPENSE_COLUMNS: &str = r#"
    id, company_id, branch_id, date, title, category_id, total,
    description, paid, source_type, source_id
"#;

/// Repository for expenses.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Creates an expense.
    pub async fn create(&self, tenant: Tenant, expense: &NewExpense) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        insert_expense(&mut conn, tenant, expense).await
    }

    /// The expense mirroring a given source row, if any.
    pub async fn find_by_source(
        &self,
        tenant: Tenant,
        source: ExpenseSource,
        source_id: i64,
    ) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS} FROM expenses
            WHERE company_id = ?1 AND branch_id = ?2 AND source_type = ?3 AND source_id = ?4
            "#
        ))
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(source)
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Expenses dated within `[from, to]`, oldest first.
    pub async fn list(&self, tenant: Tenant, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS} FROM expenses
            WHERE company_id = ?1 AND branch_id = ?2 AND date BETWEEN ?3 AND ?4
            ORDER BY date, id
            "#
        ))
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }
}

pub(crate) async fn insert_expense(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    expense: &NewExpense,
) -> DbResult<i64> {
    validate_name("title", &expense.title)?;
    validate_amount("total", expense.total)?;

    debug!(
        title = %expense.title,
        total = expense.total,
        source = ?expense.source_type,
        "Inserting expense"
    );

    let result = sqlx::query(
        r#"
        INSERT INTO expenses (
            company_id, branch_id, date, title, category_id, total,
            description, paid, source_type, source_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(expense.date)
    .bind(expense.title.trim())
    .bind(expense.category_id)
    .bind(expense.total)
    .bind(&expense.description)
    .bind(expense.paid)
    .bind(expense.source_type)
    .bind(expense.source_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Rewrites the mirror of a source row. Returns the rows touched.
pub(crate) async fn update_by_source(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    source: ExpenseSource,
    source_id: i64,
    expense: &NewExpense,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE expenses SET date = ?5, title = ?6, total = ?7, description = ?8
        WHERE company_id = ?1 AND branch_id = ?2 AND source_type = ?3 AND source_id = ?4
        "#,
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(source)
    .bind(source_id)
    .bind(expense.date)
    .bind(expense.title.trim())
    .bind(expense.total)
    .bind(&expense.description)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn delete_by_source(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    source: ExpenseSource,
    source_id: i64,
) -> DbResult<u64> {
    let result = sqlx::query(
        "DELETE FROM expenses WHERE company_id = ?1 AND branch_id = ?2 AND source_type = ?3 AND source_id = ?4",
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(source)
    .bind(source_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::*;

    #[tokio::test]
    async fn test_manual_expense_listed_by_date() {
        let db = db().await;
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        db.expenses()
            .create(
                TENANT,
                &NewExpense {
                    date: day,
                    title: "Уголь".to_string(),
                    category_id: None,
                    total: 1200,
                    description: None,
                    paid: true,
                    source_type: None,
                    source_id: None,
                },
            )
            .await
            .unwrap();

        let listed = db.expenses().list(TENANT, day, day).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].paid);
        assert_eq!(listed[0].source_type, None);

        let next = day.succ_opt().unwrap();
        assert!(db.expenses().list(TENANT, next, next).await.unwrap().is_empty());
    }
}
