//! # Category Repository
//!
//! Product categories with their business kind, and the separate expense
//! category table used by mirrored expenses.
//!
//! ## Kind Assignment
//! ```text
//! create(tenant, "Кальяны", None)          → kind inferred: hookah
//! create(tenant, "Коктейли", Some(Bar))    → kind as given: bar
//! set_kind(tenant, id, Set)                → stored kind is authoritative
//! ```

use lounge_core::validation::validate_name;
use lounge_core::{Category, CategoryKind, Tenant};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for product and expense categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a product category.
    ///
    /// Without an explicit kind, the kind is inferred from the name once.
    pub async fn create(
        &self,
        tenant: Tenant,
        name: &str,
        kind: Option<CategoryKind>,
    ) -> DbResult<Category> {
        validate_name("name", name)?;
        let name = name.trim();
        let kind = kind.unwrap_or_else(|| CategoryKind::infer_from_name(name));

        debug!(name, ?kind, "Creating category");

        let category = sqlx::query_as(
            r#"
            INSERT INTO categories (company_id, branch_id, name, kind)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, company_id, branch_id, name, kind
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(name)
        .bind(kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("category", name),
            other => other,
        })?;

        Ok(category)
    }

    /// Lists the tenant's product categories by name.
    pub async fn list(&self, tenant: Tenant) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as(
            r#"
            SELECT id, company_id, branch_id, name, kind FROM categories
            WHERE company_id = ?1 AND branch_id = ?2
            ORDER BY name
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Reclassifies a category.
    pub async fn set_kind(&self, tenant: Tenant, id: i64, kind: CategoryKind) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE categories SET kind = ?1 WHERE id = ?2 AND company_id = ?3 AND branch_id = ?4",
        )
        .bind(kind)
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }

    /// Id of the named expense category, created on first use.
    pub async fn expense_category(&self, tenant: Tenant, name: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        expense_category_id(&mut conn, tenant, name).await
    }
}

/// Insert-or-fetch of an expense category.
///
/// Safe under concurrent first use: the unique key makes the insert a
/// no-op for the loser, and both read back the same row.
pub(crate) async fn expense_category_id(
    conn: &mut SqliteConnection,
    tenant: Tenant,
    name: &str,
) -> DbResult<i64> {
    sqlx::query(
        r#"
        INSERT INTO expense_categories (company_id, branch_id, name)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (company_id, branch_id, name) DO NOTHING
        "#,
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(name)
    .execute(&mut *conn)
    .await?;

    let id = sqlx::query_scalar(
        "SELECT id FROM expense_categories WHERE company_id = ?1 AND branch_id = ?2 AND name = ?3",
    )
    .bind(tenant.company_id)
    .bind(tenant.branch_id)
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}
