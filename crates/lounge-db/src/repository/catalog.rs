//! # Catalog Repository
//!
//! Master data the rest of the venue runs on: price items and sets,
//! payment types, tables, staff, acquisition channels and equipment.
//!
//! ## Sets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price_items (is_set = 1, sale_price = set price)                       │
//! │       │                                                                 │
//! │       └──► set_items  (item_id, quantity, position 0..n)               │
//! │                                                                         │
//! │  buy_price of the set = Σ constituent.buy_price × quantity             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A set and its constituents are written in one transaction.

use lounge_core::validation::{
    validate_amount, validate_hold_percent, validate_id, validate_name, validate_price_set,
    validate_quantity,
};
use lounge_core::{
    nullable_id, Channel, Equipment, NewPriceItem, NewPriceSet, NewUser, PaymentType, PriceItem,
    PriceSet, SetItem, Tenant, User, VenueTable,
};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

const PRICE_ITEM_COLUMNS: &str = r#"
    id, company_id, branch_id, name, category_id, subcategory_id,
    quantity, sale_price, buy_price, is_set
"#;

const USER_COLUMNS: &str = r#"
    id, company_id, branch_id, name, phone, role,
    salary_shift, salary_hookah, salary_bar, hookah_salary_type, permissions
"#;

/// Repository for catalog and staff master data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Price items
    // =========================================================================

    /// Creates a plain (non-set) price item.
    pub async fn create_price_item(&self, tenant: Tenant, item: &NewPriceItem) -> DbResult<i64> {
        validate_name("name", &item.name)?;
        validate_id("category_id", item.category_id)?;
        validate_quantity("quantity", item.quantity)?;
        validate_amount("sale_price", item.sale_price)?;
        validate_amount("buy_price", item.buy_price)?;

        debug!(name = %item.name, category_id = item.category_id, "Creating price item");

        let result = sqlx::query(
            r#"
            INSERT INTO price_items (
                company_id, branch_id, name, category_id, subcategory_id,
                quantity, sale_price, buy_price, is_set
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(item.name.trim())
        .bind(item.category_id)
        .bind(nullable_id(item.subcategory_id))
        .bind(item.quantity)
        .bind(item.sale_price)
        .bind(item.buy_price)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Gets a price item (plain or set).
    pub async fn get_price_item(&self, tenant: Tenant, id: i64) -> DbResult<Option<PriceItem>> {
        let item = sqlx::query_as(&format!(
            "SELECT {PRICE_ITEM_COLUMNS} FROM price_items WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3"
        ))
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists price items, optionally restricted to one category.
    pub async fn list_price_items(
        &self,
        tenant: Tenant,
        category_id: Option<i64>,
    ) -> DbResult<Vec<PriceItem>> {
        let items = sqlx::query_as(&format!(
            r#"
            SELECT {PRICE_ITEM_COLUMNS} FROM price_items
            WHERE company_id = ?1 AND branch_id = ?2
              AND (?3 IS NULL OR category_id = ?3)
            ORDER BY name
            "#
        ))
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    // =========================================================================
    // Sets
    // =========================================================================

    /// Creates a set with its ordered constituents.
    ///
    /// ## Transaction
    /// 1. Insert the set as a price item with `is_set = 1`
    /// 2. Insert constituents with `position` = input order
    /// 3. Derive the set's buy price from its constituents
    pub async fn create_set(&self, tenant: Tenant, set: &NewPriceSet) -> DbResult<i64> {
        validate_price_set(set)?;

        debug!(name = %set.name, items = set.items.len(), "Creating set");

        let mut tx = self.pool.begin().await?;

        let set_id = sqlx::query(
            r#"
            INSERT INTO price_items (
                company_id, branch_id, name, category_id, subcategory_id,
                quantity, sale_price, buy_price, is_set
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, 0, 1)
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(set.name.trim())
        .bind(set.category_id)
        .bind(nullable_id(set.subcategory_id))
        .bind(set.price)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for (position, (item_id, quantity)) in set.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO set_items (set_id, item_id, quantity, position) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(set_id)
            .bind(item_id)
            .bind(quantity)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE price_items SET buy_price = (
                SELECT COALESCE(SUM(p.buy_price * s.quantity), 0)
                FROM set_items s JOIN price_items p ON p.id = s.item_id
                WHERE s.set_id = ?1
            )
            WHERE id = ?1
            "#,
        )
        .bind(set_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(set_id)
    }

    /// Gets a set with its constituents in display order.
    pub async fn get_set(&self, tenant: Tenant, id: i64) -> DbResult<Option<PriceSet>> {
        let Some(item) = self.get_price_item(tenant, id).await? else {
            return Ok(None);
        };
        if !item.is_set {
            return Ok(None);
        }

        let items: Vec<SetItem> = sqlx::query_as(
            r#"
            SELECT id, set_id, item_id, quantity, position FROM set_items
            WHERE set_id = ?1 ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(PriceSet {
            id: item.id,
            name: item.name,
            category_id: item.category_id,
            subcategory_id: item.subcategory_id,
            price: item.sale_price,
            items,
        }))
    }

    // =========================================================================
    // Payment types, tables, channels, subcategories
    // =========================================================================

    pub async fn create_payment_type(
        &self,
        tenant: Tenant,
        name: &str,
        hold_percent: f64,
    ) -> DbResult<i64> {
        validate_name("name", name)?;
        validate_hold_percent(hold_percent)?;

        let result = sqlx::query(
            "INSERT INTO payment_types (company_id, branch_id, name, hold_percent) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(name.trim())
        .bind(hold_percent)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_payment_types(&self, tenant: Tenant) -> DbResult<Vec<PaymentType>> {
        let types = sqlx::query_as(
            r#"
            SELECT id, company_id, branch_id, name, hold_percent FROM payment_types
            WHERE company_id = ?1 AND branch_id = ?2 ORDER BY id
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }

    pub async fn create_table(&self, tenant: Tenant, name: &str, seats: i64) -> DbResult<i64> {
        validate_name("name", name)?;
        validate_quantity("seats", seats)?;

        let result = sqlx::query(
            "INSERT INTO venue_tables (company_id, branch_id, name, seats) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(name.trim())
        .bind(seats)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_tables(&self, tenant: Tenant) -> DbResult<Vec<VenueTable>> {
        let tables = sqlx::query_as(
            r#"
            SELECT id, company_id, branch_id, name, seats FROM venue_tables
            WHERE company_id = ?1 AND branch_id = ?2 ORDER BY id
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    pub async fn create_channel(&self, tenant: Tenant, name: &str) -> DbResult<i64> {
        validate_name("name", name)?;

        let result =
            sqlx::query("INSERT INTO channels (company_id, branch_id, name) VALUES (?1, ?2, ?3)")
                .bind(tenant.company_id)
                .bind(tenant.branch_id)
                .bind(name.trim())
                .execute(&self.pool)
                .await
                .map_err(|e| match DbError::from(e) {
                    DbError::UniqueViolation { .. } => DbError::duplicate("channel", name),
                    other => other,
                })?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_channels(&self, tenant: Tenant) -> DbResult<Vec<Channel>> {
        let channels = sqlx::query_as(
            r#"
            SELECT id, company_id, branch_id, name FROM channels
            WHERE company_id = ?1 AND branch_id = ?2 ORDER BY name
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }

    pub async fn create_subcategory(
        &self,
        tenant: Tenant,
        category_id: i64,
        name: &str,
    ) -> DbResult<i64> {
        validate_name("name", name)?;
        validate_id("category_id", category_id)?;

        let result = sqlx::query(
            "INSERT INTO subcategories (company_id, branch_id, category_id, name) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(category_id)
        .bind(name.trim())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    // =========================================================================
    // Staff
    // =========================================================================

    pub async fn create_user(&self, tenant: Tenant, user: &NewUser) -> DbResult<i64> {
        validate_name("name", &user.name)?;
        validate_name("role", &user.role)?;
        validate_amount("salary_shift", user.salary_shift)?;
        validate_amount("salary_hookah", user.salary_hookah)?;
        validate_amount("salary_bar", user.salary_bar)?;

        debug!(name = %user.name, role = %user.role, "Creating user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (
                company_id, branch_id, name, phone, role,
                salary_shift, salary_hookah, salary_bar, hookah_salary_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(user.name.trim())
        .bind(&user.phone)
        .bind(user.role.trim())
        .bind(user.salary_shift)
        .bind(user.salary_hookah)
        .bind(user.salary_bar)
        .bind(user.hookah_salary_type)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_user(&self, tenant: Tenant, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3"
        ))
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_users(&self, tenant: Tenant) -> DbResult<Vec<User>> {
        let users = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE company_id = ?1 AND branch_id = ?2 ORDER BY id"
        ))
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // =========================================================================
    // Equipment
    // =========================================================================

    pub async fn create_equipment(
        &self,
        tenant: Tenant,
        name: &str,
        quantity: i64,
        price: i64,
    ) -> DbResult<i64> {
        validate_name("name", name)?;
        validate_quantity("quantity", quantity)?;
        validate_amount("price", price)?;

        let result = sqlx::query(
            "INSERT INTO equipment (company_id, branch_id, name, quantity, price) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .bind(name.trim())
        .bind(quantity)
        .bind(price)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_equipment(&self, tenant: Tenant, id: i64) -> DbResult<Option<Equipment>> {
        let equipment = sqlx::query_as(
            r#"
            SELECT id, company_id, branch_id, name, quantity, price FROM equipment
            WHERE id = ?1 AND company_id = ?2 AND branch_id = ?3
            "#,
        )
        .bind(id)
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(equipment)
    }

    pub async fn list_equipment(&self, tenant: Tenant) -> DbResult<Vec<Equipment>> {
        let equipment = sqlx::query_as(
            r#"
            SELECT id, company_id, branch_id, name, quantity, price FROM equipment
            WHERE company_id = ?1 AND branch_id = ?2 ORDER BY name
            "#,
        )
        .bind(tenant.company_id)
        .bind(tenant.branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(equipment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::*;

    #[tokio::test]
    async fn test_set_keeps_order_and_derives_cost() {
        let db = db().await;
        let f = seed(&db).await;
        let sets = db.categories().create(TENANT, "Сеты", None).await.unwrap();

        let set_id = db
            .catalog()
            .create_set(
                TENANT,
                &NewPriceSet {
                    name: "Кальян + 2 колы".to_string(),
                    category_id: sets.id,
                    subcategory_id: 0,
                    price: 1800,
                    items: vec![(f.hookah_id, 1), (f.cola_id, 2)],
                },
            )
            .await
            .unwrap();

        let set = db.catalog().get_set(TENANT, set_id).await.unwrap().unwrap();
        assert_eq!(set.price, 1800);
        let order: Vec<(i64, i64)> = set.items.iter().map(|s| (s.item_id, s.position)).collect();
        assert_eq!(order, vec![(f.hookah_id, 0), (f.cola_id, 1)]);

        let item = db.catalog().get_price_item(TENANT, set_id).await.unwrap().unwrap();
        assert!(item.is_set);
        assert_eq!(item.buy_price, 300 + 2 * 80);
    }

    #[tokio::test]
    async fn test_set_requires_constituents() {
        let db = db().await;
        let sets = db.categories().create(TENANT, "Сеты", None).await.unwrap();
        let err = db
            .catalog()
            .create_set(
                TENANT,
                &NewPriceSet {
                    name: "Пустой".to_string(),
                    category_id: sets.id,
                    subcategory_id: 0,
                    price: 100,
                    items: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_plain_item_is_not_a_set() {
        let db = db().await;
        let f = seed(&db).await;
        assert!(db.catalog().get_set(TENANT, f.cola_id).await.unwrap().is_none());

        let items = db.catalog().list_price_items(TENANT, None).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_hold_percent_is_validated() {
        let db = db().await;
        assert!(db.catalog().create_payment_type(TENANT, "Карта", 2.5).await.is_ok());
        assert!(matches!(
            db.catalog().create_payment_type(TENANT, "Странная", 120.0).await,
            Err(DbError::Validation(_))
        ));

        let types = db.catalog().list_payment_types(TENANT).await.unwrap();
        assert_eq!(types.len(), 1);
        assert!((types[0].hold_percent - 2.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_users_round_trip() {
        let db = db().await;
        let f = seed(&db).await;
        let user = db.catalog().get_user(TENANT, f.user_id).await.unwrap().unwrap();
        assert!(user.is_admin());
        assert_eq!(user.salary_shift, 3000);
        assert_eq!(db.catalog().list_users(TENANT).await.unwrap().len(), 1);
    }
}
