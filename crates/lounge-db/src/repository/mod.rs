//! # Repository Module
//!
//! Database repository implementations for Lounge.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service / CLI                                                          │
//! │       │  db.bookings().get_by_id(tenant, 42)                            │
//! │       ▼                                                                 │
//! │  BookingRepository { pool }                                             │
//! │  ├── pub async fn ...(&self, tenant, ...)   ← one call, own connection  │
//! │  └── pub(crate) async fn ...(conn, ...)     ← composable inside a tx    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method takes an explicit [`Tenant`](lounge_core::Tenant); there is
//! no ambient tenant lookup. Multi-statement helpers take a
//! `&mut SqliteConnection` so a caller can run several of them inside one
//! transaction (`&mut *tx`).
//!
//! ## Available Repositories
//!
//! - [`BookingRepository`] - Bookings, lines, payments, availability
//! - [`ClientRepository`] - Clients and atomic loyalty accumulators
//! - [`CatalogRepository`] - Price items, sets, payment types, tables, staff
//! - [`CategoryRepository`] - Categories and insert-or-fetch expense categories
//! - [`CashboxRepository`] - Balance + history ledger
//! - [`ExpenseRepository`] - Expenses with source links
//! - [`RepairRepository`] - Repairs mirrored into expenses
//! - [`InventoryRepository`] - Stock counts and variance
//! - [`SettingsRepository`] - Per-tenant settings
//! - [`ReportRepository`] - Fact rows for reports

pub mod booking;
pub mod cashbox;
pub mod catalog;
pub mod category;
pub mod client;
pub mod expense;
pub mod inventory;
pub mod repair;
pub mod report;
pub mod settings;

pub use booking::BookingRepository;
pub use cashbox::CashboxRepository;
pub use catalog::CatalogRepository;
pub use category::CategoryRepository;
pub use client::ClientRepository;
pub use expense::ExpenseRepository;
pub use inventory::InventoryRepository;
pub use repair::RepairRepository;
pub use report::ReportRepository;
pub use settings::SettingsRepository;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for repository and service tests.

    use chrono::{NaiveDate, NaiveDateTime};
    use lounge_core::{
        BookingInput, BookingItemInput, CategoryKind, HookahSalaryType, NewPriceItem, NewUser,
        PaymentStatus, Tenant,
    };

    use crate::{Database, DbConfig};

    pub const TENANT: Tenant = Tenant::new(1, 1);

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    /// Ids of the minimal fixture graph.
    pub struct Fixture {
        pub user_id: i64,
        pub table_id: i64,
        pub hookah_id: i64,
        pub cola_id: i64,
    }

    /// One admin, one table, a hookah and a drink.
    pub async fn seed(db: &Database) -> Fixture {
        let user_id = db
            .catalog()
            .create_user(
                TENANT,
                &NewUser {
                    name: "Аня".to_string(),
                    phone: "+70000000001".to_string(),
                    role: "admin".to_string(),
                    salary_shift: 3000,
                    salary_hookah: 500,
                    salary_bar: 10,
                    hookah_salary_type: HookahSalaryType::Fixed,
                },
            )
            .await
            .unwrap();
        let table_id = db.catalog().create_table(TENANT, "Стол 1", 4).await.unwrap();

        let hookahs = db
            .categories()
            .create(TENANT, "Кальяны", None)
            .await
            .unwrap();
        assert_eq!(hookahs.kind, CategoryKind::Hookah);
        let bar = db.categories().create(TENANT, "Бар", None).await.unwrap();

        let hookah_id = db
            .catalog()
            .create_price_item(
                TENANT,
                &NewPriceItem {
                    name: "Кальян классический".to_string(),
                    category_id: hookahs.id,
                    subcategory_id: 0,
                    quantity: 100,
                    sale_price: 1500,
                    buy_price: 300,
                },
            )
            .await
            .unwrap();
        let cola_id = db
            .catalog()
            .create_price_item(
                TENANT,
                &NewPriceItem {
                    name: "Кола".to_string(),
                    category_id: bar.id,
                    subcategory_id: 0,
                    quantity: 50,
                    sale_price: 250,
                    buy_price: 80,
                },
            )
            .await
            .unwrap();

        Fixture {
            user_id,
            table_id,
            hookah_id,
            cola_id,
        }
    }

    pub fn booking_input(f: &Fixture, start: NaiveDateTime, end: NaiveDateTime) -> BookingInput {
        BookingInput {
            client_id: 0,
            table_id: f.table_id,
            user_id: f.user_id,
            start_time: start,
            end_time: end,
            note: None,
            discount: 0,
            discount_reason: None,
            total_amount: 2000,
            bonus_used: 0,
            payment_status: PaymentStatus::Unpaid,
            payment_type_id: 0,
            items: vec![
                BookingItemInput {
                    item_id: f.hookah_id,
                    quantity: 1,
                    price: 1500,
                    discount: 0,
                },
                BookingItemInput {
                    item_id: f.cola_id,
                    quantity: 2,
                    price: 250,
                    discount: 0,
                },
            ],
            payments: Vec::new(),
        }
    }
}
