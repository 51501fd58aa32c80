//! # Demo Data
//!
//! Populates one tenant with a small, deterministic venue.
//!
//! ## Usage
//! ```bash
//! # Two weeks of bookings ending today
//! lounge seed
//!
//! # A month, against a specific database
//! LOUNGE_DATABASE_PATH=./data/lounge.db lounge seed --days 30
//! ```
//!
//! ## Generated Data
//! - Settings: 5% bonus, business day 12:00 → 04:00
//! - Payment types: cash, card (2.5% hold), transfer (1% hold)
//! - Categories: hookahs, bar, kitchen, sets (kinds inferred from names)
//! - Price items, one set containing a hookah, equipment
//! - Two admins (fixed and percent hookah pay) and a waiter
//! - Four tables, acquisition channels, clients
//! - Bookings on every day, some discounted, some split across payment
//!   types, some walk-ins
//! - Cashbox float plus cash income, one repair, one stock count

use anyhow::{bail, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use lounge_core::ledger::{CountedStock, StockTarget};
use lounge_core::{
    BookingInput, BookingItemInput, BookingPaymentInput, ClientProfile, HookahSalaryType,
    NewPriceItem, NewPriceSet, NewRepair, NewUser, PaymentStatus, Settings, Tenant,
};
use lounge_db::{BookingPolicy, BookingService, Database};
use serde::Serialize;
use tracing::{debug, info};

/// Bookings with a discount: every n-th.
const DISCOUNT_EVERY: usize = 5;

/// (name, category index, stock, sale price, buy price)
const ITEMS: &[(&str, usize, i64, i64, i64)] = &[
    ("Кальян классический", 0, 200, 1500, 300),
    ("Кальян на фрукте", 0, 100, 2200, 550),
    ("Кола", 1, 120, 250, 80),
    ("Лимонад домашний", 1, 60, 450, 120),
    ("Чай улун", 1, 80, 600, 90),
    ("Сэндвич", 2, 40, 520, 210),
    ("Картофель фри", 2, 40, 380, 110),
];

const CATEGORIES: &[&str] = &["Кальяны", "Бар", "Кухня", "Сеты"];

/// (name, phone, channel index, birth year)
const CLIENTS: &[(&str, &str, Option<usize>, Option<i32>)] = &[
    ("Мария", "+79110000001", Some(0), Some(1999)),
    ("Игорь", "+79110000002", Some(1), Some(1987)),
    ("Дина", "+79110000003", None, Some(2007)),
    ("Артём", "+79110000004", Some(0), None),
];

/// What the seed created.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub price_items: usize,
    pub clients: usize,
    pub bookings: usize,
    /// Bookings stored whose client credit failed.
    pub degraded_credits: usize,
}

/// Ids the booking generator draws from.
struct Catalog {
    admins: Vec<i64>,
    tables: Vec<i64>,
    clients: Vec<i64>,
    payment_types: Vec<i64>,
    /// (id, sale price)
    items: Vec<(i64, i64)>,
    set: (i64, i64),
}

/// Seeds `days` days of activity ending on `today`.
///
/// Refuses to run on a tenant that already has categories.
pub async fn run(
    db: &Database,
    tenant: Tenant,
    policy: BookingPolicy,
    days: i64,
    today: NaiveDate,
) -> Result<SeedSummary> {
    if days < 1 {
        bail!("--days must be at least 1");
    }
    if !db.categories().list(tenant).await?.is_empty() {
        bail!(
            "tenant {}/{} already has data; seed an empty database",
            tenant.company_id,
            tenant.branch_id
        );
    }

    info!(days, "Seeding demo data");
    let catalog = catalog(db, tenant).await?;
    db.cashbox().replenish(tenant, 10_000, today).await?;
    let mut summary = SeedSummary {
        price_items: catalog.items.len() + 1,
        clients: catalog.clients.len(),
        ..Default::default()
    };

    let service = BookingService::new(db.clone(), policy);
    let first = today - Duration::days(days - 1);
    let mut n = 0usize;
    for offset in 0..days {
        let date = first + Duration::days(offset);
        // Busier towards the weekend
        let per_day = 1 + (offset as usize % 4);
        for slot in 0..per_day {
            let input = booking(&catalog, date, slot, n);
            let outcome = service.create(tenant, &input).await?;
            if outcome.is_degraded() {
                summary.degraded_credits += 1;
            }
            if input.payment_status == PaymentStatus::Paid && input.payments.is_empty() {
                db.cashbox().add_income(tenant, input.total_amount).await?;
            }
            n += 1;
        }
    }
    summary.bookings = n;

    db.repairs()
        .create(
            tenant,
            &NewRepair {
                equipment_id: 0,
                title: "Замена уплотнителей".to_string(),
                description: Some("Колбы 3 и 4".to_string()),
                price: 1800,
                date: today,
            },
        )
        .await?;

    // One lemonade short at the count
    let (lemonade, _) = catalog.items[3];
    db.inventory()
        .perform_inventory(
            tenant,
            StockTarget::PriceItem,
            &[CountedStock {
                entity_id: lemonade,
                actual: ITEMS[3].2 - 1,
            }],
            today,
        )
        .await?;

    info!(bookings = summary.bookings, degraded = summary.degraded_credits, "Seed complete");
    Ok(summary)
}

async fn catalog(db: &Database, tenant: Tenant) -> Result<Catalog> {
    let mut settings = Settings::defaults_for(tenant);
    settings.bonus_percent = 5;
    settings.work_time_from = time(12, 0);
    settings.work_time_to = time(4, 0);
    db.settings().upsert(&settings).await?;

    let repo = db.catalog();
    let payment_types = vec![
        repo.create_payment_type(tenant, "Наличные", 0.0).await?,
        repo.create_payment_type(tenant, "Карта", 2.5).await?,
        repo.create_payment_type(tenant, "Перевод", 1.0).await?,
    ];
    let channels = vec![
        repo.create_channel(tenant, "Instagram").await?,
        repo.create_channel(tenant, "Рекомендация").await?,
    ];

    let mut categories = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let category = db.categories().create(tenant, name, None).await?;
        debug!(name, kind = ?category.kind, "Category");
        categories.push(category.id);
    }

    let mut items = Vec::with_capacity(ITEMS.len());
    for &(name, category, quantity, sale_price, buy_price) in ITEMS {
        let id = repo
            .create_price_item(
                tenant,
                &NewPriceItem {
                    name: name.to_string(),
                    category_id: categories[category],
                    subcategory_id: 0,
                    quantity,
                    sale_price,
                    buy_price,
                },
            )
            .await?;
        items.push((id, sale_price));
    }

    let set_price = 2000;
    let set = repo
        .create_set(
            tenant,
            &NewPriceSet {
                name: "Сет вечерний".to_string(),
                category_id: categories[3],
                subcategory_id: 0,
                price: set_price,
                items: vec![(items[0].0, 1), (items[2].0, 2)],
            },
        )
        .await?;

    let staff = |name: &str, role: &str, hookah: i64, kind| NewUser {
        name: name.to_string(),
        phone: String::new(),
        role: role.to_string(),
        salary_shift: 2500,
        salary_hookah: hookah,
        salary_bar: 10,
        hookah_salary_type: kind,
    };
    let admins = vec![
        repo.create_user(tenant, &staff("Анна", "admin", 150, HookahSalaryType::Fixed)).await?,
        repo.create_user(tenant, &staff("Тимур", "admin", 10, HookahSalaryType::Percent)).await?,
    ];
    repo.create_user(tenant, &staff("Олег", "waiter", 0, HookahSalaryType::Fixed))
        .await?;

    let mut tables = Vec::new();
    for (name, seats) in [("Стол 1", 4), ("Стол 2", 4), ("Диван", 6), ("VIP", 8)] {
        tables.push(repo.create_table(tenant, name, seats).await?);
    }
    repo.create_equipment(tenant, "Колба", 12, 900).await?;
    repo.create_equipment(tenant, "Чаша глиняная", 20, 350).await?;

    let mut clients = Vec::with_capacity(CLIENTS.len());
    for &(name, phone, channel, birth_year) in CLIENTS {
        let id = db
            .clients()
            .create(
                tenant,
                &ClientProfile {
                    name: name.to_string(),
                    phone: phone.to_string(),
                    channel_id: channel.map(|c| channels[c]).unwrap_or(0),
                    birth_date: birth_year.and_then(|y| NaiveDate::from_ymd_opt(y, 6, 15)),
                },
            )
            .await?;
        clients.push(id);
    }

    Ok(Catalog {
        admins,
        tables,
        clients,
        payment_types,
        items,
        set: (set, set_price),
    })
}

/// The `n`-th booking overall, `slot`-th of its day. Every slot of a day
/// gets its own table.
fn booking(c: &Catalog, date: NaiveDate, slot: usize, n: usize) -> BookingInput {
    let start = at(date, 18 + (n % 4) as u32);
    let end = start + Duration::hours(3);

    let mut items = vec![
        line(c.items[n % 2], 1),
        line(c.items[2 + n % 3], 1 + (n % 2) as i64),
    ];
    if n % 3 == 0 {
        items.push(line(c.items[5 + n % 2], 1));
    }
    if n % 4 == 1 {
        items.push(line(c.set, 1));
    }

    let (discount, discount_reason) = if n % (2 * DISCOUNT_EVERY) == 2 * DISCOUNT_EVERY - 1 {
        (15, Some("День рождения".to_string()))
    } else if n % DISCOUNT_EVERY == DISCOUNT_EVERY - 1 {
        (10, Some("Постоянный гость".to_string()))
    } else {
        (0, None)
    };

    let subtotal: i64 = items.iter().map(|i| i.price * i.quantity).sum();
    let total_amount = subtotal * (100 - discount) / 100;

    let (cash, card) = (c.payment_types[0], c.payment_types[1]);
    let (payment_type_id, payments) = match n % 3 {
        0 => (cash, Vec::new()),
        1 => (card, Vec::new()),
        _ => {
            let half = total_amount / 2;
            (
                card,
                vec![
                    BookingPaymentInput { payment_type_id: cash, amount: half },
                    BookingPaymentInput { payment_type_id: card, amount: total_amount - half },
                ],
            )
        }
    };

    // Every fifth guest is a walk-in
    let client_slot = n % (c.clients.len() + 1);
    let client_id = c.clients.get(client_slot).copied().unwrap_or(0);

    BookingInput {
        client_id,
        table_id: c.tables[slot % c.tables.len()],
        user_id: c.admins[date.ordinal() as usize % c.admins.len()],
        start_time: start,
        end_time: end,
        note: None,
        discount,
        discount_reason,
        total_amount,
        bonus_used: 0,
        payment_status: PaymentStatus::Paid,
        payment_type_id,
        items,
        payments,
    }
}

fn line((item_id, price): (i64, i64), quantity: i64) -> BookingItemInput {
    BookingItemInput {
        item_id,
        quantity,
        price,
        discount: 0,
    }
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

fn at(date: NaiveDate, h: u32) -> NaiveDateTime {
    date.and_time(time(h, 0))
}
