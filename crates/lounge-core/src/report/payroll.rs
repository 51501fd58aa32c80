//! Staff rollups: the admin payroll report and the sales report.
//!
//! Both derive each staff member's [`SalesVolume`] from the same facts and
//! run it through [`calculate_salary`].

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::facts::ReportFacts;
use super::round2;
use crate::salary::{calculate_salary, Compensation, SalaryBreakdown, SalesVolume};
use crate::types::User;
use crate::window::TimeWindow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffPayroll {
    pub user_id: i64,
    pub name: String,
    pub role: String,
    pub shifts: i64,
    pub bookings_count: i64,
    pub revenue: i64,
    pub net_revenue: f64,
    pub hookah_quantity: i64,
    pub hookah_revenue: f64,
    pub set_quantity: i64,
    pub set_revenue: f64,
    pub salary: SalaryBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdminsReport {
    pub admins: Vec<StaffPayroll>,
    pub total_salary: i64,
    pub total_revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemSales {
    pub item_id: i64,
    pub name: String,
    pub category_name: String,
    pub quantity: i64,
    pub revenue: f64,
    pub net_revenue: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub staff: Vec<StaffPayroll>,
    pub items: Vec<ItemSales>,
    pub total_revenue: i64,
    pub net_revenue: f64,
    pub total_salary: i64,
}

/// Derives the sales volume of one staff member.
///
/// A shift is a business day of `window` with at least one booking, so a
/// night that runs past midnight counts once.
pub fn sales_volume(facts: &ReportFacts, user_id: i64, window: &TimeWindow) -> SalesVolume {
    let days: BTreeSet<_> = facts
        .bookings
        .iter()
        .filter(|b| b.user_id == user_id)
        .map(|b| window.business_date(b.start_time))
        .collect();

    let mut volume = SalesVolume {
        shifts_worked: days.len() as i64,
        ..Default::default()
    };
    for l in facts.lines.iter().filter(|l| l.user_id == user_id) {
        if l.is_hookah() {
            volume.hookah_quantity += l.quantity;
            volume.hookah_revenue += l.net();
        } else if l.is_set_line() {
            volume.set_quantity += l.quantity;
            volume.set_revenue += l.net();
        }
    }
    volume
}

fn staff_row(facts: &ReportFacts, user: &User, window: &TimeWindow) -> StaffPayroll {
    let own = facts.for_user(user.id);
    let volume = sales_volume(&own, user.id, window);
    let salary = calculate_salary(&Compensation::from(user), &volume);

    StaffPayroll {
        user_id: user.id,
        name: user.name.clone(),
        role: user.role.clone(),
        shifts: volume.shifts_worked,
        bookings_count: own.bookings.len() as i64,
        revenue: own.total_revenue(),
        net_revenue: round2(own.net_revenue()),
        hookah_quantity: volume.hookah_quantity,
        hookah_revenue: round2(volume.hookah_revenue),
        set_quantity: volume.set_quantity,
        set_revenue: round2(volume.set_revenue),
        salary,
    }
}

/// Payroll for every admin in `users`.
///
/// Admins without bookings in the window still get a zero row.
pub fn build_admins_report(
    facts: &ReportFacts,
    users: &[User],
    window: &TimeWindow,
) -> AdminsReport {
    let admins: Vec<StaffPayroll> = users
        .iter()
        .filter(|u| u.is_admin())
        .map(|u| staff_row(facts, u, window))
        .collect();

    AdminsReport {
        total_salary: admins.iter().map(|a| a.salary.total).sum(),
        total_revenue: admins.iter().map(|a| a.revenue).sum(),
        admins,
    }
}

/// Sales per staff member with bookings in the window, plus per-item sales.
pub fn build_sales_report(
    facts: &ReportFacts,
    users: &[User],
    window: &TimeWindow,
) -> SalesReport {
    let staff: Vec<StaffPayroll> = users
        .iter()
        .map(|u| staff_row(facts, u, window))
        .filter(|row| row.bookings_count > 0)
        .collect();

    let mut by_item: HashMap<i64, ItemSales> = HashMap::new();
    for l in &facts.lines {
        let entry = by_item.entry(l.item_id).or_insert_with(|| ItemSales {
            item_id: l.item_id,
            name: l.item_name.clone(),
            category_name: l.category_name.clone(),
            quantity: 0,
            revenue: 0.0,
            net_revenue: 0.0,
            profit: 0.0,
        });
        entry.quantity += l.quantity;
        entry.revenue += l.gross();
        entry.net_revenue += l.net();
        entry.profit += l.profit();
    }
    let mut items: Vec<ItemSales> = by_item
        .into_values()
        .map(|mut i| {
            i.revenue = round2(i.revenue);
            i.net_revenue = round2(i.net_revenue);
            i.profit = round2(i.profit);
            i
        })
        .collect();
    items.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });

    SalesReport {
        total_salary: staff.iter().map(|s| s.salary.total).sum(),
        total_revenue: facts.total_revenue(),
        net_revenue: round2(facts.net_revenue()),
        staff,
        items,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::facts::fixtures::*;
    use crate::types::{CategoryKind, HookahSalaryType};

    fn user(id: i64, role: &str) -> User {
        User {
            id,
            company_id: 1,
            branch_id: 1,
            name: format!("Staff {id}"),
            phone: String::new(),
            role: role.to_string(),
            salary_shift: 3000,
            salary_hookah: 500,
            salary_bar: 10,
            hookah_salary_type: HookahSalaryType::Fixed,
            permissions: None,
        }
    }

    fn facts() -> ReportFacts {
        let b1 = booking(1, None, 1, at(2, 20), 7500);
        let b2 = booking(2, None, 1, at(2, 23), 2000);
        let b3 = booking(3, None, 1, at(3, 20), 1500);
        let b4 = booking(4, None, 2, at(3, 21), 900);

        let mut set = line(&b1, 10, CategoryKind::Other, 2, 2500, 0);
        set.is_set = true;
        let mut hookah_set = line(&b2, 11, CategoryKind::Other, 1, 2000, 0);
        hookah_set.is_set = true;
        hookah_set.set_has_hookah = true;

        ReportFacts {
            lines: vec![
                line(&b1, 1, CategoryKind::Hookah, 1, 1500, 200),
                line(&b1, 2, CategoryKind::Bar, 2, 500, 100),
                set,
                hookah_set,
                line(&b3, 1, CategoryKind::Hookah, 1, 1500, 200),
                line(&b4, 2, CategoryKind::Bar, 1, 900, 100),
            ],
            bookings: vec![b1, b2, b3, b4],
            payments: Vec::new(),
        }
    }

    fn all_day() -> TimeWindow {
        let d = |day| chrono::NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        TimeWindow::all_day(d(1), d(7)).unwrap()
    }

    #[test]
    fn test_night_past_midnight_is_one_shift() {
        let d = |day| chrono::NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let t = |h| chrono::NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let night = TimeWindow::new(d(1), d(7), t(22), t(4)).unwrap();

        let facts = ReportFacts {
            bookings: vec![
                booking(1, None, 1, at(2, 23), 1000),
                booking(2, None, 1, at(3, 1), 1000),
                booking(3, None, 1, at(4, 23), 1000),
            ],
            lines: Vec::new(),
            payments: Vec::new(),
        };
        assert_eq!(sales_volume(&facts, 1, &night).shifts_worked, 2);
        // Calendar days when the window does not wrap
        assert_eq!(sales_volume(&facts, 1, &all_day()).shifts_worked, 3);
    }

    #[test]
    fn test_sales_volume_classification() {
        let v = sales_volume(&facts(), 1, &all_day());
        assert_eq!(v.shifts_worked, 2);
        assert_eq!(v.hookah_quantity, 3);
        assert_eq!(v.hookah_revenue, 5000.0);
        assert_eq!(v.set_quantity, 2);
        assert_eq!(v.set_revenue, 5000.0);
    }

    #[test]
    fn test_admins_report_only_admins() {
        let users = vec![user(1, "admin"), user(2, "waiter"), user(3, "admin")];
        let report = build_admins_report(&facts(), &users, &all_day());

        assert_eq!(report.admins.len(), 2);
        let first = &report.admins[0];
        assert_eq!(first.user_id, 1);
        assert_eq!(first.shifts, 2);
        // 2 × 3000 + 3 × 500 + 5000 × 10%
        assert_eq!(first.salary.total, 6000 + 1500 + 500);
        assert_eq!(report.admins[1].salary.total, 0);
        assert_eq!(report.total_salary, 8000);
        assert_eq!(report.total_revenue, 11000);
    }

    #[test]
    fn test_sales_report() {
        let users = vec![user(1, "admin"), user(2, "waiter"), user(3, "admin")];
        let report = build_sales_report(&facts(), &users, &all_day());

        assert_eq!(report.staff.len(), 2);
        assert_eq!(report.total_revenue, 11900);
        assert_eq!(report.items[0].item_id, 10);
        assert_eq!(report.items[0].revenue, 5000.0);
        let bar = report.items.iter().find(|i| i.item_id == 2).unwrap();
        assert_eq!(bar.quantity, 3);
    }
}
