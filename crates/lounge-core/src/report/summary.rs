//! Summary report: headline revenue, guests, load, demographics and
//! period-over-period change.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::facts::{BookingFact, ReportFacts};
use super::{age_on, average, load_percent, percent_change, round2};
use crate::types::CategoryKind;
use crate::GUEST_CHANNEL;

const TOP_ITEMS: usize = 10;

/// Inputs the summary needs besides the facts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryContext {
    /// Tables used for capacity.
    pub tables_count: i64,
    /// Length of the configured business day.
    pub business_day_hours: f64,
    /// Calendar days in the window.
    pub day_count: i64,
    /// Reference date for client ages.
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AgeGroups {
    pub under_18: i64,
    pub from_18_to_25: i64,
    pub from_26_to_35: i64,
    pub over_35: i64,
    pub unknown: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChannelShare {
    pub name: String,
    pub clients: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRevenue {
    pub category_id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub quantity: i64,
    pub revenue: f64,
    pub net_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    pub item_id: i64,
    pub name: String,
    pub quantity: i64,
    pub net_revenue: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub total_revenue: i64,
    pub net_revenue: f64,
    pub bookings_count: i64,
    pub clients_count: i64,
    pub avg_check: f64,
    /// Σ (line net − quantity × buy price) over bar categories.
    pub bar_cost: f64,
    /// Σ (line net − quantity × buy price) over hookah categories.
    pub hookah_cost: f64,
    pub load_percent: f64,
    pub age_groups: AgeGroups,
    pub channels: Vec<ChannelShare>,
    pub categories: Vec<CategoryRevenue>,
    pub top_items: Vec<TopItem>,
    pub revenue_change: f64,
    pub clients_change: f64,
    pub avg_check_change: f64,
}

/// Headline figures, computed identically for both periods.
struct Totals {
    revenue: i64,
    net: f64,
    bookings: i64,
    clients: i64,
    avg_check: f64,
}

impl Totals {
    fn of(facts: &ReportFacts) -> Self {
        let net = facts.net_revenue();
        let bookings = facts.bookings.len() as i64;
        Totals {
            revenue: facts.total_revenue(),
            net,
            bookings,
            clients: facts.clients_count(),
            avg_check: average(net, bookings),
        }
    }
}

/// Builds the summary for `current`, comparing against `previous`.
pub fn build_summary(
    current: &ReportFacts,
    previous: &ReportFacts,
    ctx: &SummaryContext,
) -> SummaryReport {
    let now = Totals::of(current);
    let before = Totals::of(previous);

    let margin_of = |kind: CategoryKind| -> f64 {
        round2(
            current
                .lines
                .iter()
                .filter(|l| l.category_kind == kind)
                .map(|l| l.profit())
                .sum(),
        )
    };

    SummaryReport {
        total_revenue: now.revenue,
        net_revenue: round2(now.net),
        bookings_count: now.bookings,
        clients_count: now.clients,
        avg_check: now.avg_check,
        bar_cost: margin_of(CategoryKind::Bar),
        hookah_cost: margin_of(CategoryKind::Hookah),
        load_percent: load_percent(
            now.bookings,
            ctx.tables_count,
            ctx.business_day_hours,
            ctx.day_count,
        ),
        age_groups: age_groups(&current.bookings, ctx.as_of),
        channels: channels(&current.bookings),
        categories: categories(current),
        top_items: top_items(current),
        revenue_change: percent_change(before.revenue as f64, now.revenue as f64),
        clients_change: percent_change(before.clients as f64, now.clients as f64),
        avg_check_change: percent_change(before.avg_check, now.avg_check),
    }
}

/// Distinct clients, once each, bucketed by age.
fn age_groups(bookings: &[BookingFact], as_of: NaiveDate) -> AgeGroups {
    let mut seen = HashSet::new();
    let mut groups = AgeGroups::default();

    for b in bookings {
        let Some(client_id) = b.client_id else {
            continue;
        };
        if !seen.insert(client_id) {
            continue;
        }
        match b.client_birth_date.map(|d| age_on(d, as_of)) {
            None => groups.unknown += 1,
            Some(age) if age < 18 => groups.under_18 += 1,
            Some(age) if age <= 25 => groups.from_18_to_25 += 1,
            Some(age) if age <= 35 => groups.from_26_to_35 += 1,
            Some(_) => groups.over_35 += 1,
        }
    }
    groups
}

/// Distinct clients per acquisition channel; walk-ins and clients without a
/// channel count as guests.
fn channels(bookings: &[BookingFact]) -> Vec<ChannelShare> {
    let mut seen = HashSet::new();
    let mut counts: HashMap<String, i64> = HashMap::new();

    for b in bookings {
        if let Some(client_id) = b.client_id {
            if !seen.insert(client_id) {
                continue;
            }
        }
        let name = match (&b.client_id, &b.channel_name) {
            (Some(_), Some(channel)) => channel.clone(),
            _ => GUEST_CHANNEL.to_string(),
        };
        *counts.entry(name).or_default() += 1;
    }

    let total: i64 = counts.values().sum();
    let mut shares: Vec<ChannelShare> = counts
        .into_iter()
        .map(|(name, clients)| ChannelShare {
            percent: if total > 0 {
                round2(clients as f64 * 100.0 / total as f64)
            } else {
                0.0
            },
            name,
            clients,
        })
        .collect();
    shares.sort_by(|a, b| b.clients.cmp(&a.clients).then_with(|| a.name.cmp(&b.name)));
    shares
}

fn categories(facts: &ReportFacts) -> Vec<CategoryRevenue> {
    let mut by_id: HashMap<i64, CategoryRevenue> = HashMap::new();

    for l in &facts.lines {
        let entry = by_id.entry(l.category_id).or_insert_with(|| CategoryRevenue {
            category_id: l.category_id,
            name: l.category_name.clone(),
            kind: l.category_kind,
            quantity: 0,
            revenue: 0.0,
            net_revenue: 0.0,
        });
        entry.quantity += l.quantity;
        entry.revenue += l.gross();
        entry.net_revenue += l.net();
    }

    let mut rows: Vec<CategoryRevenue> = by_id
        .into_values()
        .map(|mut c| {
            c.revenue = round2(c.revenue);
            c.net_revenue = round2(c.net_revenue);
            c
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    rows
}

fn top_items(facts: &ReportFacts) -> Vec<TopItem> {
    let mut by_id: HashMap<i64, TopItem> = HashMap::new();

    for l in &facts.lines {
        let entry = by_id.entry(l.item_id).or_insert_with(|| TopItem {
            item_id: l.item_id,
            name: l.item_name.clone(),
            quantity: 0,
            net_revenue: 0.0,
            profit: 0.0,
        });
        entry.quantity += l.quantity;
        entry.net_revenue += l.net();
        entry.profit += l.profit();
    }

    let mut rows: Vec<TopItem> = by_id.into_values().collect();
    rows.sort_by(|a, b| {
        b.profit
            .total_cmp(&a.profit)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    rows.truncate(TOP_ITEMS);
    for row in &mut rows {
        row.net_revenue = round2(row.net_revenue);
        row.profit = round2(row.profit);
    }
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================
