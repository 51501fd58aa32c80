//! Per-table report with the payment-type income breakdown.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::facts::ReportFacts;
use super::{average, load_percent, round2, UNSPECIFIED_PAYMENT_TYPE};
use crate::types::VenueTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TableStats {
    pub table_id: i64,
    pub name: String,
    pub revenue: i64,
    pub net_revenue: f64,
    pub avg_check: f64,
    pub load_percent: f64,
    pub visits: i64,
    /// Purchase cost of everything sold at the table.
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTypeIncome {
    pub payment_type_id: Option<i64>,
    pub name: String,
    pub amount: i64,
    pub net_amount: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TablesReport {
    pub tables: Vec<TableStats>,
    pub payment_types: Vec<PaymentTypeIncome>,
}

/// Builds one row per table of the tenant, including idle tables.
pub fn build_tables_report(
    facts: &ReportFacts,
    tables: &[VenueTable],
    business_day_hours: f64,
    day_count: i64,
) -> TablesReport {
    let rows = tables
        .iter()
        .map(|t| {
            let (revenue, net, visits) = facts
                .bookings
                .iter()
                .filter(|b| b.table_id == Some(t.id))
                .fold((0i64, 0.0f64, 0i64), |(r, n, v), b| {
                    (r + b.total_amount, n + b.net_revenue(), v + 1)
                });
            let cost: f64 = facts
                .lines
                .iter()
                .filter(|l| l.table_id == Some(t.id))
                .map(|l| l.cost())
                .sum();

            TableStats {
                table_id: t.id,
                name: t.name.clone(),
                revenue,
                net_revenue: round2(net),
                avg_check: average(net, visits),
                load_percent: load_percent(visits, 1, business_day_hours, day_count),
                visits,
                cost: round2(cost),
            }
        })
        .collect();

    TablesReport {
        tables: rows,
        payment_types: payment_types(facts),
    }
}

fn payment_types(facts: &ReportFacts) -> Vec<PaymentTypeIncome> {
    let mut by_type: HashMap<Option<i64>, PaymentTypeIncome> = HashMap::new();

    for p in &facts.payments {
        let entry = by_type
            .entry(p.payment_type_id)
            .or_insert_with(|| PaymentTypeIncome {
                payment_type_id: p.payment_type_id,
                name: p
                    .payment_type_name
                    .clone()
                    .unwrap_or_else(|| UNSPECIFIED_PAYMENT_TYPE.to_string()),
                amount: 0,
                net_amount: 0.0,
                count: 0,
            });
        entry.amount += p.amount;
        entry.net_amount += p.net();
        entry.count += 1;
    }

    let mut rows: Vec<PaymentTypeIncome> = by_type
        .into_values()
        .map(|mut p| {
            p.net_amount = round2(p.net_amount);
            p
        })
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::facts::fixtures::*;
    use crate::report::facts::PaymentFact;
    use crate::types::CategoryKind;

    fn table(id: i64) -> VenueTable {
        VenueTable {
            id,
            company_id: 1,
            branch_id: 1,
            name: format!("Стол {id}"),
            seats: 4,
        }
    }

    fn payment(booking_id: i64, type_id: Option<i64>, amount: i64, hold: f64) -> PaymentFact {
        PaymentFact {
            booking_id,
            table_id: Some(1),
            payment_type_id: type_id,
            payment_type_name: type_id.map(|id| format!("Type {id}")),
            amount,
            hold_percent: hold,
        }
    }

    #[test]
    fn test_tables_report() {
        let mut b1 = booking(1, None, 1, at(2, 20), 2000);
        b1.hold_percent = 2.5;
        let b2 = booking(2, None, 1, at(2, 22), 1000);
        let facts = ReportFacts {
            lines: vec![line(&b1, 1, CategoryKind::Bar, 2, 1000, 150)],
            bookings: vec![b1, b2],
            payments: vec![
                payment(1, Some(1), 1500, 2.5),
                payment(1, Some(2), 500, 2.5),
                payment(2, None, 1000, 0.0),
            ],
        };
        let report = build_tables_report(&facts, &[table(1), table(2)], 10.0, 1);

        assert_eq!(report.tables.len(), 2);
        let t1 = &report.tables[0];
        assert_eq!(t1.visits, 2);
        assert_eq!(t1.revenue, 3000);
        assert_eq!(t1.net_revenue, 2950.0);
        assert_eq!(t1.avg_check, 1475.0);
        assert_eq!(t1.load_percent, 20.0);
        assert_eq!(t1.cost, 300.0);

        let idle = &report.tables[1];
        assert_eq!(idle.visits, 0);
        assert_eq!(idle.avg_check, 0.0);

        assert_eq!(report.payment_types.len(), 3);
        assert_eq!(report.payment_types[0].amount, 1500);
        assert_eq!(report.payment_types[0].net_amount, 1462.5);
        let unspecified = report
            .payment_types
            .iter()
            .find(|p| p.payment_type_id.is_none())
            .unwrap();
        assert_eq!(unspecified.name, UNSPECIFIED_PAYMENT_TYPE);
    }
}
