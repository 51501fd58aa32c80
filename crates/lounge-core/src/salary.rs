//! # Salary Calculator
//!
//! Shift pay plus commissions for one staff member over one period.
//!
//! ## Formula
//! ```text
//! shift_total  = shifts_worked × salary_shift
//! hookah_total = percent: ⌊hookah_revenue × salary_hookah / 100⌋
//!                fixed:   hookah_quantity × salary_hookah
//! set_total    = ⌊set_revenue × set_commission_percent / 100⌋
//! total        = shift_total + hookah_total + set_total
//! ```
//!
//! Revenue figures arrive already net of line discounts and of each
//! booking's payment hold (see [`crate::report::facts::LineFact::net`]).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{HookahSalaryType, User};

/// Compensation parameters of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compensation {
    pub salary_shift: i64,
    pub salary_hookah: i64,
    pub hookah_salary_type: HookahSalaryType,
    pub set_commission_percent: i64,
}

impl From<&User> for Compensation {
    fn from(user: &User) -> Self {
        Compensation {
            salary_shift: user.salary_shift,
            salary_hookah: user.salary_hookah,
            hookah_salary_type: user.hookah_salary_type,
            set_commission_percent: user.salary_bar,
        }
    }
}

/// What a staff member sold and worked during the period.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SalesVolume {
    /// Distinct calendar days with at least one attributed booking.
    pub shifts_worked: i64,
    pub hookah_quantity: i64,
    pub hookah_revenue: f64,
    pub set_quantity: i64,
    pub set_revenue: f64,
}

/// Computed pay with a human-readable breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBreakdown {
    pub shift_total: i64,
    pub hookah_total: i64,
    pub set_total: i64,
    pub total: i64,
    pub details: String,
}

/// Computes pay for one staff member.
///
/// ## Example
/// ```rust
/// use lounge_core::salary::{calculate_salary, Compensation, SalesVolume};
/// use lounge_core::HookahSalaryType;
///
/// let pay = calculate_salary(
///     &Compensation {
///         salary_shift: 2000,
///         salary_hookah: 20,
///         hookah_salary_type: HookahSalaryType::Percent,
///         set_commission_percent: 0,
///     },
///     &SalesVolume { shifts_worked: 2, hookah_revenue: 9999.0, ..Default::default() },
/// );
/// assert_eq!(pay.hookah_total, 1999); // 1999.8 floors
/// assert_eq!(pay.total, 5999);
/// ```
pub fn calculate_salary(comp: &Compensation, volume: &SalesVolume) -> SalaryBreakdown {
    let shift_total = volume.shifts_worked * comp.salary_shift;

    let (hookah_total, hookah_detail) = match comp.hookah_salary_type {
        HookahSalaryType::Percent => {
            let total = percent_of(volume.hookah_revenue, comp.salary_hookah);
            (
                total,
                format!(
                    "{:.0} × {}% = {}",
                    volume.hookah_revenue, comp.salary_hookah, total
                ),
            )
        }
        HookahSalaryType::Fixed => {
            let total = volume.hookah_quantity * comp.salary_hookah;
            (
                total,
                format!(
                    "{} × {} = {}",
                    volume.hookah_quantity, comp.salary_hookah, total
                ),
            )
        }
    };

    let set_total = percent_of(volume.set_revenue, comp.set_commission_percent);

    SalaryBreakdown {
        shift_total,
        hookah_total,
        set_total,
        total: shift_total + hookah_total + set_total,
        details: format!(
            "Shifts: {} × {} = {}, hookah: {}, sets: {:.0} × {}% = {}",
            volume.shifts_worked,
            comp.salary_shift,
            shift_total,
            hookah_detail,
            volume.set_revenue,
            comp.set_commission_percent,
            set_total
        ),
    }
}

fn percent_of(revenue: f64, percent: i64) -> i64 {
    (revenue * percent as f64 / 100.0).floor() as i64
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> Compensation {
        Compensation {
            salary_shift: 3000,
            salary_hookah: 500,
            hookah_salary_type: HookahSalaryType::Fixed,
            set_commission_percent: 10,
        }
    }

    #[test]
    fn test_fixed_mode() {
        let pay = calculate_salary(
            &fixed(),
            &SalesVolume {
                shifts_worked: 5,
                hookah_quantity: 10,
                hookah_revenue: 12345.0,
                set_quantity: 4,
                set_revenue: 20000.0,
            },
        );
        assert_eq!(pay.shift_total, 15000);
        assert_eq!(pay.hookah_total, 5000);
        assert_eq!(pay.set_total, 2000);
        assert_eq!(pay.total, 22000);
        assert_eq!(
            pay.details,
            "Shifts: 5 × 3000 = 15000, hookah: 10 × 500 = 5000, sets: 20000 × 10% = 2000"
        );
    }

    #[test]
    fn test_percent_mode_floors() {
        let comp = Compensation {
            hookah_salary_type: HookahSalaryType::Percent,
            salary_hookah: 15,
            ..fixed()
        };
        let pay = calculate_salary(
            &comp,
            &SalesVolume {
                shifts_worked: 1,
                hookah_quantity: 3,
                hookah_revenue: 4410.0,
                set_quantity: 1,
                set_revenue: 1999.0,
            },
        );
        // 661.5 → 661, 199.9 → 199
        assert_eq!(pay.hookah_total, 661);
        assert_eq!(pay.set_total, 199);
        assert_eq!(pay.total, 3000 + 661 + 199);
        assert!(pay.details.contains("hookah: 4410 × 15% = 661"));
    }

    #[test]
    fn test_nothing_sold() {
        let pay = calculate_salary(&fixed(), &SalesVolume::default());
        assert_eq!(pay.total, 0);
    }

    #[test]
    fn test_from_user_maps_set_commission() {
        let user = User {
            id: 1,
            company_id: 1,
            branch_id: 1,
            name: "Аня".to_string(),
            phone: "+70000000000".to_string(),
            role: "admin".to_string(),
            salary_shift: 2500,
            salary_hookah: 10,
            salary_bar: 7,
            hookah_salary_type: HookahSalaryType::Percent,
            permissions: None,
        };
        let comp = Compensation::from(&user);
        assert_eq!(comp.set_commission_percent, 7);
        assert_eq!(comp.hookah_salary_type, HookahSalaryType::Percent);
    }
}
