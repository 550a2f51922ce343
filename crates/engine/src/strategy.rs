//! Formula catalog: the three interchangeable strategy axes and their
//! Cartesian product. The strategy set is closed: each axis is a small
//! ordered registry, and enumeration order is part of the contract (ties in
//! the variant search resolve to the earliest variant).

use chrono::{Datelike, NaiveDate};
use subrecon_core::ScheduleRow;

// ---------------------------------------------------------------------------
// Day count
// ---------------------------------------------------------------------------

pub trait DayCountStrategy: Sync {
    fn name(&self) -> &'static str;
    fn count(&self, from: NaiveDate, to: NaiveDate) -> i64;
}

/// Calendar difference with near-30 snapping: monthly periods of 25–35 days
/// count as exactly 30, approximating a 30/360 convention the way several
/// bank back-offices do.
pub struct CalendarNear30;

impl DayCountStrategy for CalendarNear30 {
    fn name(&self) -> &'static str {
        "calendar_near30"
    }

    fn count(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        let days = (to - from).num_days();
        if (25..=35).contains(&days) {
            30
        } else {
            days
        }
    }
}

/// Strict 30/360 day count (US convention day adjustments).
pub struct Thirty360;

impl DayCountStrategy for Thirty360 {
    fn name(&self) -> &'static str {
        "thirty360"
    }

    fn count(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        let mut d1 = from.day() as i64;
        let mut d2 = to.day() as i64;
        if d1 == 31 {
            d1 = 30;
        }
        if d2 == 31 && d1 == 30 {
            d2 = 30;
        }
        let years = i64::from(to.year() - from.year());
        let months = i64::from(to.month() as i32 - from.month() as i32);
        360 * years + 30 * months + (d2 - d1)
    }
}

/// Raw calendar difference.
pub struct Calendar;

impl DayCountStrategy for Calendar {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn count(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        (to - from).num_days()
    }
}

// ---------------------------------------------------------------------------
// Subsidy sum
// ---------------------------------------------------------------------------

/// Selects the balance the pro-rata formula accrues on for the period
/// ending at `row`. The formula itself lives in the engine
/// (`balance × rate × day_count / (year_count × RATE_SCALE)`, half-up).
pub trait SubsidySumStrategy: Sync {
    fn name(&self) -> &'static str;
    fn basis_balance(&self, prev: &ScheduleRow, row: &ScheduleRow) -> i64;
}

/// Accrue on the balance the period opened with.
pub struct OpeningBalance;

impl SubsidySumStrategy for OpeningBalance {
    fn name(&self) -> &'static str {
        "opening_balance"
    }

    fn basis_balance(&self, prev: &ScheduleRow, _row: &ScheduleRow) -> i64 {
        prev.principal_debt_balance
    }
}

/// Accrue on the balance reported in the payment row itself.
pub struct PeriodBalance;

impl SubsidySumStrategy for PeriodBalance {
    fn name(&self) -> &'static str {
        "period_balance"
    }

    fn basis_balance(&self, _prev: &ScheduleRow, row: &ScheduleRow) -> i64 {
        row.principal_debt_balance
    }
}

// ---------------------------------------------------------------------------
// Balance check
// ---------------------------------------------------------------------------

/// Roll-forward consistency of the principal balance column. Bank families
/// disagree on where a repayment is reflected and how the first/last rows
/// are written, hence four variants. Returns per-row pass/fail over the
/// sliced payment rows.
pub trait BalanceCheckStrategy: Sync {
    fn name(&self) -> &'static str;
    fn check(&self, rows: &[ScheduleRow], loan_amount: i64) -> Vec<bool>;
}

/// Balance column is the period's opening balance: the next row opens with
/// this row's balance minus this row's repayment.
pub struct RollForward;

impl BalanceCheckStrategy for RollForward {
    fn name(&self) -> &'static str {
        "roll_forward"
    }

    fn check(&self, rows: &[ScheduleRow], loan_amount: i64) -> Vec<bool> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                if i == 0 {
                    row.principal_debt_balance == loan_amount
                } else {
                    let prev = &rows[i - 1];
                    row.principal_debt_balance
                        == prev.principal_debt_balance - prev.principal_debt_repayment_amount
                }
            })
            .collect()
    }
}

/// Balance column already reflects the row's own repayment.
pub struct RollBackward;

impl BalanceCheckStrategy for RollBackward {
    fn name(&self) -> &'static str {
        "roll_backward"
    }

    fn check(&self, rows: &[ScheduleRow], _loan_amount: i64) -> Vec<bool> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                if i == 0 {
                    true
                } else {
                    let prev = &rows[i - 1];
                    row.principal_debt_balance
                        == prev.principal_debt_balance - row.principal_debt_repayment_amount
                }
            })
            .collect()
    }
}

/// First row must carry the untouched loan amount, the final row must roll
/// the balance to zero; interior rows follow the opening-balance rule.
pub struct EdgeAware;

impl BalanceCheckStrategy for EdgeAware {
    fn name(&self) -> &'static str {
        "edge_aware"
    }

    fn check(&self, rows: &[ScheduleRow], loan_amount: i64) -> Vec<bool> {
        let last = rows.len().saturating_sub(1);
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                if i == 0 {
                    row.principal_debt_balance == loan_amount && row.has_no_movement()
                } else if i == last {
                    row.principal_debt_balance - row.principal_debt_repayment_amount == 0
                } else {
                    let prev = &rows[i - 1];
                    row.principal_debt_balance
                        == prev.principal_debt_balance - prev.principal_debt_repayment_amount
                }
            })
            .collect()
    }
}

/// Banks that leave the disbursement row's balance blank (parsed as zero).
pub struct ZeroFirst;

impl BalanceCheckStrategy for ZeroFirst {
    fn name(&self) -> &'static str {
        "zero_first"
    }

    fn check(&self, rows: &[ScheduleRow], loan_amount: i64) -> Vec<bool> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| match i {
                0 => {
                    row.principal_debt_balance == 0 || row.principal_debt_balance == loan_amount
                }
                1 => {
                    row.principal_debt_balance
                        == loan_amount - rows[0].principal_debt_repayment_amount
                }
                _ => {
                    let prev = &rows[i - 1];
                    row.principal_debt_balance
                        == prev.principal_debt_balance - prev.principal_debt_repayment_amount
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// One (day_count, subsidy_sum, balance_check) triple out of the catalog's
/// Cartesian product. `index` is the enumeration position used for
/// tie-breaking.
pub struct CalculationVariant<'a> {
    pub index: usize,
    pub day_count: &'a dyn DayCountStrategy,
    pub subsidy_sum: &'a dyn SubsidySumStrategy,
    pub balance_check: &'a dyn BalanceCheckStrategy,
}

impl CalculationVariant<'_> {
    /// Artifact-naming convention: `{subsidy_sum}_{balance_check}_{day_count}`.
    pub fn name(&self) -> String {
        format!(
            "{}_{}_{}",
            self.subsidy_sum.name(),
            self.balance_check.name(),
            self.day_count.name()
        )
    }
}

/// Static registry of the three strategy axes.
pub struct FormulaCatalog {
    day_counts: Vec<Box<dyn DayCountStrategy>>,
    subsidy_sums: Vec<Box<dyn SubsidySumStrategy>>,
    balance_checks: Vec<Box<dyn BalanceCheckStrategy>>,
}

impl FormulaCatalog {
    pub fn standard() -> Self {
        Self {
            day_counts: vec![Box::new(CalendarNear30), Box::new(Thirty360), Box::new(Calendar)],
            subsidy_sums: vec![Box::new(OpeningBalance), Box::new(PeriodBalance)],
            balance_checks: vec![
                Box::new(RollForward),
                Box::new(RollBackward),
                Box::new(EdgeAware),
                Box::new(ZeroFirst),
            ],
        }
    }

    /// Full Cartesian product in enumeration order.
    pub fn variants(&self) -> Vec<CalculationVariant<'_>> {
        let mut variants = Vec::with_capacity(
            self.subsidy_sums.len() * self.balance_checks.len() * self.day_counts.len(),
        );
        let mut index = 0;
        for subsidy in &self.subsidy_sums {
            for balance in &self.balance_checks {
                for day in &self.day_counts {
                    variants.push(CalculationVariant {
                        index,
                        day_count: day.as_ref(),
                        subsidy_sum: subsidy.as_ref(),
                        balance_check: balance.as_ref(),
                    });
                    index += 1;
                }
            }
        }
        variants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%d.%m.%Y").unwrap()
    }

    #[test]
    fn near30_snaps_only_inside_window() {
        let dc = CalendarNear30;
        assert_eq!(dc.count(date("15.01.2023"), date("14.02.2023")), 30);
        assert_eq!(dc.count(date("15.01.2023"), date("09.02.2023")), 30); // 25 days
        assert_eq!(dc.count(date("15.01.2023"), date("19.02.2023")), 30); // 35 days
        assert_eq!(dc.count(date("15.01.2023"), date("08.02.2023")), 24);
        assert_eq!(dc.count(date("15.01.2023"), date("20.02.2023")), 36);
    }

    #[test]
    fn thirty360_day_adjustments() {
        let dc = Thirty360;
        assert_eq!(dc.count(date("15.01.2023"), date("15.02.2023")), 30);
        assert_eq!(dc.count(date("31.01.2023"), date("28.02.2023")), 28);
        assert_eq!(dc.count(date("31.01.2023"), date("31.03.2023")), 60);
        assert_eq!(dc.count(date("15.01.2023"), date("15.01.2024")), 360);
    }

    #[test]
    fn catalog_enumerates_full_product() {
        let catalog = FormulaCatalog::standard();
        let variants = catalog.variants();
        assert_eq!(variants.len(), 24);
        assert_eq!(variants[0].name(), "opening_balance_roll_forward_calendar_near30");
        assert_eq!(variants[23].name(), "period_balance_zero_first_calendar");
        // Enumeration indices are dense and ordered.
        for (i, v) in variants.iter().enumerate() {
            assert_eq!(v.index, i);
        }
    }

    #[test]
    fn roll_backward_accepts_net_balance_column() {
        let rows = vec![
            ScheduleRow::opening(date("15.01.2023"), 1_000_000),
            ScheduleRow {
                debt_repayment_date: date("15.02.2023"),
                principal_debt_balance: 900_000,
                principal_debt_repayment_amount: 100_000,
                agency_fee_amount: 0,
                recipient_fee_amount: 0,
                total_accrued_fee_amount: 0,
                is_total: false,
            },
        ];
        assert_eq!(RollBackward.check(&rows, 1_000_000), vec![true, true]);
        assert_eq!(RollForward.check(&rows, 1_000_000), vec![true, false]);
    }
}
