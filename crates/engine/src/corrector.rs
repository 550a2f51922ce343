//! Local self-correction of near-miss rows.
//!
//! Banks occasionally accrue over a day count one or two days off the
//! convention (a shifted holiday, an inclusive endpoint). Rather than fail
//! the contract, the corrector perturbs the offending row's day count
//! inside a small window and keeps the first offset that reproduces the
//! bank figure.

use subrecon_core::{Contract, ScheduleRow};

use crate::config::EngineConfig;
use crate::engine::{score, subsidy_from_segments, tier_segments};
use crate::model::{ReconciliationResult, UnresolvedDiff};
use crate::strategy::CalculationVariant;
use crate::timeline::RateTimeline;

pub struct CorrectionReport {
    pub corrected: usize,
    pub unresolved: Vec<UnresolvedDiff>,
}

/// Perturb each offending row of the winning result. Offsets are tried in
/// window order; the first one bringing |bank_excel_diff| within tolerance
/// wins. Rows no offset can fix are reported for the mismatch message.
pub fn self_correct(
    result: &mut ReconciliationResult,
    variant: &CalculationVariant<'_>,
    timeline: &RateTimeline,
    contract: &Contract,
    rows: &[ScheduleRow],
    config: &EngineConfig,
) -> CorrectionReport {
    let mut corrected = 0usize;
    let mut unresolved: Vec<UnresolvedDiff> = Vec::new();

    for i in 1..result.rows.len() {
        if result.rows[i].bank_excel_diff.abs() <= config.tolerance_minor {
            continue;
        }

        let prev = &rows[i - 1];
        let row = &rows[i];
        let basis = variant.subsidy_sum.basis_balance(prev, row);
        let base_days = result.rows[i].day_count;
        let mut segments = tier_segments(
            timeline,
            prev.debt_repayment_date,
            row.debt_repayment_date,
            variant.day_count,
            base_days,
        );

        let mut fixed = false;
        for offset in config.correction_offsets() {
            // The perturbation lands on the closing segment; earlier tier
            // segments are pinned by the boundary date.
            let last = segments.len() - 1;
            let original = segments[last].0;
            segments[last].0 = original + offset;
            let subsidy = subsidy_from_segments(basis, &segments, contract.year_count);
            segments[last].0 = original;

            let diff = row.agency_fee_amount - subsidy;
            if diff.abs() <= config.tolerance_minor {
                let target = &mut result.rows[i];
                target.day_count = base_days + offset;
                target.subsidy_sum = subsidy;
                target.bank_excel_diff = diff;
                target.correction_offset = Some(offset);
                corrected += 1;
                fixed = true;
                log::debug!(
                    "contract {}: row {} corrected with day-count offset {}",
                    contract.id,
                    result.rows[i].date,
                    offset
                );
                break;
            }
        }

        if !fixed {
            unresolved.push(UnresolvedDiff {
                date: result.rows[i].date,
                diff_minor: result.rows[i].bank_excel_diff,
            });
        }
    }

    if corrected > 0 {
        result.validation = score(&result.rows, config.tolerance_minor);
    }

    CorrectionReport {
        corrected,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reconcile;
    use crate::error::EngineError;
    use crate::strategy::FormulaCatalog;
    use chrono::NaiveDate;
    use subrecon_core::contract::RateBands;
    use subrecon_core::{Bank, Schedule};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%d.%m.%Y").unwrap()
    }

    fn row(d: &str, balance: i64, repay: i64, agency: i64) -> ScheduleRow {
        ScheduleRow {
            debt_repayment_date: date(d),
            principal_debt_balance: balance,
            principal_debt_repayment_amount: repay,
            agency_fee_amount: agency,
            recipient_fee_amount: 0,
            total_accrued_fee_amount: agency,
            is_total: false,
        }
    }

    fn fixture(agency_second_period: i64) -> (Contract, Schedule, RateTimeline) {
        let contract = Contract {
            id: "c-2".into(),
            bank: Bank::Sberbank,
            start_date: date("15.01.2023"),
            end_date: date("15.01.2030"),
            loan_amount: 10_000_000,
            year_count: 360,
        };
        let timeline = RateTimeline::build(
            contract.start_date,
            contract.end_date,
            &RateBands {
                years_1_3: 1200,
                ..Default::default()
            },
        );
        let rows = vec![
            row("15.01.2023", 10_000_000, 0, 0),
            row("15.02.2023", 9_000_000, 1_000_000, 100_000),
            row("15.03.2023", 8_000_000, 1_000_000, agency_second_period),
        ];
        let mut all = rows;
        let total = ScheduleRow {
            debt_repayment_date: date("15.03.2023"),
            principal_debt_balance: 0,
            principal_debt_repayment_amount: 2_000_000,
            agency_fee_amount: 100_000 + agency_second_period,
            recipient_fee_amount: 0,
            total_accrued_fee_amount: 100_000 + agency_second_period,
            is_total: true,
        };
        all.push(total);
        (contract, Schedule::new(all).unwrap(), timeline)
    }

    #[test]
    fn off_by_two_day_count_is_corrected() {
        // Bank accrued the second period over 28 days instead of the
        // snapped 30: round(9 000 000 × 1200 × 28 / 3 600 000) = 84 000.
        let (contract, schedule, timeline) = fixture(84_000);
        let outcome = reconcile(
            &contract,
            &schedule,
            &timeline,
            &FormulaCatalog::standard(),
            &EngineConfig::default(),
        )
        .unwrap();

        let corrected_row = &outcome.result.rows[2];
        assert_eq!(corrected_row.correction_offset, Some(-2));
        assert_eq!(corrected_row.day_count, 28);
        assert_eq!(corrected_row.bank_excel_diff, 0);
        assert_eq!(outcome.corrected_rows, 1);
        assert!(outcome.unresolved.is_empty());
        assert_eq!(outcome.result.validation.bank_excel_diff_err_cnt, 0);
    }

    #[test]
    fn unfixable_row_raises_with_date_and_decimal_diff() {
        // 50 000 is outside anything the offset window can produce
        // (25..=34 days ⇒ 75 000..=102 000).
        let (contract, schedule, timeline) = fixture(50_000);
        match reconcile(
            &contract,
            &schedule,
            &timeline,
            &FormulaCatalog::standard(),
            &EngineConfig::default(),
        ) {
            Err(EngineError::BankExcelMismatch { message }) => {
                assert!(message.contains("15.03.2023"), "message: {message}");
                assert!(message.contains("-400.00"), "message: {message}");
            }
            other => panic!("expected BankExcelMismatch, got {other:?}"),
        }
    }

    #[test]
    fn opt_out_returns_best_effort_outcome() {
        let (contract, schedule, timeline) = fixture(50_000);
        let config = EngineConfig {
            raise_on_mismatch: false,
            ..Default::default()
        };
        let outcome = reconcile(
            &contract,
            &schedule,
            &timeline,
            &FormulaCatalog::standard(),
            &config,
        )
        .unwrap();
        assert_eq!(outcome.unresolved.len(), 1);
        assert_eq!(outcome.unresolved[0].diff_minor, -40_000);
        assert!(outcome.mismatch_message().unwrap().contains("расхождение"));
    }
}
