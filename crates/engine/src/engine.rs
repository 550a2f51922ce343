//! Variant search: apply every formula-catalog combination to the sliced
//! schedule, score each candidate, keep the best.

use chrono::NaiveDate;
use subrecon_core::{round_half_up, Contract, Schedule, ScheduleRow, RATE_SCALE};

use crate::config::EngineConfig;
use crate::corrector::self_correct;
use crate::error::EngineError;
use crate::model::{ComputedRow, ReconOutcome, ReconciliationResult, RunMeta, ValidationResult};
use crate::strategy::{CalculationVariant, DayCountStrategy, FormulaCatalog};
use crate::timeline::RateTimeline;

/// Slice the payment rows to the subsidy period. When no row falls on the
/// period start, a synthetic opening row is spliced in: an immediately
/// preceding row that already carries the untouched loan amount is re-dated,
/// otherwise a fresh row is inserted and everything before it dropped.
fn slice_to_period(
    payment_rows: &[ScheduleRow],
    contract: &Contract,
) -> Result<Vec<ScheduleRow>, EngineError> {
    let mut rows: Vec<ScheduleRow> = payment_rows
        .iter()
        .filter(|r| r.debt_repayment_date <= contract.end_date)
        .cloned()
        .collect();

    if let Some(pos) = rows
        .iter()
        .position(|r| r.debt_repayment_date == contract.start_date)
    {
        rows.drain(..pos);
    } else {
        let insert_at = rows
            .iter()
            .position(|r| r.debt_repayment_date > contract.start_date)
            .unwrap_or(rows.len());
        let reusable = insert_at > 0
            && rows[insert_at - 1].principal_debt_balance == contract.loan_amount
            && rows[insert_at - 1].has_no_movement();
        if reusable {
            rows[insert_at - 1].debt_repayment_date = contract.start_date;
            rows.drain(..insert_at - 1);
        } else {
            rows.drain(..insert_at);
            rows.insert(
                0,
                ScheduleRow::opening(contract.start_date, contract.loan_amount),
            );
        }
    }

    if rows.len() < 2 {
        return Err(EngineError::EmptyPeriod {
            contract_id: contract.id.clone(),
        });
    }
    Ok(rows)
}

/// Split an accrual period `(from, to]` into per-tier (day_count, rate)
/// segments. Partial day counts are anchored on cumulative counts from the
/// period start, so they always sum exactly to `total_days`.
pub(crate) fn tier_segments(
    timeline: &RateTimeline,
    from: NaiveDate,
    to: NaiveDate,
    day_count: &dyn DayCountStrategy,
    total_days: i64,
) -> Vec<(i64, i64)> {
    let crossings = timeline.crossings(from, to);
    if crossings.is_empty() {
        return vec![(total_days, timeline.rate_on(to))];
    }

    let mut segments = Vec::with_capacity(crossings.len() + 1);
    let mut consumed = 0i64;
    for boundary in crossings {
        let last_old_day = boundary.pred_opt().unwrap_or(boundary);
        let cumulative = day_count.count(from, last_old_day);
        segments.push(((cumulative - consumed).max(0), timeline.rate_on(last_old_day)));
        consumed = cumulative;
    }
    segments.push(((total_days - consumed).max(0), timeline.rate_on(to)));
    segments
}

/// Pro-rata subsidy over tier segments, each half rounded half-up and then
/// summed: `Σ round(balance × rateᵢ × daysᵢ / (year_count × RATE_SCALE))`.
pub(crate) fn subsidy_from_segments(balance: i64, segments: &[(i64, i64)], year_count: u32) -> i64 {
    let den = i128::from(year_count) * i128::from(RATE_SCALE);
    segments
        .iter()
        .map(|&(days, rate)| round_half_up(i128::from(balance) * i128::from(rate) * i128::from(days), den))
        .sum()
}

fn compute_variant(
    variant: &CalculationVariant<'_>,
    rows: &[ScheduleRow],
    timeline: &RateTimeline,
    contract: &Contract,
    config: &EngineConfig,
) -> ReconciliationResult {
    let balance_flags = variant.balance_check.check(rows, contract.loan_amount);

    let mut computed: Vec<ComputedRow> = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let (day_count, subsidy_sum) = if i == 0 {
            // Anchor row: opens the period, accrues nothing.
            (0, 0)
        } else {
            let prev = &rows[i - 1];
            let days = variant
                .day_count
                .count(prev.debt_repayment_date, row.debt_repayment_date);
            let basis = variant.subsidy_sum.basis_balance(prev, row);
            let segments = tier_segments(
                timeline,
                prev.debt_repayment_date,
                row.debt_repayment_date,
                variant.day_count,
                days,
            );
            (days, subsidy_from_segments(basis, &segments, contract.year_count))
        };

        let tier = timeline.tier_on(row.debt_repayment_date);
        computed.push(ComputedRow {
            date: row.debt_repayment_date,
            principal_debt_balance: row.principal_debt_balance,
            principal_debt_repayment_amount: row.principal_debt_repayment_amount,
            agency_fee_amount: row.agency_fee_amount,
            recipient_fee_amount: row.recipient_fee_amount,
            total_accrued_fee_amount: row.total_accrued_fee_amount,
            tier_index: tier.index,
            rate: tier.rate,
            day_count,
            subsidy_sum,
            bank_excel_diff: if i == 0 { 0 } else { row.agency_fee_amount - subsidy_sum },
            check_total: row.agency_fee_amount + row.recipient_fee_amount
                == row.total_accrued_fee_amount,
            balance_ok: balance_flags.get(i).copied().unwrap_or(false),
            correction_offset: None,
        });
    }

    let validation = score(&computed, config.tolerance_minor);
    ReconciliationResult {
        variant_index: variant.index,
        variant_name: variant.name(),
        rows: computed,
        validation,
    }
}

pub(crate) fn score(rows: &[ComputedRow], tolerance: i64) -> ValidationResult {
    ValidationResult {
        bank_excel_diff_err_cnt: rows
            .iter()
            .filter(|r| r.bank_excel_diff.abs() > tolerance)
            .count(),
        check_total_err_cnt: rows.iter().filter(|r| !r.check_total).count(),
        principal_balance_check_err_cnt: rows.iter().filter(|r| !r.balance_ok).count(),
    }
}

/// Reconcile one contract: try every catalog variant on the sliced
/// schedule, keep the lowest-error candidate, self-correct its near-miss
/// rows, then report residual errors in fixed priority order
/// (bank-excel mismatch, total-fee invariant, balance check).
pub fn reconcile(
    contract: &Contract,
    schedule: &Schedule,
    timeline: &RateTimeline,
    catalog: &FormulaCatalog,
    config: &EngineConfig,
) -> Result<ReconOutcome, EngineError> {
    let rows = slice_to_period(schedule.payment_rows(), contract)?;

    let variants = catalog.variants();
    let mut best: Option<(ReconciliationResult, usize)> = None;
    for (pos, variant) in variants.iter().enumerate() {
        let candidate = compute_variant(variant, &rows, timeline, contract, config);
        log::debug!(
            "contract {}: variant {} scored {}",
            contract.id,
            candidate.variant_name,
            candidate.validation.error_total()
        );
        let better = match &best {
            Some((current, _)) => candidate.rank() < current.rank(),
            None => true,
        };
        if better {
            best = Some((candidate, pos));
        }
    }
    let (mut result, winner_pos) = best.expect("catalog is never empty");
    log::info!(
        "contract {}: winning variant {} ({} errors)",
        contract.id,
        result.variant_name,
        result.validation.error_total()
    );

    let report = self_correct(
        &mut result,
        &variants[winner_pos],
        timeline,
        contract,
        &rows,
        config,
    );

    let outcome = ReconOutcome {
        meta: RunMeta {
            contract_id: contract.id.clone(),
            winning_variant: result.variant_name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        result,
        corrected_rows: report.corrected,
        unresolved: report.unresolved,
    };

    // Post-hoc error priority. The total-fee invariant is an extraction
    // defect and raises regardless of raise_on_mismatch.
    if config.raise_on_mismatch {
        if let Some(message) = outcome.mismatch_message() {
            return Err(EngineError::BankExcelMismatch { message });
        }
    }
    if outcome.result.validation.check_total_err_cnt > 0 {
        return Err(EngineError::TotalFalseValue {
            rows: outcome.result.validation.check_total_err_cnt,
        });
    }
    if config.raise_on_mismatch && outcome.result.validation.principal_balance_check_err_cnt > 0 {
        return Err(EngineError::BalanceAfterRepaymentFalseValue {
            rows: outcome.result.validation.principal_balance_check_err_cnt,
        });
    }

    Ok(outcome)
}
