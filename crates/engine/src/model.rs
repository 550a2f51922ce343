//! Reconciliation result model.

use chrono::NaiveDate;
use serde::Serialize;
use subrecon_core::format_minor;

/// One schedule row with the winning variant's computed columns attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputedRow {
    pub date: NaiveDate,
    pub principal_debt_balance: i64,
    pub principal_debt_repayment_amount: i64,
    pub agency_fee_amount: i64,
    pub recipient_fee_amount: i64,
    pub total_accrued_fee_amount: i64,
    /// Rate tier the row's payment date falls in.
    pub tier_index: usize,
    pub rate: i64,
    pub day_count: i64,
    pub subsidy_sum: i64,
    /// agency_fee_amount − subsidy_sum.
    pub bank_excel_diff: i64,
    /// agency_fee + recipient_fee == total_accrued_fee.
    pub check_total: bool,
    pub balance_ok: bool,
    /// Day-count offset applied by the self-corrector, if any.
    pub correction_offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub bank_excel_diff_err_cnt: usize,
    pub check_total_err_cnt: usize,
    pub principal_balance_check_err_cnt: usize,
}

impl ValidationResult {
    pub fn error_total(&self) -> usize {
        self.bank_excel_diff_err_cnt + self.check_total_err_cnt + self.principal_balance_check_err_cnt
    }
}

/// One candidate's computed schedule plus its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub variant_index: usize,
    pub variant_name: String,
    pub rows: Vec<ComputedRow>,
    pub validation: ValidationResult,
}

impl ReconciliationResult {
    /// Total-order key: error count ascending, enumeration order breaks ties.
    pub fn rank(&self) -> (usize, usize) {
        (self.validation.error_total(), self.variant_index)
    }
}

/// A row the self-corrector could not bring within tolerance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedDiff {
    pub date: NaiveDate,
    pub diff_minor: i64,
}

impl UnresolvedDiff {
    pub fn describe(&self) -> String {
        format!(
            "{}: расхождение {}",
            self.date.format("%d.%m.%Y"),
            format_minor(self.diff_minor)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub contract_id: String,
    pub winning_variant: String,
    pub engine_version: String,
    pub run_at: String,
}

/// The winning reconciliation with run metadata and any residue the
/// self-corrector left behind.
#[derive(Debug, Clone, Serialize)]
pub struct ReconOutcome {
    pub meta: RunMeta,
    pub result: ReconciliationResult,
    pub corrected_rows: usize,
    pub unresolved: Vec<UnresolvedDiff>,
}

impl ReconOutcome {
    /// Human-readable mismatch message, one line per unresolved row.
    pub fn mismatch_message(&self) -> Option<String> {
        if self.unresolved.is_empty() {
            return None;
        }
        Some(
            self.unresolved
                .iter()
                .map(UnresolvedDiff::describe)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}
