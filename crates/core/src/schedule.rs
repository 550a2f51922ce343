//! Canonical 6-column repayment schedule.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One row of the canonical schedule. All monetary fields are integer minor
/// units; `principal_debt_balance` is the opening balance the bank reports
/// for the row's payment date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub debt_repayment_date: NaiveDate,
    pub principal_debt_balance: i64,
    pub principal_debt_repayment_amount: i64,
    pub agency_fee_amount: i64,
    pub recipient_fee_amount: i64,
    pub total_accrued_fee_amount: i64,
    pub is_total: bool,
}

impl ScheduleRow {
    /// A row with a date and a balance but no movements, the shape of a
    /// synthetic opening row.
    pub fn opening(date: NaiveDate, balance: i64) -> Self {
        Self {
            debt_repayment_date: date,
            principal_debt_balance: balance,
            principal_debt_repayment_amount: 0,
            agency_fee_amount: 0,
            recipient_fee_amount: 0,
            total_accrued_fee_amount: 0,
            is_total: false,
        }
    }

    /// True when the row carries no repayment and no fees.
    pub fn has_no_movement(&self) -> bool {
        self.principal_debt_repayment_amount == 0
            && self.agency_fee_amount == 0
            && self.recipient_fee_amount == 0
            && self.total_accrued_fee_amount == 0
    }
}

/// The fee columns checked against the total row. Opening balance is a
/// point-in-time value and is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeColumn {
    PrincipalRepayment,
    AgencyFee,
    RecipientFee,
    TotalAccruedFee,
}

impl FeeColumn {
    pub const ALL: [FeeColumn; 4] = [
        FeeColumn::PrincipalRepayment,
        FeeColumn::AgencyFee,
        FeeColumn::RecipientFee,
        FeeColumn::TotalAccruedFee,
    ];

    pub fn value(&self, row: &ScheduleRow) -> i64 {
        match self {
            Self::PrincipalRepayment => row.principal_debt_repayment_amount,
            Self::AgencyFee => row.agency_fee_amount,
            Self::RecipientFee => row.recipient_fee_amount,
            Self::TotalAccruedFee => row.total_accrued_fee_amount,
        }
    }
}

impl fmt::Display for FeeColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrincipalRepayment => write!(f, "principal_debt_repayment_amount"),
            Self::AgencyFee => write!(f, "agency_fee_amount"),
            Self::RecipientFee => write!(f, "recipient_fee_amount"),
            Self::TotalAccruedFee => write!(f, "total_accrued_fee_amount"),
        }
    }
}

/// Ordered rows with exactly one total row, kept logically last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    rows: Vec<ScheduleRow>,
}

impl Schedule {
    pub fn new(mut rows: Vec<ScheduleRow>) -> Result<Self, CoreError> {
        let total_count = rows.iter().filter(|r| r.is_total).count();
        if total_count != 1 {
            return Err(CoreError::InvalidSchedule(format!(
                "expected exactly one total row, found {total_count}"
            )));
        }
        // The total row may sit anywhere in the raw table; move it last.
        let total_idx = rows.iter().position(|r| r.is_total).unwrap();
        if total_idx != rows.len() - 1 {
            let total = rows.remove(total_idx);
            rows.push(total);
        }
        if rows.len() < 2 {
            return Err(CoreError::InvalidSchedule("no payment rows".into()));
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    /// All rows except the total row.
    pub fn payment_rows(&self) -> &[ScheduleRow] {
        &self.rows[..self.rows.len() - 1]
    }

    pub fn total_row(&self) -> &ScheduleRow {
        &self.rows[self.rows.len() - 1]
    }
}
