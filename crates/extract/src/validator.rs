//! Internal total-row consistency check.

use subrecon_core::{FeeColumn, Schedule};

use crate::error::ExtractError;

/// Check that every fee column's payment-row sum agrees with the total row
/// within `tolerance` minor units. Opening balance is excluded: it is a
/// point-in-time value, not an accumulating one.
pub fn validate(schedule: &Schedule, tolerance: i64) -> Result<(), ExtractError> {
    let total = schedule.total_row();
    for column in FeeColumn::ALL {
        let row_sum: i64 = schedule
            .payment_rows()
            .iter()
            .map(|row| column.value(row))
            .sum();
        let total_value = column.value(total);
        if (row_sum - total_value).abs() > tolerance {
            return Err(ExtractError::Mismatch {
                column,
                row_sum,
                total_row: total_value,
            });
        }
    }
    Ok(())
}
