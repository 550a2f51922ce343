//! Canonical-schedule extraction from a raw cell grid.

use chrono::NaiveDate;
use subrecon_core::{Schedule, ScheduleRow};

use crate::error::ExtractError;
use crate::grid::{data_start_row, find_total_row, reduce_columns};

/// Canonical column order after reduction.
const COLUMN_NAMES: [&str; 6] = [
    "debt_repayment_date",
    "principal_debt_balance",
    "principal_debt_repayment_amount",
    "agency_fee_amount",
    "recipient_fee_amount",
    "total_accrued_fee_amount",
];

/// Day-first date formats seen in bank tables.
const DATE_FORMATS: [&str; 4] = ["%d.%m.%Y", "%d.%m.%y", "%d/%m/%Y", "%d-%m-%Y"];

pub fn parse_date_day_first(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Extract the canonical 6-column schedule from a grid of trimmed cell
/// strings. The grid is one or two located tables already concatenated by
/// the document layer; header rows are still present.
pub fn extract(raw: &[Vec<String>]) -> Result<Schedule, ExtractError> {
    let grid: Vec<Vec<String>> = raw
        .iter()
        .map(|row| row.iter().map(|c| c.trim().to_string()).collect())
        .collect();

    let start = data_start_row(&grid).ok_or(ExtractError::EmptyTable)?;
    let region: Vec<Vec<String>> = grid[start..]
        .iter()
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .cloned()
        .collect();
    if region.is_empty() {
        return Err(ExtractError::EmptyTable);
    }

    let kept = reduce_columns(&region);
    if kept.len() != 6 {
        return Err(ExtractError::InvalidColumnCount { found: kept.len() });
    }

    let total_idx = find_total_row(&region, &kept).ok_or(ExtractError::EmptyTable)?;
    if total_idx == 0 {
        // A summary row with nothing above it means the table held no
        // payment rows at all.
        return Err(ExtractError::EmptyTable);
    }

    let cell = |row: &Vec<String>, col: usize| -> String {
        row.get(col).map(String::as_str).unwrap_or("").to_string()
    };

    let mut rows: Vec<ScheduleRow> = Vec::with_capacity(total_idx + 1);
    for (idx, row) in region[..=total_idx].iter().enumerate() {
        let is_total = idx == total_idx;

        let date_cell = cell(row, kept[0]);
        let date = match parse_date_day_first(&date_cell) {
            Some(d) => d,
            // Summary rows carry a label where the date belongs; reuse the
            // last payment date.
            None if is_total && !rows.is_empty() => {
                rows.last().unwrap().debt_repayment_date
            }
            None => {
                return Err(ExtractError::WrongDataInColumn {
                    row: idx,
                    column: COLUMN_NAMES[0],
                    value: date_cell,
                })
            }
        };

        let mut money = [0i64; 5];
        for (slot, (&col, &name)) in kept[1..].iter().zip(&COLUMN_NAMES[1..]).enumerate() {
            let value = cell(row, col);
            money[slot] = subrecon_core::parse_minor(&value).map_err(|_| {
                ExtractError::WrongDataInColumn {
                    row: idx,
                    column: name,
                    value,
                }
            })?;
        }

        rows.push(ScheduleRow {
            debt_repayment_date: date,
            principal_debt_balance: money[0],
            principal_debt_repayment_amount: money[1],
            agency_fee_amount: money[2],
            recipient_fee_amount: money[3],
            total_accrued_fee_amount: money[4],
            is_total,
        });
    }

    Ok(Schedule::new(rows)?)
}
