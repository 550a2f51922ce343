// Audit workbook rendering (xlsx export, presentation only).

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use subrecon_engine::ReconciliationResult;

use crate::error::IoError;

/// Display formats reproduced exactly as the downstream templates expect.
const DATE_FORMAT: &str = "dd.mm.yyyy";
const MONEY_FORMAT: &str = "#0.00;-#0.00";
const RATIO_FORMAT: &str = "0.0";

/// Localized boolean literals for the check columns.
const TRUE_LITERAL: &str = "ИСТИНА";
const FALSE_LITERAL: &str = "ЛОЖЬ";

/// Anchor of the shifted workbook's data block; the downstream template
/// pastes the block at this offset.
const SHIFT_ANCHOR_ROW: u32 = 7;
const SHIFT_ANCHOR_COL: u16 = 1;

const FULL_HEADERS: [&str; 13] = [
    "Дата платежа",
    "Остаток основного долга",
    "Погашение основного долга",
    "Вознаграждение (банк)",
    "Вознаграждение (получатель)",
    "Итого вознаграждение",
    "Дней",
    "Ставка, %",
    "Субсидия",
    "Расхождение",
    "Контроль итога",
    "Контроль остатка",
    "Коэффициент",
];

/// Excel serial day number (1900 date system; epoch 1899-12-30 absorbs the
/// 1900 leap-year bug).
fn excel_serial(date: NaiveDate) -> f64 {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    (date - base).num_days() as f64
}

fn as_decimal(minor: i64) -> f64 {
    minor as f64 / 100.0
}

fn render_err(e: rust_xlsxwriter::XlsxError) -> IoError {
    IoError::Render(e.to_string())
}

/// Full formatted workbook: the canonical schedule with the winning
/// variant's computed columns and an appended totals row.
pub fn full_workbook(result: &ReconciliationResult) -> Result<Vec<u8>, IoError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Сверка").map_err(render_err)?;

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let money_format = Format::new().set_num_format(MONEY_FORMAT);
    let ratio_format = Format::new().set_num_format(RATIO_FORMAT);

    for (col, title) in FULL_HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *title, &header_format)
            .map_err(render_err)?;
    }

    for (i, row) in result.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet
            .write_number_with_format(r, 0, excel_serial(row.date), &date_format)
            .map_err(render_err)?;
        let money_cells = [
            row.principal_debt_balance,
            row.principal_debt_repayment_amount,
            row.agency_fee_amount,
            row.recipient_fee_amount,
            row.total_accrued_fee_amount,
        ];
        for (offset, minor) in money_cells.iter().enumerate() {
            sheet
                .write_number_with_format(r, 1 + offset as u16, as_decimal(*minor), &money_format)
                .map_err(render_err)?;
        }
        sheet
            .write_number(r, 6, row.day_count as f64)
            .map_err(render_err)?;
        sheet
            .write_number_with_format(r, 7, row.rate as f64 / 100.0, &money_format)
            .map_err(render_err)?;
        sheet
            .write_number_with_format(r, 8, as_decimal(row.subsidy_sum), &money_format)
            .map_err(render_err)?;
        sheet
            .write_number_with_format(r, 9, as_decimal(row.bank_excel_diff), &money_format)
            .map_err(render_err)?;
        sheet
            .write_string(r, 10, bool_literal(row.check_total))
            .map_err(render_err)?;
        sheet
            .write_string(r, 11, bool_literal(row.balance_ok))
            .map_err(render_err)?;
        sheet
            .write_number_with_format(r, 12, row.day_count as f64 / 30.0, &ratio_format)
            .map_err(render_err)?;
    }

    // Totals row mirrors the bank table's summary line.
    let totals_row = (result.rows.len() + 1) as u32;
    sheet
        .write_string_with_format(totals_row, 0, "Итого", &header_format)
        .map_err(render_err)?;
    let sums: [i64; 5] = [
        0, // balance is point-in-time, never summed
        result.rows.iter().map(|r| r.principal_debt_repayment_amount).sum(),
        result.rows.iter().map(|r| r.agency_fee_amount).sum(),
        result.rows.iter().map(|r| r.recipient_fee_amount).sum(),
        result.rows.iter().map(|r| r.total_accrued_fee_amount).sum(),
    ];
    for (offset, minor) in sums.iter().enumerate().skip(1) {
        sheet
            .write_number_with_format(totals_row, 1 + offset as u16, as_decimal(*minor), &money_format)
            .map_err(render_err)?;
    }
    let subsidy_total: i64 = result.rows.iter().map(|r| r.subsidy_sum).sum();
    sheet
        .write_number_with_format(totals_row, 8, as_decimal(subsidy_total), &money_format)
        .map_err(render_err)?;

    autofit(sheet);
    workbook.save_to_buffer().map_err(render_err)
}

/// Compact "shifted" workbook: date / subsidy / balance only, anchored at a
/// fixed offset so the downstream template can splice the block in without
/// re-addressing.
pub fn shifted_workbook(result: &ReconciliationResult) -> Result<Vec<u8>, IoError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let money_format = Format::new().set_num_format(MONEY_FORMAT);

    for (i, row) in result.rows.iter().enumerate() {
        let r = SHIFT_ANCHOR_ROW + i as u32;
        sheet
            .write_number_with_format(r, SHIFT_ANCHOR_COL, excel_serial(row.date), &date_format)
            .map_err(render_err)?;
        sheet
            .write_number_with_format(
                r,
                SHIFT_ANCHOR_COL + 1,
                as_decimal(row.subsidy_sum),
                &money_format,
            )
            .map_err(render_err)?;
        sheet
            .write_number_with_format(
                r,
                SHIFT_ANCHOR_COL + 2,
                as_decimal(row.principal_debt_balance),
                &money_format,
            )
            .map_err(render_err)?;
    }

    workbook.save_to_buffer().map_err(render_err)
}

fn bool_literal(value: bool) -> &'static str {
    if value {
        TRUE_LITERAL
    } else {
        FALSE_LITERAL
    }
}

fn autofit(sheet: &mut Worksheet) {
    // Headers are the widest cells in every column.
    for (col, title) in FULL_HEADERS.iter().enumerate() {
        let width = (title.chars().count() as f64 + 2.0).max(12.0);
        let _ = sheet.set_column_width(col as u16, width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excel_serial_matches_known_dates() {
        let d = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        assert_eq!(excel_serial(d), 44941.0);
        let d = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(excel_serial(d), 43890.0);
    }
}
