// Excel import (xlsx, xls): one-way conversion to a trimmed string grid.
// The extractor does not care about workbook structure, only cell text.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::IoError;

/// Read the first non-empty worksheet into a 2-D grid of trimmed cell
/// strings. Dates render day-first so the grid looks exactly like the
/// bank's printed table.
pub fn read_grid(path: &Path) -> Result<Vec<Vec<String>>, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::Xlsx(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_owned();
    for name in &sheet_names {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| IoError::Xlsx(format!("sheet '{name}': {e}")))?;
        if range.is_empty() {
            continue;
        }
        log::debug!("reading sheet '{}' ({} rows)", name, range.height());
        return Ok(range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect());
    }

    Err(IoError::Xlsx("workbook has no data sheets".into()))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        // calamine's ExcelDateTime keeps the 1904 flag private; assume the
        // 1900 system and convert the raw serial ourselves.
        Data::DateTime(dt) => serial_to_day_first(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(_) => String::new(),
    }
}

/// Excel 1900-system serial to a day-first date string. The 1899-12-30
/// epoch absorbs the phantom 1900-02-29.
fn serial_to_day_first(serial: f64) -> String {
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    match base.checked_add_signed(chrono::Duration::days(serial as i64)) {
        Some(date) => date.format("%d.%m.%Y").to_string(),
        None => String::new(),
    }
}

/// Money cells come out of calamine as floats; render integers without the
/// trailing ".0" Excel never shows.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
