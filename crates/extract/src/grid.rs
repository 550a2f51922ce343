//! Grid-level heuristics: data-start detection, column reduction, and
//! summary-row location. Works purely on trimmed cell strings.

use subrecon_core::parse_minor;

/// Localized summary-row markers (Russian + Kazakh), lowercase.
pub const TOTAL_KEYWORDS: [&str; 5] = ["итого", "жиыны", "барлығы", "жиынтығы", "қорытынды"];

fn has_alphabetic(cell: &str) -> bool {
    cell.chars().any(|c| c.is_alphabetic())
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// First row containing no alphabetic characters in any cell.
fn data_start_no_alphabetic(grid: &[Vec<String>]) -> Option<usize> {
    grid.iter()
        .position(|row| !is_blank_row(row) && row.iter().all(|c| !has_alphabetic(c)))
}

/// First row containing a cell of length > 1 with no alphabetic characters.
fn data_start_long_numeric_cell(grid: &[Vec<String>]) -> Option<usize> {
    grid.iter().position(|row| {
        row.iter()
            .any(|c| c.chars().count() > 1 && !has_alphabetic(c))
    })
}

/// Determine where header rows end and payment rows begin, using two
/// independent heuristics. On disagreement the long-numeric-cell variant
/// wins; bank layouts with merged header cells defeat the stricter one.
pub fn data_start_row(grid: &[Vec<String>]) -> Option<usize> {
    let by_row = data_start_no_alphabetic(grid);
    let by_cell = data_start_long_numeric_cell(grid);
    match (by_row, by_cell) {
        (Some(a), Some(b)) => {
            if a != b {
                log::warn!("data-start heuristics disagree: no-alphabetic={a}, long-cell={b}");
            }
            Some(b)
        }
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

/// True when the column's numeric cells form 1..=N, checked through the
/// sum-of-first-N-naturals identity. Non-numeric cells (a blank or "итого"
/// in the summary row) are ignored.
fn is_ordinal_column(cells: &[&str]) -> bool {
    let mut values: Vec<i64> = Vec::new();
    for cell in cells {
        if cell.is_empty() {
            continue;
        }
        match cell.parse::<i64>() {
            Ok(v) => values.push(v),
            Err(_) => {
                if has_alphabetic(cell) {
                    continue;
                }
                return false;
            }
        }
    }
    if values.is_empty() || values[0] != 1 {
        return false;
    }
    if !values.windows(2).all(|w| w[0] < w[1]) {
        return false;
    }
    let n = values.len() as i64;
    values.iter().sum::<i64>() == n * (n + 1) / 2
}

/// Reduce the data region to its canonical columns: drop exact-duplicate
/// columns, all-blank columns, and a leading ordinal column. Returns the
/// kept column indices in order.
pub fn reduce_columns(region: &[Vec<String>]) -> Vec<usize> {
    let width = region.iter().map(|r| r.len()).max().unwrap_or(0);
    fn cell(row: &Vec<String>, col: usize) -> &str {
        row.get(col).map(String::as_str).unwrap_or("")
    }

    let mut kept: Vec<usize> = Vec::new();
    for col in 0..width {
        let column: Vec<&str> = region.iter().map(|r| cell(r, col)).collect();

        if column.iter().all(|c| c.is_empty()) {
            log::debug!("dropping all-blank column {col}");
            continue;
        }

        let duplicate = kept.iter().any(|&prev| {
            region
                .iter()
                .all(|r| cell(r, prev) == cell(r, col))
        });
        if duplicate {
            log::debug!("dropping duplicate column {col}");
            continue;
        }

        if kept.is_empty() && is_ordinal_column(&column) {
            log::debug!("dropping leading ordinal column {col}");
            continue;
        }

        kept.push(col);
    }
    kept
}

/// True for a cell that reads as a pure number (digits present, parseable
/// as an amount). Blank cells do not count.
pub fn is_pure_number(cell: &str) -> bool {
    !cell.is_empty() && cell.chars().any(|c| c.is_ascii_digit()) && parse_minor(cell).is_ok()
}

/// Locate the summary row: bottom-up keyword scan over the full row cells,
/// falling back to the last row whose final kept column parses as a pure
/// number.
pub fn find_total_row(region: &[Vec<String>], kept: &[usize]) -> Option<usize> {
    for (idx, row) in region.iter().enumerate().rev() {
        let keyword_hit = row.iter().any(|c| {
            let lowered = c.trim().to_lowercase();
            TOTAL_KEYWORDS.iter().any(|k| lowered.contains(k))
        });
        if keyword_hit {
            return Some(idx);
        }
    }

    let last_col = *kept.last()?;
    region
        .iter()
        .enumerate()
        .rev()
        .find(|(_, row)| is_pure_number(row.get(last_col).map(String::as_str).unwrap_or("")))
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn data_start_skips_headers() {
        let g = grid(&[
            &["№", "Дата платежа", "Остаток долга"],
            &["1", "15.01.2023", "10000000"],
            &["2", "15.02.2023", "9000000"],
        ]);
        assert_eq!(data_start_row(&g), Some(1));
    }

    #[test]
    fn heuristics_disagree_prefers_long_cell() {
        // Row 1 has a bare "1" (len 1, non-alphabetic), so heuristic (a)
        // fires there, heuristic (b) only on row 2.
        let g = grid(&[
            &["Дата", "Сумма"],
            &["1", ""],
            &["15.01.2023", "100,50"],
        ]);
        assert_eq!(data_start_row(&g), Some(2));
    }

    #[test]
    fn ordinal_column_detected_via_sum_of_naturals() {
        assert!(is_ordinal_column(&["1", "2", "3", "4"]));
        assert!(is_ordinal_column(&["1", "2", "3", ""]));
        // Gap breaks the triangular sum.
        assert!(!is_ordinal_column(&["1", "2", "4"]));
        assert!(!is_ordinal_column(&["2", "3", "4"]));
        assert!(!is_ordinal_column(&["10000000", "9000000"]));
    }

    #[test]
    fn reduce_drops_blank_duplicate_and_ordinal() {
        let g = grid(&[
            &["1", "15.01.2023", "", "100", "100", "5"],
            &["2", "15.02.2023", "", "200", "200", "6"],
            &["3", "15.03.2023", "", "300", "300", "7"],
        ]);
        // ordinal col 0, blank col 2, duplicate col 4 all dropped
        assert_eq!(reduce_columns(&g), vec![1, 3, 5]);
    }

    #[test]
    fn total_row_by_keyword_beats_position() {
        let g = grid(&[
            &["15.01.2023", "100"],
            &["Итого", "100"],
            &["подпись", ""],
        ]);
        assert_eq!(find_total_row(&g, &[0, 1]), Some(1));
    }

    #[test]
    fn total_row_fallback_walks_up_from_bottom() {
        let g = grid(&[
            &["15.01.2023", "100"],
            &["15.02.2023", "250"],
            &["", ""],
        ]);
        assert_eq!(find_total_row(&g, &[0, 1]), Some(1));
    }
}
