use std::fmt;

use subrecon_core::{CoreError, FeeColumn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Column cleanup did not converge on the 6 canonical fields.
    InvalidColumnCount { found: usize },
    /// No data rows remain after cleanup.
    EmptyTable,
    /// A fee column's row sum disagrees with the total row beyond tolerance.
    Mismatch {
        column: FeeColumn,
        row_sum: i64,
        total_row: i64,
    },
    /// Cell content does not fit the column's expected semantic type.
    WrongDataInColumn {
        row: usize,
        column: &'static str,
        value: String,
    },
    Core(CoreError),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColumnCount { found } => {
                write!(f, "expected 6 canonical columns after cleanup, found {found}")
            }
            Self::EmptyTable => write!(f, "no data rows found in table"),
            Self::Mismatch {
                column,
                row_sum,
                total_row,
            } => write!(
                f,
                "column '{column}': row sum {row_sum} disagrees with total row {total_row}"
            ),
            Self::WrongDataInColumn { row, column, value } => {
                write!(f, "row {row}, column '{column}': unexpected content '{value}'")
            }
            Self::Core(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<CoreError> for ExtractError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}
