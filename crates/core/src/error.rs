use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Bank name is not on the closed allow-list. Fatal, no retry.
    BankNotSupported(String),
    /// Cell/field content cannot be read as a monetary amount.
    MoneyParse(String),
    /// Field content cannot be read as a day-first date.
    DateParse(String),
    /// Schedule structure violation (total-row count, ordering).
    InvalidSchedule(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BankNotSupported(name) => write!(f, "bank not supported: '{name}'"),
            Self::MoneyParse(value) => write!(f, "cannot parse amount '{value}'"),
            Self::DateParse(value) => write!(f, "cannot parse date '{value}'"),
            Self::InvalidSchedule(msg) => write!(f, "invalid schedule: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}
