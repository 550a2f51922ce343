use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// The schedule has no payment rows inside the subsidy period.
    EmptyPeriod { contract_id: String },
    /// Rows still disagree with the bank figures after self-correction.
    BankExcelMismatch { message: String },
    /// agency_fee + recipient_fee != total_accrued_fee on a data row.
    /// Extraction-defect invariant; never downgraded to a reported error.
    TotalFalseValue { rows: usize },
    /// The winning variant's balance roll-forward check still fails.
    BalanceAfterRepaymentFalseValue { rows: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::EmptyPeriod { contract_id } => {
                write!(f, "contract '{contract_id}': no payment rows inside subsidy period")
            }
            Self::BankExcelMismatch { message } => {
                write!(f, "schedule disagrees with bank figures:\n{message}")
            }
            Self::TotalFalseValue { rows } => {
                write!(f, "total fee invariant broken on {rows} row(s)")
            }
            Self::BalanceAfterRepaymentFalseValue { rows } => {
                write!(f, "balance after repayment check failed on {rows} row(s)")
            }
        }
    }
}

impl std::error::Error for EngineError {}
