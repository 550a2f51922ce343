//! Contract and rate-tier model, plus the external input record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bank::Bank;
use crate::error::CoreError;
use crate::money::parse_minor;

/// Day-count year length used when the contract does not specify one.
pub const DEFAULT_YEAR_COUNT: u32 = 360;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub bank: Bank,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Loan principal in minor units.
    pub loan_amount: i64,
    /// Day-count year length (360 or 365).
    pub year_count: u32,
}

/// A date-bounded interest-rate segment. `rate` is percent × 100
/// (see [`crate::money::RATE_SCALE`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTier {
    pub index: usize,
    pub rate: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

// ---------------------------------------------------------------------------
// External input record
// ---------------------------------------------------------------------------

/// Per-contract record handed over by the document/portal layer (TOML).
/// Amounts are decimal currency strings; rates are percent × 100 per
/// subsidy-period year band.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractRecord {
    pub id: String,
    pub bank: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub loan_amount: String,
    #[serde(default)]
    pub year_count: Option<u32>,
    pub rates: RateBands,
}

/// Candidate tier rates. A band of zero means "no tier".
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RateBands {
    pub years_1_3: i64,
    #[serde(default)]
    pub year_4: i64,
    #[serde(default)]
    pub year_5: i64,
    #[serde(default)]
    pub years_6_7: i64,
}

impl RateBands {
    pub fn as_array(&self) -> [i64; 4] {
        [self.years_1_3, self.year_4, self.year_5, self.years_6_7]
    }
}

impl ContractRecord {
    /// Validate the bank against the allow-list and convert decimal amounts
    /// to minor units. Bank validation runs first: an unknown bank must fail
    /// before any other field is touched.
    pub fn into_contract(self) -> Result<(Contract, RateBands), CoreError> {
        let bank = Bank::from_name(&self.bank)?;
        let loan_amount = parse_minor(&self.loan_amount)?;
        if self.end_date < self.start_date {
            return Err(CoreError::InvalidSchedule(format!(
                "contract {}: end date {} precedes start date {}",
                self.id, self.end_date, self.start_date
            )));
        }
        Ok((
            Contract {
                id: self.id,
                bank,
                start_date: self.start_date,
                end_date: self.end_date,
                loan_amount,
                year_count: self.year_count.unwrap_or(DEFAULT_YEAR_COUNT),
            },
            self.rates,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bank: &str) -> ContractRecord {
        ContractRecord {
            id: "c-1".into(),
            bank: bank.into(),
            start_date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
            loan_amount: "2500000.00".into(),
            year_count: None,
            rates: RateBands {
                years_1_3: 1200,
                ..Default::default()
            },
        }
    }

    #[test]
    fn converts_decimal_amount_to_minor_units() {
        let (contract, rates) = record("Halyk Bank").into_contract().unwrap();
        assert_eq!(contract.loan_amount, 250_000_000);
        assert_eq!(contract.year_count, DEFAULT_YEAR_COUNT);
        assert_eq!(rates.as_array(), [1200, 0, 0, 0]);
    }

    #[test]
    fn unknown_bank_fails_before_amount_parsing() {
        let mut rec = record("Неизвестный Банк");
        rec.loan_amount = "not-a-number".into();
        match rec.into_contract() {
            Err(CoreError::BankNotSupported(name)) => assert_eq!(name, "Неизвестный Банк"),
            other => panic!("expected BankNotSupported, got {other:?}"),
        }
    }
}
