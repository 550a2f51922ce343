//! Closed bank allow-list.
//!
//! The subsidy program covers a fixed set of partner banks. Anything not on
//! the list fails before any computation starts; there is no retry path.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bank {
    Halyk,
    Sberbank,
    CenterCredit,
    Atf,
    Eurasian,
    Forte,
}

/// Accepted spellings per bank, lowercase. Portal exports are inconsistent
/// about quotes and legal-form prefixes, so matching runs on a normalized
/// name (see `normalize`).
const ALIASES: &[(Bank, &[&str])] = &[
    (
        Bank::Halyk,
        &["халык", "halyk", "народный банк казахстана", "народный банк", "halyk bank"],
    ),
    (Bank::Sberbank, &["сбербанк", "sberbank", "сбербанк россии"]),
    (
        Bank::CenterCredit,
        &["банк центркредит", "центркредит", "bcc", "bank centercredit"],
    ),
    (Bank::Atf, &["атф банк", "атфбанк", "atf bank", "atfbank"]),
    (
        Bank::Eurasian,
        &["евразийский банк", "eurasian bank", "еуразиялық банк"],
    ),
    (Bank::Forte, &["forte bank", "fortebank", "форте банк", "фортебанк"]),
];

fn normalize(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|&c| !matches!(c, '"' | '«' | '»' | '„' | '“' | '”'))
        .collect();
    let mut cleaned = stripped.trim().to_string();
    for prefix in ["ао ", "оао ", "дб ао ", "jsc "] {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest.trim().to_string();
        }
    }
    cleaned
}

impl Bank {
    /// Resolve a portal-reported bank name against the allow-list.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        let normalized = normalize(name);
        for (bank, aliases) in ALIASES {
            if aliases.contains(&normalized.as_str()) {
                return Ok(*bank);
            }
        }
        Err(CoreError::BankNotSupported(name.trim().to_string()))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Halyk => "halyk",
            Self::Sberbank => "sberbank",
            Self::CenterCredit => "bcc",
            Self::Atf => "atf",
            Self::Eurasian => "eurasian",
            Self::Forte => "forte",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
