//! Integer minor-unit money.
//!
//! External amounts arrive as decimal currency strings; everything past the
//! boundary is `i64` minor units (amount × 100). Parsing is textual; the
//! decimal point is handled digit-wise so no binary float ever touches a
//! monetary value.

use crate::error::CoreError;

/// Denominator for tier rates: rates are stored as percent × 100
/// (12.00% ⇒ 1200), so `balance × rate / RATE_SCALE` is a full-year fee.
pub const RATE_SCALE: i64 = 10_000;

/// Thousand separators seen in bank spreadsheets.
const GROUP_SEPARATORS: [char; 4] = [' ', '\u{a0}', '\u{2009}', '\''];

/// Dash variants banks use for "no amount".
const DASH_VALUES: [&str; 3] = ["-", "\u{2013}", "\u{2014}"];

/// Parse a decimal amount string into minor units (× 100, half-up on the
/// third fractional digit). Blank and dash cells mean zero.
pub fn parse_minor(raw: &str) -> Result<i64, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || DASH_VALUES.contains(&trimmed) {
        return Ok(0);
    }

    let mut s: String = trimmed
        .chars()
        .filter(|c| !GROUP_SEPARATORS.contains(c))
        .collect();
    // Decimal commas normalize to points before splitting.
    s = s.replace(',', ".");

    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.as_str()),
    };

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(CoreError::MoneyParse(raw.to_string()));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(CoreError::MoneyParse(raw.to_string()));
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| CoreError::MoneyParse(raw.to_string()))?
    };

    let mut frac_digits = [0u8; 3];
    for (i, c) in frac_part.chars().take(3).enumerate() {
        frac_digits[i] = c as u8 - b'0';
    }
    let mut cents = i64::from(frac_digits[0]) * 10 + i64::from(frac_digits[1]);
    if frac_digits[2] >= 5 {
        cents += 1;
    }

    let minor = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(|| CoreError::MoneyParse(raw.to_string()))?;

    Ok(if negative { -minor } else { minor })
}

/// Render minor units as a plain decimal string ("12345" ⇒ "123.45").
pub fn format_minor(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Integer round-half-up division: `(num + den/2) / den`.
///
/// Intermediate products in the subsidy formula exceed i64
/// (balance × rate × days), so both operands are i128.
pub fn round_half_up(num: i128, den: i128) -> i64 {
    debug_assert!(den > 0);
    ((num + den / 2) / den) as i64
}
