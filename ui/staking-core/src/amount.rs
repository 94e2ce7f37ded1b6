//! Conversion between user-entered decimal strings and the contract's
//! 18-decimal base unit.

use alloy_primitives::utils::{format_units, parse_units, ParseUnits};
use alloy_primitives::U256;

use crate::error::StakeError;

/// Decimals of both the staked currency and the reward token.
pub const TOKEN_DECIMALS: u8 = 18;

/// Parse a strictly positive decimal amount into base units.
///
/// Only plain decimal notation is accepted: no sign, no exponent, at most
/// [`TOKEN_DECIMALS`] fractional digits.
pub fn parse_amount(input: &str) -> Result<U256, StakeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(StakeError::InvalidAmount("amount is empty".into()));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (trimmed, None),
    };
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !fraction.map_or(true, digits_only) {
        return Err(StakeError::InvalidAmount(format!("{trimmed:?} is not a decimal number")));
    }
    let fraction = fraction.unwrap_or("");
    if whole.is_empty() && fraction.is_empty() {
        return Err(StakeError::InvalidAmount(format!("{trimmed:?} is not a decimal number")));
    }
    if fraction.len() > TOKEN_DECIMALS as usize {
        return Err(StakeError::InvalidAmount(format!(
            "at most {TOKEN_DECIMALS} decimal places are supported"
        )));
    }

    // parse_units wants both sides of the point populated
    let normalized = format!(
        "{}.{}",
        if whole.is_empty() { "0" } else { whole },
        if fraction.is_empty() { "0" } else { fraction }
    );
    let value = match parse_units(&normalized, TOKEN_DECIMALS) {
        Ok(ParseUnits::U256(value)) => value,
        Ok(ParseUnits::I256(_)) => {
            return Err(StakeError::InvalidAmount("amount must be positive".into()))
        }
        Err(e) => return Err(StakeError::InvalidAmount(e.to_string())),
    };

    if value.is_zero() {
        return Err(StakeError::InvalidAmount("amount must be greater than zero".into()));
    }
    Ok(value)
}

/// Full-precision decimal rendering with trailing zeros removed.
pub fn format_amount(value: U256) -> String {
    match format_units(value, TOKEN_DECIMALS) {
        Ok(s) => trim_fraction(&s).to_string(),
        Err(_) => value.to_string(),
    }
}

/// Display rendering: at most four decimals, except for dust which would
/// otherwise round to zero.
pub fn format_amount_short(value: U256) -> String {
    let full = format_amount(value);
    let Some((whole, fraction)) = full.split_once('.') else {
        return full;
    };
    let head = &fraction[..fraction.len().min(4)];
    if whole == "0" && head.bytes().all(|b| b == b'0') {
        return full;
    }
    let shortened = format!("{whole}.{head}");
    trim_fraction(&shortened).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn parses_plain_decimals() {
        assert_eq!(parse_amount("1").unwrap(), U256::from(ONE));
        assert_eq!(parse_amount(" 1.5 ").unwrap(), U256::from(ONE + ONE / 2));
        assert_eq!(parse_amount(".5").unwrap(), U256::from(ONE / 2));
        assert_eq!(parse_amount("2.").unwrap(), U256::from(2 * ONE));
        assert_eq!(
            parse_amount("0.000000000000000001").unwrap(),
            U256::from(1u8)
        );
    }

    #[test]
    fn rejects_non_positive_and_non_numeric() {
        for input in [
            "", "   ", "0", "0.0", "000", ".", "-1", "+1", "abc", "1e5", "1.2.3", "1,5", "0x10",
            "NaN", "1 000", "0.0000000000000000001",
        ] {
            assert!(
                matches!(parse_amount(input), Err(StakeError::InvalidAmount(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn formats_without_trailing_zeros() {
        assert_eq!(format_amount(U256::ZERO), "0");
        assert_eq!(format_amount(U256::from(ONE)), "1");
        assert_eq!(format_amount(U256::from(ONE + ONE / 4)), "1.25");
        assert_eq!(format_amount(U256::from(1u8)), "0.000000000000000001");
    }

    #[test]
    fn short_format_keeps_dust_visible() {
        assert_eq!(format_amount_short(U256::from(ONE + ONE / 3)), "1.3333");
        assert_eq!(format_amount_short(U256::from(12 * ONE)), "12");
        assert_eq!(format_amount_short(U256::from(ONE / 100_000)), "0.00001");
        assert_eq!(format_amount_short(U256::ZERO), "0");
    }
}
