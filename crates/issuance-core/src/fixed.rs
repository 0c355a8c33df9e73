//! Fixed-point helpers.
//!
//! Ratios are `u128` scaled by [`RATIO_PRECISION`]; token amounts are raw
//! `u128` base units. Products are formed in 256 bits and narrowed back
//! with an explicit overflow check, so `a * b / c` never wraps silently.

use primitive_types::U256;

use crate::error::{IssuanceError, IssuanceResult};

/// Scale of `target_ratio` (1e18 == 100% of total supply).
pub const RATIO_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Scale of `current_ratio` and of per-second adjustment rates.
pub const EXTRA_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Convergence horizon used to derive the ideal per-second rate.
pub const SECONDS_IN_YEAR: u64 = 31_536_000;

const RATIO_DECIMALS: usize = 18;

/// Decimals of the managed token's base unit.
pub const TOKEN_DECIMALS: usize = 18;

/// `floor(a * b / denom)`.
pub fn mul_div_floor(a: u128, b: u128, denom: u128) -> IssuanceResult<u128> {
    if denom == 0 {
        return Err(IssuanceError::DivideByZero);
    }
    // 128 x 128 bits always fits in 256.
    let product = U256::from(a) * U256::from(b);
    narrow(product / U256::from(denom), "mul_div")
}

/// `min(floor(a * b * c / denom), u128::MAX)`.
///
/// For raw amounts that are clamped afterwards: a product too large for
/// `u128` still yields the largest representable amount.
pub fn mul3_div_saturating(a: u128, b: u128, c: u128, denom: u128) -> IssuanceResult<u128> {
    if denom == 0 {
        return Err(IssuanceError::DivideByZero);
    }
    let Some(product) = (U256::from(a) * U256::from(b)).checked_mul(U256::from(c)) else {
        return Ok(u128::MAX);
    };
    Ok(saturate(product / U256::from(denom)))
}

/// Narrow a 256-bit intermediate to `u128`, capping at `u128::MAX`.
pub fn saturate(value: U256) -> u128 {
    if value > U256::from(u128::MAX) {
        u128::MAX
    } else {
        value.low_u128()
    }
}

/// Narrow a 256-bit intermediate back to `u128`.
pub fn narrow(value: U256, context: &'static str) -> IssuanceResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(IssuanceError::ArithmeticOverflow(context));
    }
    Ok(value.low_u128())
}

/// Parse a ratio string into a [`RATIO_PRECISION`]-scaled integer.
///
/// Strings with a decimal point are read as fractions (`"0.2"` is 20%).
/// Plain integers are taken as already-scaled raw values, which keeps
/// `format_ratio(x)` and on-chain style `"200000000000000000"` both valid.
pub fn parse_ratio(input: &str) -> IssuanceResult<u128> {
    let s = input.trim();
    let invalid = || IssuanceError::InvalidConfig(format!("invalid ratio {input:?}"));

    let Some((whole, frac)) = s.split_once('.') else {
        return s.parse::<u128>().map_err(|_| invalid());
    };

    if frac.len() > RATIO_DECIMALS
        || (whole.is_empty() && frac.is_empty())
        || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let padded = format!("{frac:0<width$}", width = RATIO_DECIMALS);
    let frac: u128 = padded.parse().map_err(|_| invalid())?;

    whole
        .checked_mul(RATIO_PRECISION)
        .and_then(|w| w.checked_add(frac))
        .ok_or(IssuanceError::ArithmeticOverflow("parse_ratio"))
}

/// Render a scaled ratio as a decimal string (`2e17` → `"0.2"`).
pub fn format_ratio(value: u128) -> String {
    format_scaled(value, RATIO_DECIMALS)
}

/// Render a base-unit token amount in whole tokens (`15e17` → `"1.5"`).
pub fn format_units(amount: u128) -> String {
    format_scaled(amount, TOKEN_DECIMALS)
}

fn format_scaled(value: u128, decimals: usize) -> String {
    let scale = 10u128.pow(decimals as u32);
    let whole = value / scale;
    let frac = value % scale;
    if decimals == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:0width$}", width = decimals);
    let trimmed = digits.trim_end_matches('0');
    if trimmed.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{trimmed}")
    }
}

/// Serde adapter for token amounts: `u128` as a decimal string.
///
/// TOML integers are 64-bit and JSON consumers routinely lose precision
/// above 2^53, so amounts never travel as bare numbers.
pub mod amount_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.trim().parse::<u128>().map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for ratio-domain values, via [`parse_ratio`]/[`format_ratio`].
pub mod ratio_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_ratio(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_ratio(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_floors() {
        assert_eq!(mul_div_floor(10, 3, 4).unwrap(), 7);
        assert_eq!(mul_div_floor(u128::MAX, 2, 2).unwrap(), u128::MAX);
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        assert_eq!(mul_div_floor(1, 1, 0), Err(IssuanceError::DivideByZero));
    }

    #[test]
    fn mul_div_reports_narrowing_overflow() {
        assert!(matches!(
            mul_div_floor(u128::MAX, 3, 2),
            Err(IssuanceError::ArithmeticOverflow(_))
        ));
    }

    #[test]
    fn mul3_saturating_caps_oversized_products() {
        assert_eq!(
            mul3_div_saturating(u128::MAX, u128::MAX, u128::MAX, 1).unwrap(),
            u128::MAX
        );
        assert_eq!(mul3_div_saturating(u128::MAX, 4, 1, 2).unwrap(), u128::MAX);
        assert_eq!(mul3_div_saturating(10, 3, 2, 4).unwrap(), 15);
        assert_eq!(
            mul3_div_saturating(1, 1, 1, 0),
            Err(IssuanceError::DivideByZero)
        );
    }

    #[test]
    fn parse_decimal_ratios() {
        assert_eq!(parse_ratio("0.2").unwrap(), 200_000_000_000_000_000);
        assert_eq!(parse_ratio("1.0").unwrap(), RATIO_PRECISION);
        assert_eq!(parse_ratio(".5").unwrap(), RATIO_PRECISION / 2);
        assert_eq!(parse_ratio("0.000000000000000001").unwrap(), 1);
    }

    #[test]
    fn parse_raw_ratios() {
        assert_eq!(parse_ratio("200000000000000000").unwrap(), 200_000_000_000_000_000);
        assert_eq!(parse_ratio(" 42 ").unwrap(), 42);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_ratio("abc").is_err());
        assert!(parse_ratio("0.1.2").is_err());
        assert!(parse_ratio("-0.2").is_err());
        assert!(parse_ratio(".").is_err());
        assert!(parse_ratio("0.0000000000000000001").is_err());
    }

    #[test]
    fn format_trims_trailing_zeros() {
        assert_eq!(format_ratio(200_000_000_000_000_000), "0.2");
        assert_eq!(format_ratio(RATIO_PRECISION), "1.0");
        assert_eq!(format_ratio(0), "0.0");
        assert_eq!(format_ratio(1), "0.000000000000000001");
    }

    #[test]
    fn format_units_shows_whole_tokens() {
        assert_eq!(format_units(1_500_000_000_000_000_000), "1.5");
        assert_eq!(format_units(30 * 10u128.pow(TOKEN_DECIMALS as u32)), "30.0");
        assert_eq!(format_units(1), "0.000000000000000001");
    }

    #[test]
    fn format_output_parses_back() {
        for value in [0, 1, 31_709_791, RATIO_PRECISION / 3, 5 * RATIO_PRECISION] {
            assert_eq!(parse_ratio(&format_ratio(value)).unwrap(), value);
        }
    }
}
