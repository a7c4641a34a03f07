//! Human amount -> base unit conversion
//!
//! Amounts are kept as a whole part plus fractional digits and scaled by
//! `10^decimals` over integers. Fractional digits beyond `decimals` are
//! truncated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::error::VaultError;

/// Largest exponent for which `10^decimals` fits in a u64
pub const MAX_DECIMALS: u8 = 19;

/// A non-negative decimal amount as typed by a human, e.g. `"10"` or `"2.5"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "String")]
pub struct HumanAmount {
    whole: u64,
    /// Fractional digits, most significant first, trailing zeros stripped
    fraction: String,
}

impl HumanAmount {
    pub fn whole(whole: u64) -> Self {
        Self {
            whole,
            fraction: String::new(),
        }
    }

    /// Scale to base units: `amount * 10^decimals`
    pub fn to_base_units(&self, decimals: u8) -> Result<u64, VaultError> {
        let scale = pow10(decimals)?;

        let whole = self.whole.checked_mul(scale).ok_or_else(|| {
            VaultError::invalid_input(format!(
                "amount {} overflows u64 at {} decimals",
                self, decimals
            ))
        })?;

        // Keep at most `decimals` fractional digits, right-padded with zeros
        let mut frac: u64 = 0;
        let digits = self.fraction.as_bytes();
        for i in 0..decimals as usize {
            let d = digits.get(i).map(|b| (b - b'0') as u64).unwrap_or(0);
            frac = frac * 10 + d;
        }

        whole.checked_add(frac).ok_or_else(|| {
            VaultError::invalid_input(format!(
                "amount {} overflows u64 at {} decimals",
                self, decimals
            ))
        })
    }

    /// True if scaling at `decimals` drops nonzero fractional digits
    pub fn truncates_at(&self, decimals: u8) -> bool {
        self.fraction.len() > decimals as usize
    }
}

impl From<u64> for HumanAmount {
    fn from(whole: u64) -> Self {
        Self::whole(whole)
    }
}

impl FromStr for HumanAmount {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || VaultError::invalid_input(format!("invalid amount: '{}'", s));

        let (whole_str, frac_str) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole_str.is_empty() && frac_str.is_empty() {
            return Err(invalid());
        }
        if !whole_str.bytes().all(|b| b.is_ascii_digit())
            || !frac_str.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole = if whole_str.is_empty() {
            0
        } else {
            whole_str.parse::<u64>().map_err(|_| invalid())?
        };

        Ok(Self {
            whole,
            fraction: frac_str.trim_end_matches('0').to_string(),
        })
    }
}

/// Request files may write amounts as JSON strings or numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Whole(u64),
    Decimal(f64),
    Text(String),
}

impl TryFrom<AmountRepr> for HumanAmount {
    type Error = VaultError;

    fn try_from(repr: AmountRepr) -> Result<Self, Self::Error> {
        match repr {
            AmountRepr::Whole(whole) => Ok(Self::whole(whole)),
            // f64 Display is the shortest exact round-trip, never exponent form
            AmountRepr::Decimal(value) if value.is_finite() => value.to_string().parse(),
            AmountRepr::Decimal(value) => {
                Err(VaultError::invalid_input(format!("invalid amount: {}", value)))
            }
            AmountRepr::Text(text) => text.parse(),
        }
    }
}

impl TryFrom<String> for HumanAmount {
    type Error = VaultError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HumanAmount> for String {
    fn from(amount: HumanAmount) -> Self {
        amount.to_string()
    }
}

impl fmt::Display for HumanAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fraction.is_empty() {
            write!(f, "{}", self.whole)
        } else {
            write!(f, "{}.{}", self.whole, self.fraction)
        }
    }
}

/// `10^decimals` as u64
pub fn pow10(decimals: u8) -> Result<u64, VaultError> {
    10u64.checked_pow(decimals as u32).ok_or_else(|| {
        VaultError::invalid_input(format!(
            "decimals {} exceeds maximum of {}",
            decimals, MAX_DECIMALS
        ))
    })
}

/// Render base units as a human amount, e.g. `2_500_000` at 6 -> `"2.5"`
pub fn format_base_units(amount: u64, decimals: u8) -> String {
    let Ok(scale) = pow10(decimals) else {
        return amount.to_string();
    };
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> HumanAmount {
        s.parse().unwrap()
    }

    #[test]
    fn test_whole_amount_scaling() {
        assert_eq!(HumanAmount::from(1).to_base_units(9).unwrap(), 1_000_000_000);
        assert_eq!(HumanAmount::from(2).to_base_units(6).unwrap(), 2_000_000);
        assert_eq!(HumanAmount::from(10).to_base_units(9).unwrap(), 10_000_000_000);
        assert_eq!(HumanAmount::from(7).to_base_units(0).unwrap(), 7);
    }

    #[test]
    fn test_fractional_scaling() {
        assert_eq!(amount("2.5").to_base_units(6).unwrap(), 2_500_000);
        assert_eq!(amount("0.000001").to_base_units(6).unwrap(), 1);
        assert_eq!(amount(".75").to_base_units(2).unwrap(), 75);
        // 0.1 is exact here, unlike 0.1 * 1e9 in floating point
        assert_eq!(amount("0.1").to_base_units(9).unwrap(), 100_000_000);
    }

    #[test]
    fn test_excess_fraction_truncates() {
        let a = amount("1.23456789");
        assert!(a.truncates_at(6));
        assert_eq!(a.to_base_units(6).unwrap(), 1_234_567);
        assert_eq!(amount("0.0000001").to_base_units(6).unwrap(), 0);
        assert!(!amount("1.50").truncates_at(1));
    }

    #[test]
    fn test_overflow_is_invalid_input() {
        let err = HumanAmount::from(u64::MAX).to_base_units(1).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
        assert!(HumanAmount::from(1).to_base_units(20).is_err());
        assert_eq!(HumanAmount::from(1).to_base_units(19).unwrap(), 10u64.pow(19));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", ".", "-1", "1.2.3", "abc", "1e9", " 1 0"] {
            assert!(bad.parse::<HumanAmount>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_format_base_units() {
        assert_eq!(format_base_units(2_500_000, 6), "2.5");
        assert_eq!(format_base_units(10_000_000_000, 9), "10");
        assert_eq!(format_base_units(1, 9), "0.000000001");
        assert_eq!(amount("2.50").to_string(), "2.5");
    }

    #[test]
    fn test_json_accepts_numbers_and_strings() {
        let parse = |json: &str| serde_json::from_str::<HumanAmount>(json);

        assert_eq!(parse("10").unwrap(), HumanAmount::whole(10));
        assert_eq!(parse("\"10\"").unwrap(), HumanAmount::whole(10));
        assert_eq!(parse("2.5").unwrap(), amount("2.5"));
        assert_eq!(parse("0.000001").unwrap().to_base_units(6).unwrap(), 1);
        assert!(parse("-1").is_err());
        assert!(parse("\"1e3\"").is_err());
        assert!(parse("true").is_err());
    }
}
