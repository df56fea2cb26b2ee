//! Fixed-point token amounts with six fractional digits.

use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorKind, EscrowError};
use crate::Result;

/// Number of fractional digits of the escrowed asset.
pub const DECIMALS: u32 = 6;

const SCALE: u128 = 10u128.pow(DECIMALS);

/// Amount of the escrowed asset, held in base units (10^-6 of one token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(transparent))]
pub struct Amount(u128);

impl Amount {
    pub const fn base_units(&self) -> u128 {
        self.0
    }

    /// Parses a human-readable, non-negative decimal such as `"12.5"` into
    /// base units, rounding half-up past the sixth fractional digit.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));

        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
            return Err(invalid(input));
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .ok()
                .and_then(|w| w.checked_mul(SCALE))
                .ok_or_else(|| invalid(input))?
        };

        let kept = frac.len().min(DECIMALS as usize);
        let (head, tail) = frac.split_at(kept);
        let mut frac_units = if head.is_empty() {
            0
        } else {
            let pad = 10u128.pow(DECIMALS - kept as u32);
            head.parse::<u128>().map_err(|_| invalid(input))? * pad
        };
        if tail.as_bytes().first().is_some_and(|d| *d >= b'5') {
            frac_units += 1;
        }

        whole_units
            .checked_add(frac_units)
            .map(Self)
            .ok_or_else(|| invalid(input))
    }
}

fn invalid(input: &str) -> EscrowError {
    EscrowError::new(ErrorKind::InvalidAmount).with_message(format!(
        "Invalid amount: {input:?} is not a non-negative decimal value"
    ))
}

impl FromStr for Amount {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<f64> for Amount {
    type Error = EscrowError;

    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(invalid(&value.to_string()));
        }
        // `Display` for f64 never uses exponent notation.
        Self::parse(&value.to_string())
    }
}

impl fmt::Display for Amount {
    /// Fixed-width decimal with six fractional digits, e.g. `1.500000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let rem = self.0 % SCALE;
        write!(f, "{}.{:0>width$}", whole, rem, width = DECIMALS as usize)
    }
}
