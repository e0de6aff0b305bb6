//! USDC amount conversion.
//!
//! Checkout totals are quoted in USD as decimals but transferred on-chain in
//! the token's smallest unit. USDC has 6 decimals, so `$20.00` is
//! `20_000_000` base units. The transfer itself happens client-side; these
//! helpers exist so every component agrees on the fixed-point contract.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Number of decimals in the USDC token contract.
pub const USDC_DECIMALS: u32 = 6;

/// USDC token contract address on Base Sepolia.
pub const USDC_CONTRACT_ADDRESS: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

/// Errors converting a decimal USD amount to token base units.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenAmountError {
    /// The amount is negative.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount has more fractional digits than the token supports.
    #[error("amount has more than {USDC_DECIMALS} decimal places")]
    TooPrecise,
    /// The amount does not fit in a u64 of base units.
    #[error("amount is too large to express in token base units")]
    Overflow,
}

/// Convert a decimal USD amount to USDC base units (amount × 10^6).
///
/// # Errors
///
/// Returns an error if the amount is negative, has sub-micro precision, or
/// overflows a `u64`.
pub fn to_base_units(amount: Decimal) -> Result<u64, TokenAmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(TokenAmountError::Negative);
    }

    let scaled = amount
        .checked_mul(Decimal::from(10u64.pow(USDC_DECIMALS)))
        .ok_or(TokenAmountError::Overflow)?;

    if !scaled.fract().is_zero() {
        return Err(TokenAmountError::TooPrecise);
    }

    scaled.to_u64().ok_or(TokenAmountError::Overflow)
}

/// Convert USDC base units back to a decimal USD amount.
#[must_use]
pub fn from_base_units(units: u64) -> Decimal {
    (Decimal::from(units) / Decimal::from(10u64.pow(USDC_DECIMALS))).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal")
    }

    #[test]
    fn twenty_dollars_is_twenty_million_units() {
        assert_eq!(to_base_units(dec("20.00")).expect("converts"), 20_000_000);
    }

    #[test]
    fn fractional_cents_convert() {
        assert_eq!(to_base_units(dec("0.000001")).expect("converts"), 1);
    }

    #[test]
    fn rejects_sub_micro_precision() {
        assert_eq!(
            to_base_units(dec("0.0000001")),
            Err(TokenAmountError::TooPrecise)
        );
    }

    #[test]
    fn rejects_negative_amounts() {
        assert_eq!(to_base_units(dec("-1")), Err(TokenAmountError::Negative));
    }

    #[test]
    fn base_units_round_trip() {
        let units = to_base_units(dec("19.99")).expect("converts");
        assert_eq!(from_base_units(units), dec("19.99").normalize());
    }
}
