//! Trade Fee Model
//!
//! # Formula
//!
//! ```text
//! fee = floor(amount * fee_rate_bps / 10_000)
//! net = amount - fee
//! ```
//!
//! Integer-only, floor rounding, so `fee <= amount` for every rate up to
//! [`MAX_FEE_BPS`]. The same function prices buys (fee on funds paid in) and
//! sells (fee on funds paid out).

use lib_types::{Amount, Bps, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

use crate::ledger::{FeeError, FeeResult};

/// Highest fee rate the operator may set (10%)
pub const MAX_FEE_BPS: Bps = 1_000;

/// Fee and remainder for one gross amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Gross amount the fee was charged on
    pub gross: Amount,
    /// Protocol fee
    pub fee: Amount,
    /// `gross - fee`
    pub net: Amount,
}

/// Reject fee rates above [`MAX_FEE_BPS`]
pub fn validate_fee_rate(rate_bps: Bps) -> FeeResult<()> {
    if rate_bps > MAX_FEE_BPS {
        return Err(FeeError::RateTooHigh {
            rate_bps,
            max_bps: MAX_FEE_BPS,
        });
    }
    Ok(())
}

/// `floor(amount * rate_bps / 10_000)`
pub fn compute_trade_fee(amount: Amount, rate_bps: Bps) -> FeeResult<Amount> {
    amount
        .checked_mul(rate_bps as Amount)
        .map(|scaled| scaled / BPS_DENOMINATOR)
        .ok_or(FeeError::Overflow)
}

/// Split a gross amount into fee and net
pub fn split_fee(gross: Amount, rate_bps: Bps) -> FeeResult<FeeSplit> {
    let fee = compute_trade_fee(gross, rate_bps)?;
    let net = gross.checked_sub(fee).ok_or(FeeError::Overflow)?;
    Ok(FeeSplit { gross, fee, net })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_one_percent() {
        let split = split_fee(1_000_000_000_000_000_000, 100).unwrap();
        assert_eq!(split.fee, 10_000_000_000_000_000);
        assert_eq!(split.net, 990_000_000_000_000_000);
    }

    #[test]
    fn test_fee_rounds_down() {
        assert_eq!(compute_trade_fee(99, 100).unwrap(), 0);
        assert_eq!(compute_trade_fee(100, 100).unwrap(), 1);
        assert_eq!(compute_trade_fee(199, 100).unwrap(), 1);
    }

    #[test]
    fn test_zero_rate() {
        let split = split_fee(12_345, 0).unwrap();
        assert_eq!(split.fee, 0);
        assert_eq!(split.net, 12_345);
    }

    #[test]
    fn test_rate_cap() {
        assert!(validate_fee_rate(MAX_FEE_BPS).is_ok());
        assert_eq!(
            validate_fee_rate(MAX_FEE_BPS + 1),
            Err(FeeError::RateTooHigh {
                rate_bps: MAX_FEE_BPS + 1,
                max_bps: MAX_FEE_BPS,
            })
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(compute_trade_fee(Amount::MAX, 2), Err(FeeError::Overflow));
    }

    proptest! {
        #[test]
        fn prop_fee_never_exceeds_amount(
            amount in 0u128..=u64::MAX as u128 * 1_000_000,
            rate in 0u16..=MAX_FEE_BPS,
        ) {
            let split = split_fee(amount, rate).unwrap();
            prop_assert_eq!(split.fee, amount * rate as u128 / 10_000);
            prop_assert!(split.fee <= amount);
            prop_assert_eq!(split.fee + split.net, amount);
        }
    }
}
