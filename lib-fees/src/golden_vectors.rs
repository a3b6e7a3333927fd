//! Golden Vector Tests for the Trade Fee Model
//!
//! These tests pin EXACT fee values for specific inputs. A failure here means
//! fee arithmetic changed and every quote a client computed offline is now
//! wrong.
//!
//! # Updating Golden Vectors
//!
//! If you need to change fee logic:
//! 1. Update the fee computation code
//! 2. Update these golden vectors with new expected values
//! 3. Document the change in the commit message

#[cfg(test)]
mod tests {
    use crate::{compute_trade_fee, split_fee};

    /// 1 whole unit (18 decimals) at 1%
    ///
    /// - fee: 1e18 * 100 / 10000 = 1e16
    /// - net: 1e18 - 1e16 = 9.9e17
    #[test]
    fn golden_one_unit_one_percent() {
        let split = split_fee(1_000_000_000_000_000_000, 100).unwrap();
        assert_eq!(split.fee, 10_000_000_000_000_000, "Golden vector mismatch: fee");
        assert_eq!(split.net, 990_000_000_000_000_000, "Golden vector mismatch: net");
    }

    /// Smallest amount that pays a non-zero fee at 1%
    #[test]
    fn golden_dust_boundary() {
        assert_eq!(compute_trade_fee(99, 100).unwrap(), 0);
        assert_eq!(compute_trade_fee(100, 100).unwrap(), 1);
    }

    /// Maximum rate (10%) on an odd amount
    ///
    /// - fee: 123_456_789 * 1000 / 10000 = 12_345_678 (floor of 12_345_678.9)
    #[test]
    fn golden_max_rate_floor() {
        let split = split_fee(123_456_789, 1_000).unwrap();
        assert_eq!(split.fee, 12_345_678);
        assert_eq!(split.net, 111_111_111);
    }

    /// Sell-side payout from the reference small curve (fundsOut = 990 at 1%)
    #[test]
    fn golden_small_sell_payout() {
        let split = split_fee(990, 100).unwrap();
        assert_eq!(split.fee, 9);
        assert_eq!(split.net, 981);
    }
}
