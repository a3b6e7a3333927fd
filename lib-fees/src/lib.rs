//! Launchpad Fee Model
//!
//! Trade fees are a floor-rounded basis-point cut of the gross funds side of
//! a trade. Everything here is integer math on `u128` with checked
//! operations, so two nodes pricing the same trade always agree.
//!
//! The [`FeeLedger`] holds the collected balance and the operator allowed to
//! withdraw it.
//!
//! ```ignore
//! use lib_fees::{split_fee, FeeLedger};
//!
//! let split = split_fee(1_000_000, 100)?; // fee 10_000, net 990_000
//! ledger.accumulate(split.fee)?;
//! ```

pub mod ledger;
pub mod model;

#[cfg(test)]
mod golden_vectors;

pub use ledger::{FeeError, FeeLedger, FeeResult};
pub use model::{compute_trade_fee, split_fee, validate_fee_rate, FeeSplit, MAX_FEE_BPS};
