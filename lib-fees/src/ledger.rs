//! Protocol Fee Ledger
//!
//! Accumulates the protocol fee taken on every trade. The balance only
//! decreases through an operator withdrawal and can never go negative.

use lib_types::{Address, Amount, Bps};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fee ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("Caller {caller} is not the fee operator")]
    NotOperator { caller: Address },

    #[error("Withdrawal of {requested} exceeds fee balance {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Fee rate {rate_bps} bps exceeds maximum {max_bps} bps")]
    RateTooHigh { rate_bps: Bps, max_bps: Bps },

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Result type for fee operations
pub type FeeResult<T> = Result<T, FeeError>;

/// Global protocol fee balance, gated by a single operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLedger {
    operator: Address,
    balance: Amount,
    total_collected: Amount,
    total_withdrawn: Amount,
}

impl FeeLedger {
    /// Create an empty ledger owned by `operator`
    pub fn new(operator: Address) -> Self {
        Self {
            operator,
            balance: 0,
            total_collected: 0,
            total_withdrawn: 0,
        }
    }

    /// Designated operator
    pub fn operator(&self) -> &Address {
        &self.operator
    }

    /// Current withdrawable balance
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Lifetime fees accumulated
    pub fn total_collected(&self) -> Amount {
        self.total_collected
    }

    /// Lifetime fees withdrawn
    pub fn total_withdrawn(&self) -> Amount {
        self.total_withdrawn
    }

    /// Check that `caller` is the operator
    pub fn require_operator(&self, caller: &Address) -> FeeResult<()> {
        if caller != &self.operator {
            return Err(FeeError::NotOperator { caller: *caller });
        }
        Ok(())
    }

    /// Add a trade fee to the balance
    pub fn accumulate(&mut self, amount: Amount) -> FeeResult<()> {
        let balance = self.balance.checked_add(amount).ok_or(FeeError::Overflow)?;
        let collected = self
            .total_collected
            .checked_add(amount)
            .ok_or(FeeError::Overflow)?;
        self.balance = balance;
        self.total_collected = collected;
        Ok(())
    }

    /// Debit `amount` for payout; the caller moves the funds
    pub fn withdraw(&mut self, caller: &Address, amount: Amount) -> FeeResult<Amount> {
        self.require_operator(caller)?;
        if amount == 0 {
            return Err(FeeError::ZeroAmount);
        }
        if amount > self.balance {
            return Err(FeeError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }

        self.balance -= amount;
        self.total_withdrawn = self
            .total_withdrawn
            .checked_add(amount)
            .ok_or(FeeError::Overflow)?;

        tracing::info!(operator = %caller, amount, remaining = self.balance, "fees withdrawn");
        Ok(self.balance)
    }
}
