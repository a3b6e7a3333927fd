//! Constant-product bonding curve
//!
//! # Formulas
//!
//! ```text
//! k           = T0 * F0
//! tokens_out  = T - floor(k / (F + funds_in))
//! funds_out   = F - floor(k / (T + tokens_in))
//! token quote = floor(k / F)
//! funds quote = floor(k / T)
//! ```
//!
//! Pure functions of a pool snapshot. Flooring always favors the pool, so a
//! trade can never pull out more than the exact curve would allow.

use lib_types::Amount;

use crate::errors::{ArithmeticError, LaunchResult, StateError};
use crate::pool::{Pool, PoolRecord};

/// Read-only pricing view over one pool
#[derive(Debug, Clone, Copy)]
pub struct BondingCurve {
    pool: Pool,
    k: Amount,
}

impl BondingCurve {
    /// Pricing for a pool that is still trading
    pub fn new(record: &PoolRecord) -> LaunchResult<Self> {
        if record.graduated {
            return Err(StateError::Graduated(record.token_id).into());
        }
        Self::from_pool(record.pool)
    }

    pub fn from_pool(pool: Pool) -> LaunchResult<Self> {
        let k = pool.k()?;
        Ok(Self { pool, k })
    }

    pub fn k(&self) -> Amount {
        self.k
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Tokens released for `funds_in` net funds
    pub fn tokens_out(&self, funds_in: Amount) -> LaunchResult<Amount> {
        let funds_after = self
            .pool
            .funds_reserve
            .checked_add(funds_in)
            .ok_or(ArithmeticError::Overflow("funds reserve"))?;
        let tokens_after = self
            .k
            .checked_div(funds_after)
            .ok_or(ArithmeticError::DivisionByZero("tokens out"))?;
        self.pool
            .token_reserve
            .checked_sub(tokens_after)
            .ok_or_else(|| ArithmeticError::Underflow("tokens out").into())
    }

    /// Gross funds released for `tokens_in` tokens
    pub fn funds_out(&self, tokens_in: Amount) -> LaunchResult<Amount> {
        let tokens_after = self
            .pool
            .token_reserve
            .checked_add(tokens_in)
            .ok_or(ArithmeticError::Overflow("token reserve"))?;
        let funds_after = self
            .k
            .checked_div(tokens_after)
            .ok_or(ArithmeticError::DivisionByZero("funds out"))?;
        self.pool
            .funds_reserve
            .checked_sub(funds_after)
            .ok_or_else(|| ArithmeticError::Underflow("funds out").into())
    }

    /// Funds charged for the whole remaining token reserve
    ///
    /// Inverse curve with the reserve itself as the token delta. Prices a buy
    /// that would otherwise overshoot the pool.
    pub fn funds_for_remaining(&self) -> LaunchResult<Amount> {
        self.funds_out(self.pool.token_reserve)
    }

    /// Tokens per unit of funds, `floor(k / F)`
    pub fn token_quote(&self) -> LaunchResult<Amount> {
        self.k
            .checked_div(self.pool.funds_reserve)
            .ok_or_else(|| ArithmeticError::DivisionByZero("token quote").into())
    }

    /// Funds per token, `floor(k / T)`
    pub fn funds_quote(&self) -> LaunchResult<Amount> {
        self.k
            .checked_div(self.pool.token_reserve)
            .ok_or_else(|| ArithmeticError::DivisionByZero("funds quote").into())
    }
}
