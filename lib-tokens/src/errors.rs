//! Token Ledger Errors

use lib_types::{Address, Amount, TokenId};
use thiserror::Error;

/// Error during token operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Insufficient allowance for spender {spender}: have {have}, need {need}")]
    InsufficientAllowance {
        spender: Address,
        have: Amount,
        need: Amount,
    },

    #[error("Token not found: {0:?}")]
    TokenNotFound(TokenId),

    #[error("Supply of {0:?} is fixed and already minted")]
    SupplySealed(TokenId),

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;
