//! Launchpad Errors
//!
//! Every failure falls into one of five categories. Any error aborts the whole
//! operation with no partial state change.

use lib_fees::FeeError;
use lib_tokens::TokenError;
use lib_types::{Address, Amount, Bps, Nonce, TokenId};
use thiserror::Error;

use crate::venue::VenueError;

/// Error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    State,
    Arithmetic,
    ExternalCall,
}

/// Malformed or out-of-range input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Amount {amount} is below the dust floor {floor}")]
    BelowDustFloor { amount: Amount, floor: Amount },

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Trade would return nothing")]
    ZeroOutput,

    #[error("Engine allowance {have} is below sell amount {need}")]
    InsufficientAllowance { have: Amount, need: Amount },

    #[error("Invalid token metadata: {0}")]
    InvalidMetadata(String),

    #[error("Fee rate {rate_bps} bps exceeds maximum {max_bps} bps")]
    FeeRateTooHigh { rate_bps: Bps, max_bps: Bps },

    #[error("Withdrawal of {requested} exceeds fee balance {available}")]
    WithdrawalExceedsBalance { requested: Amount, available: Amount },
}

/// Invalid signature, replayed nonce or missing operator rights
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Invalid authorization signature for {caller}")]
    InvalidSignature { caller: Address },

    #[error("Nonce {nonce} for {caller} is not above last used nonce {last}")]
    StaleNonce {
        caller: Address,
        nonce: Nonce,
        last: Nonce,
    },

    #[error("Caller {caller} is not the operator")]
    NotOperator { caller: Address },

    #[error("Invalid authority key: {0}")]
    InvalidAuthorityKey(String),
}

/// Operation not allowed in the pool's current state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("No pool for token {0:?}")]
    PoolNotFound(TokenId),

    #[error("Pool already exists for token {0:?}")]
    PoolExists(TokenId),

    #[error("Token {0:?} has graduated; curve trading is closed")]
    Graduated(TokenId),

    #[error("Token {0:?} still has tradable supply")]
    NotDrained(TokenId),

    #[error("Another mutating call is already in flight")]
    Reentrant,
}

/// Integer math that would overflow, underflow or divide by zero
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Overflow computing {0}")]
    Overflow(&'static str),

    #[error("Underflow computing {0}")]
    Underflow(&'static str),

    #[error("Division by zero computing {0}")]
    DivisionByZero(&'static str),

    #[error("Reserve invariant violated for {token:?}: k={k}, product={product}")]
    InvariantViolated {
        token: TokenId,
        k: Amount,
        product: Amount,
    },
}

/// A collaborator call did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalCallFailure {
    #[error("Token transfer failed: {0}")]
    TokenTransfer(#[from] TokenError),

    #[error("Liquidity venue call failed: {0}")]
    Venue(#[from] VenueError),
}

/// Launchpad error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("External call failure: {0}")]
    ExternalCall(#[from] ExternalCallFailure),
}

impl LaunchError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LaunchError::Validation(_) => ErrorKind::Validation,
            LaunchError::Authorization(_) => ErrorKind::Authorization,
            LaunchError::State(_) => ErrorKind::State,
            LaunchError::Arithmetic(_) => ErrorKind::Arithmetic,
            LaunchError::ExternalCall(_) => ErrorKind::ExternalCall,
        }
    }
}

impl From<TokenError> for LaunchError {
    fn from(err: TokenError) -> Self {
        LaunchError::ExternalCall(ExternalCallFailure::TokenTransfer(err))
    }
}

impl From<VenueError> for LaunchError {
    fn from(err: VenueError) -> Self {
        LaunchError::ExternalCall(ExternalCallFailure::Venue(err))
    }
}

impl From<FeeError> for LaunchError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::NotOperator { caller } => AuthorizationError::NotOperator { caller }.into(),
            FeeError::InsufficientBalance {
                requested,
                available,
            } => ValidationError::WithdrawalExceedsBalance {
                requested,
                available,
            }
            .into(),
            FeeError::ZeroAmount => ValidationError::ZeroAmount.into(),
            FeeError::RateTooHigh { rate_bps, max_bps } => {
                ValidationError::FeeRateTooHigh { rate_bps, max_bps }.into()
            }
            FeeError::Overflow => ArithmeticError::Overflow("fee").into(),
        }
    }
}

/// Result type for launchpad operations
pub type LaunchResult<T> = Result<T, LaunchError>;
