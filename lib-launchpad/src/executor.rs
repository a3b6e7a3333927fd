//! Trade execution
//!
//! Buy and sell against a curve pool. Quoting is pure and shared with the
//! read API; execution applies a quote to the world.
//!
//! # Buy
//!
//! ```text
//! fee        = floor(V * rate / 10_000)
//! tokens_out = curve.tokens_out(V - fee)
//! if tokens_out >= T:
//!     required = curve.funds_out(T)          // inverse curve
//!     fee      = floor(required * rate / 10_000)
//!     refund   = V - required - fee
//!     T = 0, F += required                   // graduation follows
//! else:
//!     T -= tokens_out, F += V - fee
//! ```
//!
//! # Sell
//!
//! ```text
//! funds_out = curve.funds_out(A)
//! fee       = floor(funds_out * rate / 10_000)
//! T += A, F -= funds_out, trader receives funds_out - fee
//! ```

use lib_fees::{compute_trade_fee, split_fee};
use lib_tokens::TokenLedger;
use lib_types::{Address, Amount, Bps, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LaunchConfig;
use crate::curve::BondingCurve;
use crate::errors::{ArithmeticError, LaunchResult, ValidationError};
use crate::events::{LaunchEvent, TradeSide};
use crate::graduation::{GraduationManager, GraduationReceipt};
use crate::pool::PoolRecord;
use crate::replay::{Authorization, SignatureVerifier};
use crate::state::World;
use crate::venue::LiquidityVenue;

/// Collaborators a trade reads but never mutates
pub struct TradeContext<'a> {
    pub config: &'a LaunchConfig,
    pub verifier: &'a dyn SignatureVerifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyRequest {
    pub token_id: TokenId,
    pub caller: Address,
    /// Funds offered, fee included
    pub funds: Amount,
    pub auth: Authorization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellRequest {
    pub token_id: TokenId,
    pub caller: Address,
    pub tokens: Amount,
    pub auth: Authorization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyQuote {
    pub funds_in: Amount,
    pub fee: Amount,
    /// Funds that enter the pool reserve
    pub net: Amount,
    pub tokens_out: Amount,
    pub refund: Amount,
    /// Buy takes the whole remaining reserve and graduates the token
    pub clamped: bool,
    pub token_reserve_after: Amount,
    pub funds_reserve_after: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellQuote {
    pub tokens_in: Amount,
    /// Gross funds released by the curve
    pub funds_out: Amount,
    pub fee: Amount,
    /// Paid to the seller
    pub net: Amount,
    pub token_reserve_after: Amount,
    pub funds_reserve_after: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyReceipt {
    pub quote: BuyQuote,
    pub graduation: Option<GraduationReceipt>,
}

pub type SellReceipt = SellQuote;

/// Price a buy of `funds` against `record` without touching state
pub fn quote_buy(record: &PoolRecord, rate_bps: Bps, funds: Amount) -> LaunchResult<BuyQuote> {
    let curve = BondingCurve::new(record)?;
    let pool = *curve.pool();
    let split = split_fee(funds, rate_bps)?;
    let tokens_out = curve.tokens_out(split.net)?;

    if tokens_out >= pool.token_reserve {
        let required = curve.funds_for_remaining()?;
        let fee = compute_trade_fee(required, rate_bps)?;
        let refund = funds
            .checked_sub(required)
            .and_then(|rest| rest.checked_sub(fee))
            .ok_or(ArithmeticError::Underflow("buy refund"))?;
        let funds_reserve_after = pool
            .funds_reserve
            .checked_add(required)
            .ok_or(ArithmeticError::Overflow("funds reserve"))?;
        return Ok(BuyQuote {
            funds_in: funds,
            fee,
            net: required,
            tokens_out: pool.token_reserve,
            refund,
            clamped: true,
            token_reserve_after: 0,
            funds_reserve_after,
        });
    }

    if tokens_out == 0 {
        return Err(ValidationError::ZeroOutput.into());
    }
    let funds_reserve_after = pool
        .funds_reserve
        .checked_add(split.net)
        .ok_or(ArithmeticError::Overflow("funds reserve"))?;
    Ok(BuyQuote {
        funds_in: funds,
        fee: split.fee,
        net: split.net,
        tokens_out,
        refund: 0,
        clamped: false,
        token_reserve_after: pool.token_reserve - tokens_out,
        funds_reserve_after,
    })
}

/// Price a sell of `tokens` against `record` without touching state
pub fn quote_sell(record: &PoolRecord, rate_bps: Bps, tokens: Amount) -> LaunchResult<SellQuote> {
    let curve = BondingCurve::new(record)?;
    if tokens == 0 {
        return Err(ValidationError::ZeroAmount.into());
    }
    let pool = *curve.pool();
    let funds_out = curve.funds_out(tokens)?;
    if funds_out == 0 {
        return Err(ValidationError::ZeroOutput.into());
    }
    let split = split_fee(funds_out, rate_bps)?;
    let token_reserve_after = pool
        .token_reserve
        .checked_add(tokens)
        .ok_or(ArithmeticError::Overflow("token reserve"))?;
    Ok(SellQuote {
        tokens_in: tokens,
        funds_out,
        fee: split.fee,
        net: split.net,
        token_reserve_after,
        funds_reserve_after: pool.funds_reserve - funds_out,
    })
}

pub fn buy<L: TokenLedger, V: LiquidityVenue>(
    world: &mut World<L, V>,
    ctx: &TradeContext<'_>,
    request: &BuyRequest,
) -> LaunchResult<BuyReceipt> {
    let token_id = request.token_id;
    world.state.registry.get(&token_id)?;

    let floor = ctx.config.min_buy_funds();
    if request.funds < floor {
        return Err(ValidationError::BelowDustFloor {
            amount: request.funds,
            floor,
        }
        .into());
    }

    world
        .state
        .replay
        .authorize(ctx.verifier, &request.caller, &request.auth)?;

    let record = world.state.registry.get(&token_id)?;
    let quote = quote_buy(record, world.state.fee_rate_bps, request.funds)?;
    debug!(token = %token_id, ?quote, "buy quoted");

    let registry = &mut world.state.registry;
    if quote.clamped {
        registry.drain(&token_id, quote.funds_reserve_after)?;
    } else {
        registry.set_reserves(&token_id, quote.token_reserve_after, quote.funds_reserve_after)?;
    }
    registry.credit_funds(&token_id, quote.net)?;
    world.state.fees.accumulate(quote.fee)?;

    let custody = ctx.config.custody;
    world
        .ledger
        .transfer(&TokenId::NATIVE, &request.caller, &custody, request.funds)?;
    world
        .ledger
        .transfer(&token_id, &custody, &request.caller, quote.tokens_out)?;
    if quote.refund > 0 {
        world
            .ledger
            .transfer(&TokenId::NATIVE, &custody, &request.caller, quote.refund)?;
    }

    let seq = world.state.seq;
    world.state.emit(LaunchEvent::TradeExecuted {
        seq,
        token_id,
        trader: request.caller,
        side: TradeSide::Buy,
        funds_amount: request.funds,
        token_amount: quote.tokens_out,
        fee: quote.fee,
        refund: quote.refund,
        token_reserve: quote.token_reserve_after,
        funds_reserve: quote.funds_reserve_after,
    });
    info!(
        token = %token_id,
        trader = %request.caller,
        funds = request.funds,
        tokens = quote.tokens_out,
        fee = quote.fee,
        clamped = quote.clamped,
        "buy executed"
    );

    let graduation = if quote.clamped {
        Some(GraduationManager::new(ctx.config).graduate(world, &token_id)?)
    } else {
        None
    };
    Ok(BuyReceipt { quote, graduation })
}

pub fn sell<L: TokenLedger, V: LiquidityVenue>(
    world: &mut World<L, V>,
    ctx: &TradeContext<'_>,
    request: &SellRequest,
) -> LaunchResult<SellReceipt> {
    let token_id = request.token_id;
    world.state.registry.get(&token_id)?;

    let custody = ctx.config.custody;
    let allowance = world.ledger.allowance(&token_id, &request.caller, &custody);
    if allowance < request.tokens {
        return Err(ValidationError::InsufficientAllowance {
            have: allowance,
            need: request.tokens,
        }
        .into());
    }
    if request.tokens == 0 {
        return Err(ValidationError::ZeroAmount.into());
    }

    world
        .state
        .replay
        .authorize(ctx.verifier, &request.caller, &request.auth)?;

    let record = world.state.registry.get(&token_id)?;
    let quote = quote_sell(record, world.state.fee_rate_bps, request.tokens)?;
    debug!(token = %token_id, ?quote, "sell quoted");

    let registry = &mut world.state.registry;
    registry.set_reserves(&token_id, quote.token_reserve_after, quote.funds_reserve_after)?;
    registry.debit_funds(&token_id, quote.funds_out)?;
    world.state.fees.accumulate(quote.fee)?;

    world.ledger.transfer_from(
        &token_id,
        &custody,
        &request.caller,
        &custody,
        request.tokens,
    )?;
    if quote.net > 0 {
        world
            .ledger
            .transfer(&TokenId::NATIVE, &custody, &request.caller, quote.net)?;
    }

    let seq = world.state.seq;
    world.state.emit(LaunchEvent::TradeExecuted {
        seq,
        token_id,
        trader: request.caller,
        side: TradeSide::Sell,
        funds_amount: quote.funds_out,
        token_amount: request.tokens,
        fee: quote.fee,
        refund: 0,
        token_reserve: quote.token_reserve_after,
        funds_reserve: quote.funds_reserve_after,
    });
    info!(
        token = %token_id,
        trader = %request.caller,
        tokens = request.tokens,
        funds_out = quote.funds_out,
        fee = quote.fee,
        "sell executed"
    );
    Ok(quote)
}
