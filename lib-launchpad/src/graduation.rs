//! Graduation
//!
//! Runs once per token, right after the buy that drained its tradable
//! reserve. The locked allocation and the funds the curve accumulated seed a
//! full-range venue position at `locked / accumulated`. The position belongs
//! to engine custody, so no trader can pull the liquidity back out.
//!
//! Any venue or transfer failure propagates and the triggering buy is rolled
//! back with it.

use lib_tokens::TokenLedger;
use lib_types::{Address, Amount, TokenId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LaunchConfig;
use crate::errors::{ArithmeticError, LaunchResult, StateError};
use crate::events::LaunchEvent;
use crate::state::World;
use crate::venue::{LiquidityVenue, PairKey, PositionId, PriceRatio, SeedAmounts, TickRange};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduationReceipt {
    pub pair: PairKey,
    pub starting_price: PriceRatio,
    pub locked_tokens: Amount,
    pub funds: Amount,
    pub position: PositionId,
    pub position_owner: Address,
}

pub struct GraduationManager<'a> {
    config: &'a LaunchConfig,
}

impl<'a> GraduationManager<'a> {
    pub fn new(config: &'a LaunchConfig) -> Self {
        Self { config }
    }

    pub fn graduate<L: TokenLedger, V: LiquidityVenue>(
        &self,
        world: &mut World<L, V>,
        token_id: &TokenId,
    ) -> LaunchResult<GraduationReceipt> {
        let record = world.state.registry.record(token_id)?;
        if record.graduated {
            return Err(StateError::Graduated(*token_id).into());
        }
        if record.pool.token_reserve != 0 {
            return Err(StateError::NotDrained(*token_id).into());
        }
        let locked_tokens = record.locked_allocation;
        let funds = record.accumulated_funds;
        if funds == 0 {
            return Err(ArithmeticError::DivisionByZero("graduation price").into());
        }

        let starting_price = PriceRatio {
            token_amount: locked_tokens,
            funds_amount: funds,
        };
        let pair = PairKey::native_pair(*token_id, self.config.venue_fee_tier);
        let range = TickRange::full_range(self.config.tick_spacing)?;
        let custody = self.config.custody;

        world.venue.initialize_pool(&pair, starting_price)?;

        let venue_custody = world.venue.custody_address();
        if locked_tokens > 0 {
            world
                .ledger
                .transfer(token_id, &custody, &venue_custody, locked_tokens)?;
        }
        world
            .ledger
            .transfer(&TokenId::NATIVE, &custody, &venue_custody, funds)?;

        let position = world.venue.seed_liquidity(
            &pair,
            range,
            SeedAmounts {
                token_amount: locked_tokens,
                funds_amount: funds,
            },
            &custody,
        )?;

        world.state.registry.mark_graduated(token_id, position)?;

        let receipt = GraduationReceipt {
            pair,
            starting_price,
            locked_tokens,
            funds,
            position,
            position_owner: custody,
        };
        let seq = world.state.seq;
        world.state.emit(LaunchEvent::TokenGraduated {
            seq,
            token_id: *token_id,
            pair: receipt.pair.clone(),
            starting_price,
            locked_tokens,
            funds,
            position,
            position_owner: custody,
        });

        info!(
            token = %token_id,
            locked_tokens,
            funds,
            position = position.0,
            "token graduated"
        );
        Ok(receipt)
    }
}
