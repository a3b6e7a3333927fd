//! External liquidity venue
//!
//! A graduated token leaves the curve and trades on a concentrated-liquidity
//! venue. The engine only needs two calls from it: open a pair at a starting
//! price and seed a full-range position.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use lib_types::{Address, Amount, TokenId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest tick a position may start at
pub const MIN_TICK: i32 = -887_272;
/// Highest tick a position may end at
pub const MAX_TICK: i32 = 887_272;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    #[error("Pair already initialized: {0:?}")]
    PoolExists(TokenId),

    #[error("Pair not initialized")]
    PoolNotInitialized,

    #[error("Invalid tick range [{lower}, {upper}]")]
    InvalidRange { lower: i32, upper: i32 },

    #[error("Invalid tick spacing {0}")]
    InvalidTickSpacing(i32),

    #[error("Position must hold both assets")]
    ZeroLiquidity,

    #[error("Position {0:?} not found")]
    PositionNotFound(PositionId),

    #[error("{caller} does not own position {position:?}")]
    NotPositionOwner {
        position: PositionId,
        caller: Address,
    },

    #[error("Venue unavailable: {0}")]
    Unavailable(String),
}

/// Identifier the venue hands back for a liquidity position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

/// Venue pair: launched token against the native funds asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub token: TokenId,
    pub quote: TokenId,
    pub fee_tier: u32,
}

impl PairKey {
    pub fn native_pair(token: TokenId, fee_tier: u32) -> Self {
        Self {
            token,
            quote: TokenId::NATIVE,
            fee_tier,
        }
    }
}

/// Starting price expressed as `token_amount` tokens per `funds_amount` funds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRatio {
    pub token_amount: Amount,
    pub funds_amount: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    /// Widest range aligned to `spacing`
    pub fn full_range(spacing: i32) -> Result<Self, VenueError> {
        if spacing <= 0 || spacing > MAX_TICK {
            return Err(VenueError::InvalidTickSpacing(spacing));
        }
        // Truncation toward zero keeps both ends inside [MIN_TICK, MAX_TICK].
        let lower = (MIN_TICK / spacing) * spacing;
        let upper = (MAX_TICK / spacing) * spacing;
        if lower >= upper {
            return Err(VenueError::InvalidRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub fn is_valid_for(&self, spacing: i32) -> bool {
        spacing > 0
            && self.lower < self.upper
            && self.lower >= MIN_TICK
            && self.upper <= MAX_TICK
            && self.lower % spacing == 0
            && self.upper % spacing == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAmounts {
    pub token_amount: Amount,
    pub funds_amount: Amount,
}

/// Liquidity venue used for graduation
pub trait LiquidityVenue {
    /// Account the engine transfers seed assets to before `seed_liquidity`
    fn custody_address(&self) -> Address;

    /// Open `pair` at `starting_price`
    fn initialize_pool(&mut self, pair: &PairKey, starting_price: PriceRatio)
        -> Result<(), VenueError>;

    /// Mint a position over `range` funded with `amounts`, owned by `owner`
    fn seed_liquidity(
        &mut self,
        pair: &PairKey,
        range: TickRange,
        amounts: SeedAmounts,
        owner: &Address,
    ) -> Result<PositionId, VenueError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenuePool {
    pub starting_price: PriceRatio,
    pub token_liquidity: Amount,
    pub funds_liquidity: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub id: PositionId,
    pub pair: PairKey,
    pub range: TickRange,
    pub amounts: SeedAmounts,
    pub owner: Address,
}

/// Venue bookkeeping held in memory
///
/// Tables sit behind `Arc` so cloning the venue is cheap; they are copied on
/// first write.
#[derive(Debug, Clone)]
pub struct InMemoryVenue {
    custody: Address,
    pools: Arc<HashMap<PairKey, VenuePool>>,
    positions: Arc<BTreeMap<PositionId, Position>>,
    next_position: u64,
}

impl InMemoryVenue {
    pub fn new(custody: Address) -> Self {
        Self {
            custody,
            pools: Arc::default(),
            positions: Arc::default(),
            next_position: 1,
        }
    }

    pub fn pool(&self, pair: &PairKey) -> Option<&VenuePool> {
        self.pools.get(pair)
    }

    pub fn position(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn positions_owned_by<'a>(
        &'a self,
        owner: &'a Address,
    ) -> impl Iterator<Item = &'a Position> {
        self.positions.values().filter(move |p| &p.owner == owner)
    }

    /// Remove a position; only its owner may do so
    pub fn withdraw_liquidity(
        &mut self,
        id: PositionId,
        caller: &Address,
    ) -> Result<SeedAmounts, VenueError> {
        let position = self
            .positions
            .get(&id)
            .ok_or(VenueError::PositionNotFound(id))?;
        if &position.owner != caller {
            return Err(VenueError::NotPositionOwner {
                position: id,
                caller: *caller,
            });
        }
        let position = Arc::make_mut(&mut self.positions)
            .remove(&id)
            .ok_or(VenueError::PositionNotFound(id))?;
        if let Some(pool) = Arc::make_mut(&mut self.pools).get_mut(&position.pair) {
            let amounts = position.amounts;
            pool.token_liquidity = pool.token_liquidity.saturating_sub(amounts.token_amount);
            pool.funds_liquidity = pool.funds_liquidity.saturating_sub(amounts.funds_amount);
        }
        Ok(position.amounts)
    }
}

impl LiquidityVenue for InMemoryVenue {
    fn custody_address(&self) -> Address {
        self.custody
    }

    fn initialize_pool(
        &mut self,
        pair: &PairKey,
        starting_price: PriceRatio,
    ) -> Result<(), VenueError> {
        if self.pools.contains_key(pair) {
            return Err(VenueError::PoolExists(pair.token));
        }
        if starting_price.token_amount == 0 || starting_price.funds_amount == 0 {
            return Err(VenueError::ZeroLiquidity);
        }
        Arc::make_mut(&mut self.pools).insert(
            pair.clone(),
            VenuePool {
                starting_price,
                token_liquidity: 0,
                funds_liquidity: 0,
            },
        );
        Ok(())
    }

    fn seed_liquidity(
        &mut self,
        pair: &PairKey,
        range: TickRange,
        amounts: SeedAmounts,
        owner: &Address,
    ) -> Result<PositionId, VenueError> {
        if !self.pools.contains_key(pair) {
            return Err(VenueError::PoolNotInitialized);
        }
        if range.lower >= range.upper || range.lower < MIN_TICK || range.upper > MAX_TICK {
            return Err(VenueError::InvalidRange {
                lower: range.lower,
                upper: range.upper,
            });
        }
        if amounts.token_amount == 0 || amounts.funds_amount == 0 {
            return Err(VenueError::ZeroLiquidity);
        }

        let pool = Arc::make_mut(&mut self.pools)
            .get_mut(pair)
            .ok_or(VenueError::PoolNotInitialized)?;
        pool.token_liquidity = pool.token_liquidity.saturating_add(amounts.token_amount);
        pool.funds_liquidity = pool.funds_liquidity.saturating_add(amounts.funds_amount);

        let id = PositionId(self.next_position);
        self.next_position += 1;
        Arc::make_mut(&mut self.positions).insert(
            id,
            Position {
                id,
                pair: pair.clone(),
                range,
                amounts,
                owner: *owner,
            },
        );
        Ok(id)
    }
}
