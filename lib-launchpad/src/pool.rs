//! Pool registry
//!
//! One curve pool per launched token. A record is created exactly once at
//! deployment; reserves only change through trades and the whole record is
//! frozen after graduation.

use std::collections::HashMap;
use std::sync::Arc;

use lib_types::{Address, Amount, TokenId};
use serde::{Deserialize, Serialize};

use crate::errors::{ArithmeticError, LaunchResult, StateError, ValidationError};
use crate::venue::PositionId;

/// Curve reserves
///
/// `k` is never stored; it is recomputed from the initial reserves so it
/// cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub token_reserve: Amount,
    pub funds_reserve: Amount,
    pub initial_token_reserve: Amount,
    pub initial_funds_reserve: Amount,
}

impl Pool {
    pub fn new(initial_token_reserve: Amount, initial_funds_reserve: Amount) -> LaunchResult<Self> {
        if initial_token_reserve == 0 || initial_funds_reserve == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }
        let pool = Self {
            token_reserve: initial_token_reserve,
            funds_reserve: initial_funds_reserve,
            initial_token_reserve,
            initial_funds_reserve,
        };
        pool.k()?;
        Ok(pool)
    }

    /// Curve constant `k = T0 * F0`
    pub fn k(&self) -> LaunchResult<Amount> {
        self.initial_token_reserve
            .checked_mul(self.initial_funds_reserve)
            .ok_or_else(|| ArithmeticError::Overflow("curve constant").into())
    }

    /// `T * F`
    pub fn product(&self) -> LaunchResult<Amount> {
        self.token_reserve
            .checked_mul(self.funds_reserve)
            .ok_or_else(|| ArithmeticError::Overflow("reserve product").into())
    }

    /// Floor-division drift `k - T*F`
    pub fn drift(&self) -> LaunchResult<Amount> {
        let k = self.k()?;
        let product = self.product()?;
        k.checked_sub(product)
            .ok_or_else(|| ArithmeticError::Underflow("reserve drift").into())
    }

    /// Whether `0 <= k - T*F < max(T, F)` holds
    pub fn holds_invariant(&self) -> bool {
        match self.drift() {
            Ok(drift) => drift < self.token_reserve.max(self.funds_reserve),
            Err(_) => false,
        }
    }

    /// Reserves after a trade, rejected when they break the invariant
    pub(crate) fn with_reserves(
        &self,
        token_id: &TokenId,
        token_reserve: Amount,
        funds_reserve: Amount,
    ) -> LaunchResult<Self> {
        let next = Self {
            token_reserve,
            funds_reserve,
            ..*self
        };
        if !next.holds_invariant() {
            return Err(ArithmeticError::InvariantViolated {
                token: *token_id,
                k: self.k()?,
                product: token_reserve.saturating_mul(funds_reserve),
            }
            .into());
        }
        Ok(next)
    }
}

/// Metadata fixed at deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenProfile {
    pub name: String,
    pub symbol: String,
    pub creator: Address,
    pub total_supply: Amount,
}

/// Full per-token record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub token_id: TokenId,
    pub profile: TokenProfile,
    pub pool: Pool,
    /// Supply held back for venue seeding
    pub locked_allocation: Amount,
    /// Net funds that entered the curve and not yet paid back out
    pub accumulated_funds: Amount,
    pub graduated: bool,
    /// Venue position minted at graduation
    pub position: Option<PositionId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_pools: usize,
    pub active_pools: usize,
    pub graduated_pools: usize,
    pub funds_held: Amount,
}

/// Token id -> pool record
///
/// Records are shared between clones of the registry; a write copies only the
/// record it touches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRegistry {
    pools: HashMap<TokenId, Arc<PoolRecord>>,
    /// Creation order, for deterministic iteration
    order: Vec<TokenId>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pool; a token id can only ever be registered once
    pub fn create_pool(
        &mut self,
        token_id: TokenId,
        profile: TokenProfile,
        initial_token_reserve: Amount,
        initial_funds_reserve: Amount,
        locked_allocation: Amount,
    ) -> LaunchResult<&PoolRecord> {
        if self.pools.contains_key(&token_id) {
            return Err(StateError::PoolExists(token_id).into());
        }
        let pool = Pool::new(initial_token_reserve, initial_funds_reserve)?;
        self.order.push(token_id);
        let record = self.pools.entry(token_id).or_insert(Arc::new(PoolRecord {
            token_id,
            profile,
            pool,
            locked_allocation,
            accumulated_funds: 0,
            graduated: false,
            position: None,
        }));
        Ok(Arc::as_ref(record))
    }

    /// Record regardless of graduation
    pub fn record(&self, token_id: &TokenId) -> LaunchResult<&PoolRecord> {
        self.pools
            .get(token_id)
            .map(Arc::as_ref)
            .ok_or_else(|| StateError::PoolNotFound(*token_id).into())
    }

    /// Record of a pool still trading on the curve
    pub fn get(&self, token_id: &TokenId) -> LaunchResult<&PoolRecord> {
        let record = self.record(token_id)?;
        if record.graduated {
            return Err(StateError::Graduated(*token_id).into());
        }
        Ok(record)
    }

    pub fn contains(&self, token_id: &TokenId) -> bool {
        self.pools.contains_key(token_id)
    }

    pub fn is_graduated(&self, token_id: &TokenId) -> LaunchResult<bool> {
        Ok(self.record(token_id)?.graduated)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Records in creation order
    pub fn iter(&self) -> impl Iterator<Item = &PoolRecord> {
        self.order
            .iter()
            .filter_map(|id| self.pools.get(id).map(Arc::as_ref))
    }

    fn active_mut(&mut self, token_id: &TokenId) -> LaunchResult<&mut PoolRecord> {
        let record = self
            .pools
            .get_mut(token_id)
            .ok_or(StateError::PoolNotFound(*token_id))?;
        if record.graduated {
            return Err(StateError::Graduated(*token_id).into());
        }
        Ok(Arc::make_mut(record))
    }

    /// Replace reserves, keeping the product invariant
    pub fn set_reserves(
        &mut self,
        token_id: &TokenId,
        token_reserve: Amount,
        funds_reserve: Amount,
    ) -> LaunchResult<()> {
        let record = self.active_mut(token_id)?;
        record.pool = record
            .pool
            .with_reserves(token_id, token_reserve, funds_reserve)?;
        Ok(())
    }

    /// Empty the tradable side; only graduation follows
    pub(crate) fn drain(&mut self, token_id: &TokenId, funds_reserve: Amount) -> LaunchResult<()> {
        let record = self.active_mut(token_id)?;
        record.pool.token_reserve = 0;
        record.pool.funds_reserve = funds_reserve;
        Ok(())
    }

    pub fn credit_funds(&mut self, token_id: &TokenId, amount: Amount) -> LaunchResult<()> {
        let record = self.active_mut(token_id)?;
        record.accumulated_funds = record
            .accumulated_funds
            .checked_add(amount)
            .ok_or(ArithmeticError::Overflow("accumulated funds"))?;
        Ok(())
    }

    pub fn debit_funds(&mut self, token_id: &TokenId, amount: Amount) -> LaunchResult<()> {
        let record = self.active_mut(token_id)?;
        record.accumulated_funds = record
            .accumulated_funds
            .checked_sub(amount)
            .ok_or(ArithmeticError::Underflow("accumulated funds"))?;
        Ok(())
    }

    /// One-way transition out of curve trading
    pub fn mark_graduated(&mut self, token_id: &TokenId, position: PositionId) -> LaunchResult<()> {
        let record = self.active_mut(token_id)?;
        record.graduated = true;
        record.position = Some(position);
        record.locked_allocation = 0;
        record.accumulated_funds = 0;
        Ok(())
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total_pools: self.pools.len(),
            ..RegistryStats::default()
        };
        for record in self.pools.values() {
            if record.graduated {
                stats.graduated_pools += 1;
            } else {
                stats.active_pools += 1;
                stats.funds_held = stats.funds_held.saturating_add(record.accumulated_funds);
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LaunchError;

    fn profile() -> TokenProfile {
        TokenProfile {
            name: "Test".into(),
            symbol: "TST".into(),
            creator: Address::new([1u8; 32]),
            total_supply: 1_250,
        }
    }

    fn token() -> TokenId {
        TokenId::new([5u8; 32])
    }

    fn registry() -> PoolRegistry {
        let mut registry = PoolRegistry::new();
        registry
            .create_pool(token(), profile(), 1_000, 1_000, 250)
            .unwrap();
        registry
    }

    #[test]
    fn test_create_pool_once() {
        let mut registry = registry();
        let record = registry.get(&token()).unwrap();
        assert_eq!(record.pool.k().unwrap(), 1_000_000);
        assert_eq!(record.accumulated_funds, 0);

        let err = registry
            .create_pool(token(), profile(), 1_000, 1_000, 250)
            .unwrap_err();
        assert_eq!(err, LaunchError::State(StateError::PoolExists(token())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_pool_is_state_error() {
        let registry = PoolRegistry::new();
        let other = TokenId::new([6u8; 32]);
        assert_eq!(
            registry.get(&other).unwrap_err(),
            LaunchError::State(StateError::PoolNotFound(other))
        );
    }

    #[test]
    fn test_set_reserves_checks_invariant() {
        let mut registry = registry();
        registry.set_reserves(&token(), 502, 1_990).unwrap();

        let err = registry.set_reserves(&token(), 600, 1_990).unwrap_err();
        assert!(matches!(
            err,
            LaunchError::Arithmetic(ArithmeticError::InvariantViolated { .. })
        ));
        assert_eq!(registry.get(&token()).unwrap().pool.token_reserve, 502);
    }

    #[test]
    fn test_graduated_pool_is_frozen() {
        let mut registry = registry();
        registry.credit_funds(&token(), 500).unwrap();
        registry.drain(&token(), 1_500).unwrap();
        registry.mark_graduated(&token(), PositionId(1)).unwrap();

        assert!(registry.is_graduated(&token()).unwrap());
        assert_eq!(
            registry.get(&token()).unwrap_err(),
            LaunchError::State(StateError::Graduated(token()))
        );
        assert!(registry.credit_funds(&token(), 1).is_err());
        assert!(registry.mark_graduated(&token(), PositionId(2)).is_err());

        let record = registry.record(&token()).unwrap();
        assert_eq!(record.position, Some(PositionId(1)));
        assert_eq!(record.accumulated_funds, 0);

        let stats = registry.stats();
        assert_eq!(stats.graduated_pools, 1);
        assert_eq!(stats.active_pools, 0);
    }

    #[test]
    fn test_debit_below_zero_underflows() {
        let mut registry = registry();
        registry.credit_funds(&token(), 10).unwrap();
        assert_eq!(
            registry.debit_funds(&token(), 11).unwrap_err(),
            LaunchError::Arithmetic(ArithmeticError::Underflow("accumulated funds"))
        );
    }

    #[test]
    fn test_invariant_window() {
        let pool = Pool::new(1_000, 1_000).unwrap();
        assert!(pool.holds_invariant());
        // 1_000_000 mod 1_990 = 1_020 < 1_990
        let after = pool.with_reserves(&token(), 502, 1_990).unwrap();
        assert_eq!(after.drift().unwrap(), 1_020);
    }

    #[test]
    fn test_clone_copies_only_touched_record() {
        let mut registry = registry();
        let other = TokenId::new([6u8; 32]);
        registry
            .create_pool(other, profile(), 1_000, 1_000, 250)
            .unwrap();

        let snapshot = registry.clone();
        registry.credit_funds(&token(), 10).unwrap();

        assert!(Arc::ptr_eq(&registry.pools[&other], &snapshot.pools[&other]));
        assert!(!Arc::ptr_eq(&registry.pools[&token()], &snapshot.pools[&token()]));
        assert_eq!(snapshot.record(&token()).unwrap().accumulated_funds, 0);
        assert_eq!(registry.record(&token()).unwrap().accumulated_funds, 10);
    }
}
