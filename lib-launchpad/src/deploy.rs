//! Token deployment
//!
//! Mints the full supply into custody and opens the curve pool in the same
//! operation. The tradable part becomes the pool's token reserve; the rest is
//! the locked allocation that seeds the venue at graduation.

use lib_tokens::TokenLedger;
use lib_types::{Address, TokenId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LaunchConfig;
use crate::errors::{LaunchError, LaunchResult, ValidationError};
use crate::events::LaunchEvent;
use crate::pool::TokenProfile;
use crate::state::World;

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_SYMBOL_LEN: usize = 10;

const TOKEN_DOMAIN: &[u8] = b"LAUNCHPAD_TOKEN_V1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub creator: Address,
    pub name: String,
    pub symbol: String,
}

/// Token id for the `counter`-th deployment
pub fn derive_token_id(creator: &Address, name: &str, symbol: &str, counter: u64) -> TokenId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(TOKEN_DOMAIN);
    hasher.update(creator.as_bytes());
    hasher.update(&(name.len() as u64).to_le_bytes());
    hasher.update(name.as_bytes());
    hasher.update(&(symbol.len() as u64).to_le_bytes());
    hasher.update(symbol.as_bytes());
    hasher.update(&counter.to_le_bytes());
    TokenId::new(*hasher.finalize().as_bytes())
}

fn validate_metadata(request: &DeployRequest) -> LaunchResult<()> {
    let invalid =
        |msg: &str| -> LaunchError { ValidationError::InvalidMetadata(msg.to_string()).into() };
    if request.name.trim().is_empty() {
        return Err(invalid("Name cannot be empty"));
    }
    if request.name.len() > MAX_NAME_LEN {
        return Err(invalid("Name too long (max 64)"));
    }
    if request.symbol.is_empty() {
        return Err(invalid("Symbol cannot be empty"));
    }
    if request.symbol.len() > MAX_SYMBOL_LEN {
        return Err(invalid("Symbol too long (max 10)"));
    }
    if !request.symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("Symbol must be ASCII alphanumeric"));
    }
    Ok(())
}

pub fn deploy_token<L: TokenLedger, V>(
    world: &mut World<L, V>,
    config: &LaunchConfig,
    request: &DeployRequest,
) -> LaunchResult<TokenId> {
    validate_metadata(request)?;

    let token_id = derive_token_id(
        &request.creator,
        &request.name,
        &request.symbol,
        world.state.deployed,
    );
    let total_supply = config.total_supply();
    let locked_allocation = config.locked_allocation();

    let record = world.state.registry.create_pool(
        token_id,
        TokenProfile {
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            creator: request.creator,
            total_supply,
        },
        config.initial_token_reserve(),
        config.virtual_funds_reserve(),
        locked_allocation,
    )?;
    let pool = record.pool;
    let k = pool.k()?;

    world.ledger.mint(&token_id, &config.custody, total_supply)?;
    world.state.deployed += 1;

    let seq = world.state.seq;
    world.state.emit(LaunchEvent::TokenDeployed {
        seq,
        token_id,
        creator: request.creator,
        name: request.name.clone(),
        symbol: request.symbol.clone(),
        total_supply,
        locked_allocation,
    });
    world.state.emit(LaunchEvent::PoolCreated {
        seq,
        token_id,
        token_reserve: pool.token_reserve,
        funds_reserve: pool.funds_reserve,
        k,
    });

    info!(
        token = %token_id,
        symbol = %request.symbol,
        creator = %request.creator,
        total_supply,
        "token deployed"
    );
    Ok(token_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StateError;
    use crate::venue::InMemoryVenue;
    use lib_tokens::InMemoryTokenLedger;

    fn world() -> World<InMemoryTokenLedger, InMemoryVenue> {
        let config = LaunchConfig::for_testing();
        World::new(
            &config,
            InMemoryTokenLedger::new(),
            InMemoryVenue::new(Address::new([0xCC; 32])),
        )
    }

    fn request(symbol: &str) -> DeployRequest {
        DeployRequest {
            creator: Address::new([1u8; 32]),
            name: "Test Token".into(),
            symbol: symbol.into(),
        }
    }

    #[test]
    fn test_deploy_mints_into_custody() {
        let config = LaunchConfig::for_testing();
        let mut world = world();
        let token = deploy_token(&mut world, &config, &request("TST")).unwrap();

        assert_eq!(world.ledger.balance_of(&token, &config.custody), 1_250);
        let record = world.state.registry.get(&token).unwrap();
        assert_eq!(record.pool.token_reserve, 1_000);
        assert_eq!(record.locked_allocation, 250);
        assert_eq!(world.state.take_events().len(), 2);
    }

    #[test]
    fn test_same_metadata_gets_fresh_id() {
        let config = LaunchConfig::for_testing();
        let mut world = world();
        let a = deploy_token(&mut world, &config, &request("TST")).unwrap();
        let b = deploy_token(&mut world, &config, &request("TST")).unwrap();
        assert_ne!(a, b);
        assert_eq!(world.state.registry.len(), 2);
    }

    #[test]
    fn test_rejects_bad_metadata() {
        let config = LaunchConfig::for_testing();
        let mut world = world();
        for symbol in ["", "WAYTOOLONGSYM", "T-1"] {
            let err = deploy_token(&mut world, &config, &request(symbol)).unwrap_err();
            assert!(matches!(
                err,
                LaunchError::Validation(ValidationError::InvalidMetadata(_))
            ));
        }
        assert!(world.state.registry.is_empty());
    }

    #[test]
    fn test_id_collision_is_state_error() {
        let config = LaunchConfig::for_testing();
        let mut world = world();
        let token = deploy_token(&mut world, &config, &request("TST")).unwrap();
        world.state.deployed = 0;
        assert_eq!(
            deploy_token(&mut world, &config, &request("TST")).unwrap_err(),
            LaunchError::State(StateError::PoolExists(token))
        );
    }
}
