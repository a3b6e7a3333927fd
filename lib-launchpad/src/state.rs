//! Engine state
//!
//! All mutable tables the engine owns, plus the world an operation runs
//! against: engine state, token ledger and liquidity venue together.

use lib_fees::FeeLedger;
use lib_types::{Address, Bps, Nonce};
use serde::{Deserialize, Serialize};

use crate::config::LaunchConfig;
use crate::events::LaunchEvent;
use crate::pool::PoolRegistry;
use crate::replay::ReplayGuard;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub(crate) registry: PoolRegistry,
    pub(crate) fees: FeeLedger,
    pub(crate) replay: ReplayGuard,
    pub(crate) fee_rate_bps: Bps,
    /// Tokens deployed so far; salts token id derivation
    pub(crate) deployed: u64,
    /// Sequence number of the last operation started
    pub(crate) seq: u64,
    #[serde(skip)]
    pub(crate) pending: Vec<LaunchEvent>,
}

impl EngineState {
    pub fn new(config: &LaunchConfig) -> Self {
        Self {
            registry: PoolRegistry::new(),
            fees: FeeLedger::new(config.operator),
            replay: ReplayGuard::new(),
            fee_rate_bps: config.fee_rate_bps,
            deployed: 0,
            seq: 0,
            pending: Vec::new(),
        }
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    pub fn fees(&self) -> &FeeLedger {
        &self.fees
    }

    pub fn fee_rate_bps(&self) -> Bps {
        self.fee_rate_bps
    }

    pub fn deployed(&self) -> u64 {
        self.deployed
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn last_nonce(&self, caller: &Address) -> Option<Nonce> {
        self.replay.last_nonce(caller)
    }

    pub(crate) fn begin_operation(&mut self) -> u64 {
        self.seq += 1;
        self.pending.clear();
        self.seq
    }

    pub(crate) fn emit(&mut self, event: LaunchEvent) {
        self.pending.push(event);
    }

    pub(crate) fn take_events(&mut self) -> Vec<LaunchEvent> {
        std::mem::take(&mut self.pending)
    }
}

/// Everything one operation may touch
#[derive(Debug, Clone)]
pub struct World<L, V> {
    pub state: EngineState,
    pub ledger: L,
    pub venue: V,
}

impl<L, V> World<L, V> {
    pub fn new(config: &LaunchConfig, ledger: L, venue: V) -> Self {
        Self {
            state: EngineState::new(config),
            ledger,
            venue,
        }
    }
}
