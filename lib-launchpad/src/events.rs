//! Launchpad Events
//!
//! Every committed operation emits its events in order. Events from an
//! operation that failed are never published.

use std::sync::Arc;

use lib_types::{Address, Amount, Bps, TokenId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::venue::{PairKey, PositionId, PriceRatio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchEvent {
    /// Token minted into custody
    TokenDeployed {
        seq: u64,
        token_id: TokenId,
        creator: Address,
        name: String,
        symbol: String,
        total_supply: Amount,
        locked_allocation: Amount,
    },

    /// Curve pool opened for a token
    PoolCreated {
        seq: u64,
        token_id: TokenId,
        token_reserve: Amount,
        funds_reserve: Amount,
        k: Amount,
    },

    /// Buy or sell against the curve
    TradeExecuted {
        seq: u64,
        token_id: TokenId,
        trader: Address,
        side: TradeSide,
        /// Funds paid in (buy) or gross funds released (sell)
        funds_amount: Amount,
        token_amount: Amount,
        fee: Amount,
        /// Unused funds returned on a clamped buy
        refund: Amount,
        token_reserve: Amount,
        funds_reserve: Amount,
    },

    /// Curve closed and liquidity moved to the venue
    TokenGraduated {
        seq: u64,
        token_id: TokenId,
        pair: PairKey,
        starting_price: PriceRatio,
        locked_tokens: Amount,
        funds: Amount,
        position: PositionId,
        position_owner: Address,
    },

    FeesWithdrawn {
        seq: u64,
        operator: Address,
        recipient: Address,
        amount: Amount,
        remaining: Amount,
    },

    FeeRateUpdated {
        seq: u64,
        old_rate_bps: Bps,
        new_rate_bps: Bps,
    },
}

impl LaunchEvent {
    /// Sequence number of the operation that emitted this event
    pub fn seq(&self) -> u64 {
        match self {
            LaunchEvent::TokenDeployed { seq, .. }
            | LaunchEvent::PoolCreated { seq, .. }
            | LaunchEvent::TradeExecuted { seq, .. }
            | LaunchEvent::TokenGraduated { seq, .. }
            | LaunchEvent::FeesWithdrawn { seq, .. }
            | LaunchEvent::FeeRateUpdated { seq, .. } => *seq,
        }
    }

    pub fn token_id(&self) -> Option<&TokenId> {
        match self {
            LaunchEvent::TokenDeployed { token_id, .. }
            | LaunchEvent::PoolCreated { token_id, .. }
            | LaunchEvent::TradeExecuted { token_id, .. }
            | LaunchEvent::TokenGraduated { token_id, .. } => Some(token_id),
            LaunchEvent::FeesWithdrawn { .. } | LaunchEvent::FeeRateUpdated { .. } => None,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            LaunchEvent::TokenDeployed { .. } => "token_deployed",
            LaunchEvent::PoolCreated { .. } => "pool_created",
            LaunchEvent::TradeExecuted { .. } => "trade_executed",
            LaunchEvent::TokenGraduated { .. } => "token_graduated",
            LaunchEvent::FeesWithdrawn { .. } => "fees_withdrawn",
            LaunchEvent::FeeRateUpdated { .. } => "fee_rate_updated",
        }
    }
}

/// Receives committed events
pub trait EventSink: Send {
    fn publish(&mut self, event: &LaunchEvent);
}

/// Sink that drops everything
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&mut self, _event: &LaunchEvent) {}
}

/// Shared in-memory event log; clones see the same events
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    events: Arc<Mutex<Vec<LaunchEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LaunchEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn token_events(&self, token_id: &TokenId) -> Vec<LaunchEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.token_id() == Some(token_id))
            .cloned()
            .collect()
    }

    pub fn count_of(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

impl EventSink for InMemoryEventLog {
    fn publish(&mut self, event: &LaunchEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_shared_between_clones() {
        let log = InMemoryEventLog::new();
        let mut sink = log.clone();
        let token = TokenId::new([1u8; 32]);

        sink.publish(&LaunchEvent::PoolCreated {
            seq: 1,
            token_id: token,
            token_reserve: 1_000,
            funds_reserve: 1_000,
            k: 1_000_000,
        });
        sink.publish(&LaunchEvent::FeeRateUpdated {
            seq: 2,
            old_rate_bps: 100,
            new_rate_bps: 50,
        });

        assert_eq!(log.len(), 2);
        assert_eq!(log.token_events(&token).len(), 1);
        assert_eq!(log.count_of("fee_rate_updated"), 1);
        assert_eq!(log.events()[1].seq(), 2);
    }

    #[test]
    fn test_trade_event_json_for_indexers() {
        let event = LaunchEvent::TradeExecuted {
            seq: 7,
            token_id: TokenId::new([2u8; 32]),
            trader: Address::new([3u8; 32]),
            side: TradeSide::Sell,
            funds_amount: 990,
            token_amount: 498,
            fee: 9,
            refund: 0,
            token_reserve: 1_000,
            funds_reserve: 1_000,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(&"02".repeat(32)));
        let back: LaunchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.event_type(), "trade_executed");
    }
}
