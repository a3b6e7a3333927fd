//! Launchpad engine
//!
//! Owns the committed world and runs every mutating operation against a
//! scratch copy of it. The copy replaces the committed world only when the
//! operation succeeds, so a failure anywhere (validation, a token transfer,
//! the venue) leaves no trace. Readers take the committed `Arc` and never
//! wait on a running trade.

use std::sync::Arc;

use lib_fees::validate_fee_rate;
use lib_tokens::TokenLedger;
use lib_types::{Address, Amount, Bps, Nonce, TokenId};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, LaunchConfig};
use crate::curve::BondingCurve;
use crate::deploy::{deploy_token, DeployRequest};
use crate::errors::{LaunchResult, ValidationError};
use crate::events::{EventSink, LaunchEvent, NullSink};
use crate::executor::{
    self, quote_buy, quote_sell, BuyQuote, BuyReceipt, BuyRequest, SellQuote, SellReceipt,
    SellRequest, TradeContext,
};
use crate::guard::{MutationGuard, WriterLock};
use crate::pool::{PoolRecord, RegistryStats};
use crate::replay::{Ed25519Verifier, SignatureVerifier};
use crate::state::World;
use crate::venue::LiquidityVenue;

pub struct Launchpad<L, V, S> {
    config: LaunchConfig,
    verifier: S,
    writer: WriterLock,
    committed: RwLock<Arc<World<L, V>>>,
    sink: Mutex<Box<dyn EventSink>>,
}

impl<L, V> Launchpad<L, V, Ed25519Verifier>
where
    L: TokenLedger + Clone,
    V: LiquidityVenue + Clone,
{
    /// Engine verifying trades against `authority_public_key` from the config
    pub fn from_config(config: LaunchConfig, ledger: L, venue: V) -> Result<Self, ConfigError> {
        let key = config
            .authority_public_key
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("authority_public_key is not set".into()))?;
        let verifier =
            Ed25519Verifier::from_hex(key).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Self::new(config, ledger, venue, verifier)
    }
}

impl<L, V, S> Launchpad<L, V, S>
where
    L: TokenLedger + Clone,
    V: LiquidityVenue + Clone,
    S: SignatureVerifier,
{
    pub fn new(
        config: LaunchConfig,
        ledger: L,
        venue: V,
        verifier: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let world = World::new(&config, ledger, venue);
        info!(
            operator = %config.operator,
            custody = %config.custody,
            fee_rate_bps = config.fee_rate_bps,
            "launchpad started"
        );
        Ok(Self {
            config,
            verifier,
            writer: WriterLock::new(Default::default()),
            committed: RwLock::new(Arc::new(world)),
            sink: Mutex::new(Box::new(NullSink)),
        })
    }

    /// Publish committed events to `sink`
    pub fn with_event_sink(self, sink: impl EventSink + 'static) -> Self {
        *self.sink.lock() = Box::new(sink);
        self
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    fn execute<T>(
        &self,
        operation: &'static str,
        op: impl FnOnce(&mut World<L, V>) -> LaunchResult<T>,
    ) -> LaunchResult<T> {
        let _guard = MutationGuard::acquire(&self.writer).map_err(|err| {
            warn!(operation, "rejected reentrant call");
            err
        })?;

        let mut scratch = World::clone(&self.committed.read());
        let seq = scratch.state.begin_operation();

        match op(&mut scratch) {
            Ok(out) => {
                let events = scratch.state.take_events();
                *self.committed.write() = Arc::new(scratch);
                let mut sink = self.sink.lock();
                for event in &events {
                    sink.publish(event);
                }
                debug!(operation, seq, events = events.len(), "committed");
                Ok(out)
            }
            Err(err) => {
                warn!(operation, seq, error = %err, "rolled back");
                Err(err)
            }
        }
    }

    // Mutating operations

    pub fn deploy_token(
        &self,
        creator: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> LaunchResult<TokenId> {
        let request = DeployRequest {
            creator,
            name: name.into(),
            symbol: symbol.into(),
        };
        self.execute("deploy_token", |world| {
            deploy_token(world, &self.config, &request)
        })
    }

    pub fn buy(&self, request: BuyRequest) -> LaunchResult<BuyReceipt> {
        let ctx = self.trade_context();
        self.execute("buy", |world| executor::buy(world, &ctx, &request))
    }

    pub fn sell(&self, request: SellRequest) -> LaunchResult<SellReceipt> {
        let ctx = self.trade_context();
        self.execute("sell", |world| executor::sell(world, &ctx, &request))
    }

    /// Pay `amount` of collected fees to `recipient`; operator only
    pub fn withdraw_fees(
        &self,
        caller: Address,
        recipient: Address,
        amount: Amount,
    ) -> LaunchResult<Amount> {
        self.execute("withdraw_fees", |world| {
            let remaining = world.state.fees.withdraw(&caller, amount)?;
            world
                .ledger
                .transfer(&TokenId::NATIVE, &self.config.custody, &recipient, amount)?;
            let seq = world.state.seq;
            world.state.emit(LaunchEvent::FeesWithdrawn {
                seq,
                operator: caller,
                recipient,
                amount,
                remaining,
            });
            Ok(remaining)
        })
    }

    /// Change the trade fee; operator only, capped at `MAX_FEE_BPS`
    pub fn set_fee_rate(&self, caller: Address, rate_bps: Bps) -> LaunchResult<()> {
        self.execute("set_fee_rate", |world| {
            world.state.fees.require_operator(&caller)?;
            validate_fee_rate(rate_bps)?;
            let old_rate_bps = world.state.fee_rate_bps;
            world.state.fee_rate_bps = rate_bps;
            let seq = world.state.seq;
            world.state.emit(LaunchEvent::FeeRateUpdated {
                seq,
                old_rate_bps,
                new_rate_bps: rate_bps,
            });
            info!(old_rate_bps, new_rate_bps = rate_bps, "fee rate updated");
            Ok(())
        })
    }

    /// Credit native funds to `to` (host deposit)
    pub fn deposit(&self, to: Address, amount: Amount) -> LaunchResult<()> {
        if amount == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }
        self.execute("deposit", |world| {
            world.ledger.mint(&TokenId::NATIVE, &to, amount)?;
            debug!(to = %to, amount, "native deposit");
            Ok(())
        })
    }

    /// Set how much of `owner`'s launched token custody may pull on a sell
    ///
    /// The only spender ever approved is custody, and custody only pulls
    /// inside a sell the owner authorized.
    pub fn approve(&self, owner: Address, token_id: TokenId, amount: Amount) -> LaunchResult<()> {
        self.execute("approve", |world| {
            world.state.registry.record(&token_id)?;
            world
                .ledger
                .approve(&token_id, &owner, &self.config.custody, amount)?;
            Ok(())
        })
    }

    fn trade_context(&self) -> TradeContext<'_> {
        TradeContext {
            config: &self.config,
            verifier: &self.verifier,
        }
    }

    // Reads

    /// Committed world at this instant
    pub fn snapshot(&self) -> Arc<World<L, V>> {
        Arc::clone(&self.committed.read())
    }

    /// Pool record, graduated or not
    pub fn pool(&self, token_id: &TokenId) -> LaunchResult<PoolRecord> {
        self.snapshot().state.registry.record(token_id).cloned()
    }

    pub fn is_graduated(&self, token_id: &TokenId) -> LaunchResult<bool> {
        self.snapshot().state.registry.is_graduated(token_id)
    }

    pub fn quote_buy(&self, token_id: &TokenId, funds: Amount) -> LaunchResult<BuyQuote> {
        let world = self.snapshot();
        let record = world.state.registry.get(token_id)?;
        quote_buy(record, world.state.fee_rate_bps, funds)
    }

    pub fn quote_sell(&self, token_id: &TokenId, tokens: Amount) -> LaunchResult<SellQuote> {
        let world = self.snapshot();
        let record = world.state.registry.get(token_id)?;
        quote_sell(record, world.state.fee_rate_bps, tokens)
    }

    /// Tokens per unit of funds at current reserves
    pub fn token_quote(&self, token_id: &TokenId) -> LaunchResult<Amount> {
        self.curve(token_id)?.token_quote()
    }

    /// Funds per token at current reserves
    pub fn funds_quote(&self, token_id: &TokenId) -> LaunchResult<Amount> {
        self.curve(token_id)?.funds_quote()
    }

    fn curve(&self, token_id: &TokenId) -> LaunchResult<BondingCurve> {
        let world = self.snapshot();
        let record = world.state.registry.get(token_id)?;
        BondingCurve::new(record)
    }

    pub fn fee_balance(&self) -> Amount {
        self.snapshot().state.fees.balance()
    }

    pub fn fee_rate_bps(&self) -> Bps {
        self.snapshot().state.fee_rate_bps
    }

    pub fn last_nonce(&self, caller: &Address) -> Option<Nonce> {
        self.snapshot().state.last_nonce(caller)
    }

    pub fn balance_of(&self, token_id: &TokenId, owner: &Address) -> Amount {
        self.snapshot().ledger.balance_of(token_id, owner)
    }

    pub fn stats(&self) -> RegistryStats {
        self.snapshot().state.registry.stats()
    }
}
