//! Graduation Tests
//!
//! A buy larger than the remaining tradable supply is clamped, refunded and
//! graduates the token in the same operation.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::*;
use lib_launchpad::{
    ErrorKind, InMemoryEventLog, InMemoryVenue, LaunchConfig, LaunchError, LaunchEvent, Launchpad,
    LiquidityVenue, PairKey, PositionId, PriceRatio, SeedAmounts, StateError, TickRange,
    VenueError,
};
use lib_tokens::{InMemoryTokenLedger, TokenLedger};
use lib_types::{Address, TokenId};

#[test]
fn test_clamped_buy_graduates() {
    let (engine, log, token) = small_launch();
    let alice = trader(1);
    let custody = engine.config().custody;
    fund(&engine, &alice, 2_000_000);

    let receipt = buy(&engine, &token, &alice, 2_000_000, 1).expect("buy");
    assert!(receipt.quote.clamped);
    assert_eq!(receipt.quote.tokens_out, 1_000);
    assert_eq!(receipt.quote.net, 500);
    assert_eq!(receipt.quote.fee, 5);
    assert_eq!(receipt.quote.refund, 1_999_495);

    let graduation = receipt.graduation.expect("graduated");
    assert_eq!(
        graduation.starting_price,
        PriceRatio {
            token_amount: 250,
            funds_amount: 500
        }
    );
    assert_eq!(graduation.position_owner, custody);

    // Trader paid required + fee and holds the whole tradable supply
    assert_eq!(engine.balance_of(&TokenId::NATIVE, &alice), 1_999_495);
    assert_eq!(engine.balance_of(&token, &alice), 1_000);

    // Locked tokens and curve funds now sit with the venue
    assert_eq!(engine.balance_of(&token, &venue_custody()), 250);
    assert_eq!(engine.balance_of(&TokenId::NATIVE, &venue_custody()), 500);
    assert_eq!(engine.balance_of(&token, &custody), 0);
    assert_eq!(engine.balance_of(&TokenId::NATIVE, &custody), 5);
    assert_eq!(engine.fee_balance(), 5);

    let record = engine.pool(&token).unwrap();
    assert!(record.graduated);
    assert_eq!(record.locked_allocation, 0);
    assert_eq!(record.accumulated_funds, 0);
    assert_eq!(record.position, Some(graduation.position));

    let world = engine.snapshot();
    let position = world.venue.position(graduation.position).expect("position");
    assert_eq!(position.owner, custody);
    assert_eq!(
        position.amounts,
        SeedAmounts {
            token_amount: 250,
            funds_amount: 500
        }
    );
    assert_eq!(position.range, TickRange::full_range(60).unwrap());

    let token_events = log.token_events(&token);
    let last_two: Vec<_> = token_events.iter().rev().take(2).collect();
    assert!(matches!(last_two[0], LaunchEvent::TokenGraduated { .. }));
    assert!(matches!(
        last_two[1],
        LaunchEvent::TradeExecuted { refund: 1_999_495, .. }
    ));
    assert_eq!(last_two[0].seq(), last_two[1].seq());
    assert_custody_backs_liabilities(&engine);
}

#[test]
fn test_graduated_token_rejects_trades() {
    let (engine, _log, token) = small_launch();
    let alice = trader(1);
    fund(&engine, &alice, 3_000_000);
    buy(&engine, &token, &alice, 2_000_000, 1).expect("graduating buy");
    assert!(engine.is_graduated(&token).unwrap());

    let err = buy(&engine, &token, &alice, 1_000, 2).unwrap_err();
    assert_eq!(err, LaunchError::State(StateError::Graduated(token)));

    let err = sell(&engine, &token, &alice, 10, 3).unwrap_err();
    assert_eq!(err, LaunchError::State(StateError::Graduated(token)));

    assert!(engine.token_quote(&token).is_err());
    assert_eq!(engine.stats().graduated_pools, 1);
}

#[test]
fn test_graduation_after_partial_buys() {
    let (engine, _log, token) = small_launch();
    let alice = trader(1);
    let bob = trader(2);
    fund(&engine, &alice, 10_000);
    fund(&engine, &bob, 5_000_000);

    buy(&engine, &token, &alice, 1_000, 1).expect("partial buy");
    let receipt = buy(&engine, &token, &bob, 5_000_000, 1).expect("clamped buy");

    // Remaining 502 tokens priced at 1_990 - 1_000_000 / 1_004 = 994
    assert_eq!(receipt.quote.tokens_out, 502);
    assert_eq!(receipt.quote.net, 994);
    let graduation = receipt.graduation.expect("graduated");
    assert_eq!(graduation.funds, 990 + 994);
    assert_eq!(graduation.locked_tokens, 250);
}

#[test]
fn test_graduated_liquidity_stays_seeded() {
    let (engine, _log, token) = small_launch();
    let alice = trader(1);
    let custody = engine.config().custody;
    fund(&engine, &alice, 2_000_000);
    let receipt = buy(&engine, &token, &alice, 2_000_000, 1).expect("buy");
    let position = receipt.graduation.expect("graduated").position;

    // Host-side entry points keep working and leave the position alone
    engine.deposit(alice, 1_000).expect("deposit");
    engine.approve(alice, token, 1_000).expect("approve");
    engine
        .withdraw_fees(operator(engine.config()), trader(7), 5)
        .expect("fees stay backed by custody funds");
    assert_eq!(engine.balance_of(&TokenId::NATIVE, &custody), 0);

    let world = engine.snapshot();
    let seeded = world.venue.position(position).expect("position");
    assert_eq!(seeded.owner, custody);
    assert_eq!(
        seeded.amounts,
        SeedAmounts {
            token_amount: 250,
            funds_amount: 500
        }
    );

    // Only custody owns it; a trader holding the venue cannot pull it
    let mut venue = world.venue.clone();
    assert_eq!(
        venue.withdraw_liquidity(position, &alice),
        Err(VenueError::NotPositionOwner {
            position,
            caller: alice
        })
    );
}

/// Venue whose seeding step can be switched off from outside the engine
#[derive(Debug, Clone)]
struct FlakyVenue {
    inner: InMemoryVenue,
    seeding_down: Arc<AtomicBool>,
}

impl LiquidityVenue for FlakyVenue {
    fn custody_address(&self) -> Address {
        self.inner.custody_address()
    }

    fn initialize_pool(
        &mut self,
        pair: &PairKey,
        starting_price: PriceRatio,
    ) -> Result<(), VenueError> {
        self.inner.initialize_pool(pair, starting_price)
    }

    fn seed_liquidity(
        &mut self,
        pair: &PairKey,
        range: TickRange,
        amounts: SeedAmounts,
        owner: &Address,
    ) -> Result<PositionId, VenueError> {
        if self.seeding_down.load(Ordering::SeqCst) {
            return Err(VenueError::Unavailable("seeding paused".into()));
        }
        self.inner.seed_liquidity(pair, range, amounts, owner)
    }
}

#[test]
fn test_venue_failure_rolls_back_buy() {
    init_tracing();
    let log = InMemoryEventLog::new();
    let seeding_down = Arc::new(AtomicBool::new(true));
    let engine = Launchpad::new(
        LaunchConfig::for_testing(),
        InMemoryTokenLedger::new(),
        FlakyVenue {
            inner: InMemoryVenue::new(venue_custody()),
            seeding_down: Arc::clone(&seeding_down),
        },
        StubVerifier,
    )
    .expect("engine")
    .with_event_sink(log.clone());

    let token = engine
        .deploy_token(creator(), "Flaky", "FLK")
        .expect("deploy");
    let alice = trader(1);
    engine.deposit(alice, 2_000_000).unwrap();
    let events_before = log.len();
    let before = engine.snapshot();

    let err = engine
        .buy(lib_launchpad::BuyRequest {
            token_id: token,
            caller: alice,
            funds: 2_000_000,
            auth: stub_auth(&alice, 1),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalCall);

    let after = engine.snapshot();
    assert_eq!(after.state, before.state);
    assert_eq!(after.ledger.balance_of(&TokenId::NATIVE, &alice), 2_000_000);
    assert_eq!(after.ledger.balance_of(&token, &alice), 0);
    assert_eq!(engine.last_nonce(&alice), None);
    assert!(!engine.is_graduated(&token).unwrap());
    assert!(after
        .venue
        .inner
        .pool(&PairKey::native_pair(token, 3_000))
        .is_none());
    assert_eq!(log.len(), events_before);

    // Venue back up: the same authorization now goes through
    seeding_down.store(false, Ordering::SeqCst);
    let receipt = engine
        .buy(lib_launchpad::BuyRequest {
            token_id: token,
            caller: alice,
            funds: 2_000_000,
            auth: stub_auth(&alice, 1),
        })
        .expect("buy after recovery");
    assert!(receipt.graduation.is_some());
}
