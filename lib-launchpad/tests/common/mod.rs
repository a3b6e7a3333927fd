//! Shared helpers for launchpad integration tests

#![allow(dead_code)]

use lib_launchpad::{
    Authorization, BuyReceipt, BuyRequest, InMemoryEventLog, InMemoryVenue, LaunchConfig,
    LaunchResult, Launchpad, SellReceipt, SellRequest, Signature64, SignatureVerifier,
};
use lib_tokens::{InMemoryTokenLedger, TokenLedger};
use lib_types::{Address, Amount, Nonce, TokenId};

/// Accepts a signature whose bytes spell out `caller || nonce_le`
#[derive(Debug, Clone, Copy, Default)]
pub struct StubVerifier;

impl SignatureVerifier for StubVerifier {
    fn verify(&self, caller: &Address, nonce: Nonce, signature: &Signature64) -> bool {
        stub_signature(caller, nonce) == *signature
    }
}

pub fn stub_signature(caller: &Address, nonce: Nonce) -> Signature64 {
    let mut bytes = [0u8; 64];
    bytes[..32].copy_from_slice(caller.as_bytes());
    bytes[32..40].copy_from_slice(&nonce.to_le_bytes());
    Signature64(bytes)
}

pub fn stub_auth(caller: &Address, nonce: Nonce) -> Authorization {
    Authorization {
        nonce,
        signature: stub_signature(caller, nonce),
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub type TestEngine = Launchpad<InMemoryTokenLedger, InMemoryVenue, StubVerifier>;

pub fn venue_custody() -> Address {
    Address::new([0xCC; 32])
}

pub fn creator() -> Address {
    Address::new([0x01; 32])
}

pub fn trader(id: u8) -> Address {
    Address::new([0x10 + id; 32])
}

pub fn operator(config: &LaunchConfig) -> Address {
    config.operator
}

/// Engine plus its event log
pub fn engine_with(config: LaunchConfig) -> (TestEngine, InMemoryEventLog) {
    init_tracing();
    let log = InMemoryEventLog::new();
    let engine = Launchpad::new(
        config,
        InMemoryTokenLedger::new(),
        InMemoryVenue::new(venue_custody()),
        StubVerifier,
    )
    .expect("valid test config")
    .with_event_sink(log.clone());
    (engine, log)
}

/// Small-curve engine (k = 1_000_000, 1% fee) with one deployed token
pub fn small_launch() -> (TestEngine, InMemoryEventLog, TokenId) {
    let (engine, log) = engine_with(LaunchConfig::for_testing());
    let token = engine
        .deploy_token(creator(), "Test Token", "TEST")
        .expect("deploy");
    (engine, log, token)
}

pub fn fund(engine: &TestEngine, who: &Address, amount: Amount) {
    engine.deposit(*who, amount).expect("deposit");
}

pub fn buy(
    engine: &TestEngine,
    token: &TokenId,
    caller: &Address,
    funds: Amount,
    nonce: Nonce,
) -> LaunchResult<BuyReceipt> {
    engine.buy(BuyRequest {
        token_id: *token,
        caller: *caller,
        funds,
        auth: stub_auth(caller, nonce),
    })
}

/// Approve custody for `tokens`, then sell them
pub fn sell(
    engine: &TestEngine,
    token: &TokenId,
    caller: &Address,
    tokens: Amount,
    nonce: Nonce,
) -> LaunchResult<SellReceipt> {
    engine.approve(*caller, *token, tokens)?;
    engine.sell(SellRequest {
        token_id: *token,
        caller: *caller,
        tokens,
        auth: stub_auth(caller, nonce),
    })
}

/// Custody holds exactly the curve's accumulated funds plus uncollected fees
pub fn assert_custody_backs_liabilities(engine: &TestEngine) {
    let world = engine.snapshot();
    let custody = engine.config().custody;
    let held = world.ledger.balance_of(&TokenId::NATIVE, &custody);
    let owed: Amount = world
        .state
        .registry()
        .iter()
        .filter(|record| !record.graduated)
        .map(|record| record.accumulated_funds)
        .sum::<Amount>()
        + world.state.fees().balance();
    assert_eq!(held, owed, "custody funds must equal pool funds plus fees");
}
