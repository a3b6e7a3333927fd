//! Token Launchpad
//!
//! Fair-launch engine: every token starts on a constant-product bonding curve
//! with a virtual funds reserve. Traders buy and sell against the curve with
//! an authority-signed, single-use nonce per trade. The buy that exhausts the
//! tradable supply graduates the token: the locked allocation and the funds
//! the curve accumulated seed a venue position that only engine custody owns.
//!
//! # Architecture
//!
//! - [`pool`] - per-token reserves, locked allocation and accumulated funds
//! - [`curve`] - pure pricing over a pool snapshot
//! - [`executor`] - buy and sell, built on pure quotes
//! - [`graduation`] - one-shot hand-off to the liquidity venue
//! - [`replay`] - signature check and per-caller nonce registry
//! - [`engine`] - [`Launchpad`], the transactional facade
//!
//! Token balances live behind [`lib_tokens::TokenLedger`] and fees in
//! [`lib_fees::FeeLedger`].
//!
//! # Example
//!
//! ```ignore
//! let engine = Launchpad::from_config(config, InMemoryTokenLedger::new(), venue)?;
//! let token = engine.deploy_token(creator, "Example", "EXM")?;
//! let receipt = engine.buy(BuyRequest { token_id: token, caller, funds, auth })?;
//! ```

pub mod config;
pub mod curve;
pub mod deploy;
pub mod engine;
pub mod errors;
pub mod events;
pub mod executor;
pub mod graduation;
mod guard;
pub mod pool;
pub mod replay;
pub mod state;
pub mod venue;

pub use config::{ConfigError, LaunchConfig, DEFAULT_CONFIG_FILENAME};
pub use curve::BondingCurve;
pub use deploy::{derive_token_id, DeployRequest, MAX_NAME_LEN, MAX_SYMBOL_LEN};
pub use engine::Launchpad;
pub use errors::{
    ArithmeticError, AuthorizationError, ErrorKind, ExternalCallFailure, LaunchError,
    LaunchResult, StateError, ValidationError,
};
pub use events::{EventSink, InMemoryEventLog, LaunchEvent, NullSink, TradeSide};
pub use executor::{
    quote_buy, quote_sell, BuyQuote, BuyReceipt, BuyRequest, SellQuote, SellReceipt, SellRequest,
};
pub use graduation::{GraduationManager, GraduationReceipt};
pub use pool::{Pool, PoolRecord, PoolRegistry, RegistryStats, TokenProfile};
pub use replay::{
    authorization_message, sign_authorization, Authorization, Ed25519Verifier, ReplayGuard,
    Signature64, SignatureVerifier,
};
pub use state::{EngineState, World};
pub use venue::{
    InMemoryVenue, LiquidityVenue, PairKey, Position, PositionId, PriceRatio, SeedAmounts,
    TickRange, VenueError, MAX_TICK, MIN_TICK,
};
