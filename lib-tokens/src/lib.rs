//! Fungible-token primitive
//!
//! This crate defines the token surface the launchpad engine calls as a black
//! box, plus an in-memory reference ledger.
//!
//! # Key Types
//!
//! - [`TokenLedger`]: mint / transfer / transfer_from / approve / allowance
//! - [`InMemoryTokenLedger`]: fixed-cap launched tokens + open native deposits
//! - [`TokenError`]: failure reasons surfaced to the engine

pub mod errors;
pub mod ledger;
pub mod memory;

pub use errors::*;
pub use ledger::TokenLedger;
pub use memory::InMemoryTokenLedger;
