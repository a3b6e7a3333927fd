//! Token Ledger Interface
//!
//! The minimal fungible-token surface the launchpad consumes as a black box:
//! `mint`, `transfer`, `transfer_from`, `approve` / `allowance`.
//!
//! The native funds asset is addressed as [`TokenId::NATIVE`] through the same
//! interface, so one ledger moves both sides of a trade.

use lib_types::{Address, Amount, TokenId};

use crate::errors::TokenResult;

/// Fungible-token primitive
pub trait TokenLedger {
    /// Credit `amount` of newly created `token` to `to`
    fn mint(&mut self, token: &TokenId, to: &Address, amount: Amount) -> TokenResult<()>;

    /// Move `amount` of `token` from `from` to `to`
    fn transfer(
        &mut self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TokenResult<()>;

    /// Move `amount` of `token` from `from` to `to` on behalf of `spender`,
    /// consuming `spender`'s allowance
    fn transfer_from(
        &mut self,
        token: &TokenId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TokenResult<()>;

    /// Set `spender`'s allowance over `owner`'s `token` balance
    fn approve(
        &mut self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> TokenResult<()>;

    /// Remaining allowance of `spender` over `owner`'s `token`
    fn allowance(&self, token: &TokenId, owner: &Address, spender: &Address) -> Amount;

    /// Balance of `owner` in `token`
    fn balance_of(&self, token: &TokenId, owner: &Address) -> Amount;

    /// Total minted supply of `token`
    fn total_supply(&self, token: &TokenId) -> Amount;
}
