//! In-memory token ledger
//!
//! Reference [`TokenLedger`] used by the launchpad engine in tests and
//! single-process deployments.
//!
//! # Supply policy
//! - Launched tokens are fixed-cap: a token is minted exactly once, after which
//!   its supply is sealed.
//! - The native funds asset is credited freely by the host (deposits).

use std::collections::HashMap;
use std::sync::Arc;

use lib_types::{Address, Amount, TokenId};

use crate::errors::{TokenError, TokenResult};
use crate::ledger::TokenLedger;

/// Balances, allowances and supply of one token
#[derive(Debug, Clone, Default)]
struct TokenBook {
    balances: HashMap<Address, Amount>,
    /// (owner, spender) -> allowance
    allowances: HashMap<(Address, Address), Amount>,
    supply: Amount,
}

impl TokenBook {
    fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn credit(&mut self, to: &Address, amount: Amount) -> TokenResult<()> {
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, from: &Address, amount: Amount) -> TokenResult<()> {
        let have = self.balance_of(from);
        if have < amount {
            return Err(TokenError::InsufficientBalance { have, need: amount });
        }
        let remaining = have.checked_sub(amount).ok_or(TokenError::Underflow)?;
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, remaining);
        }
        Ok(())
    }
}

/// Every token's book, keyed by token id
///
/// Books are shared between clones and copied on first write, so cloning the
/// ledger and then moving one token only copies that token's book.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenLedger {
    books: HashMap<TokenId, Arc<TokenBook>>,
}

impl InMemoryTokenLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit native funds to an account (host deposit)
    pub fn deposit(&mut self, to: &Address, amount: Amount) -> TokenResult<()> {
        self.mint(&TokenId::NATIVE, to, amount)
    }

    /// Number of tokens with a minted supply (native excluded)
    pub fn token_count(&self) -> usize {
        self.books.keys().filter(|token| !token.is_native()).count()
    }

    fn book(&self, token: &TokenId) -> Option<&TokenBook> {
        self.books.get(token).map(Arc::as_ref)
    }

    /// Writable book of a minted token (native always exists)
    fn book_mut(&mut self, token: &TokenId) -> TokenResult<&mut TokenBook> {
        if token.is_native() {
            return Ok(Arc::make_mut(self.books.entry(*token).or_default()));
        }
        self.books
            .get_mut(token)
            .map(Arc::make_mut)
            .ok_or(TokenError::TokenNotFound(*token))
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn mint(&mut self, token: &TokenId, to: &Address, amount: Amount) -> TokenResult<()> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        if !token.is_native() {
            if self.books.contains_key(token) {
                return Err(TokenError::SupplySealed(*token));
            }
            self.books.insert(*token, Arc::default());
        }

        let book = self.book_mut(token)?;
        book.supply = book.supply.checked_add(amount).ok_or(TokenError::Overflow)?;
        book.credit(to, amount)?;

        tracing::debug!(token = %token, to = %to, amount, "minted");
        Ok(())
    }

    fn transfer(
        &mut self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TokenResult<()> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        let book = self.book_mut(token)?;
        book.debit(from, amount)?;
        book.credit(to, amount)
    }

    fn transfer_from(
        &mut self,
        token: &TokenId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TokenResult<()> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        let have = self.allowance(token, from, spender);
        let book = self.book_mut(token)?;
        if have < amount {
            return Err(TokenError::InsufficientAllowance {
                spender: *spender,
                have,
                need: amount,
            });
        }

        book.debit(from, amount)?;
        book.credit(to, amount)?;

        let remaining = have.checked_sub(amount).ok_or(TokenError::Underflow)?;
        book.allowances.insert((*from, *spender), remaining);
        Ok(())
    }

    fn approve(
        &mut self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> TokenResult<()> {
        let book = self.book_mut(token)?;
        book.allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    fn allowance(&self, token: &TokenId, owner: &Address, spender: &Address) -> Amount {
        self.book(token)
            .and_then(|book| book.allowances.get(&(*owner, *spender)).copied())
            .unwrap_or(0)
    }

    fn balance_of(&self, token: &TokenId, owner: &Address) -> Amount {
        self.book(token).map_or(0, |book| book.balance_of(owner))
    }

    fn total_supply(&self, token: &TokenId) -> Amount {
        self.book(token).map_or(0, |book| book.supply)
    }
}
