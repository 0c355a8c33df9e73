//! In-memory token: ledger and token manager in one.
//!
//! Used by `issuancectl simulate` and the test suites. Balances live in a
//! mutex-guarded map; every operation is atomic on its own.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use issuance_core::{AccountId, CollaboratorError};

use crate::collaborators::{TokenLedger, TokenManager};

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<AccountId, u128>,
    total_supply: u128,
}

/// A mintable, burnable token held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryToken {
    book: Mutex<Book>,
}

impl MemoryToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` into `account` at construction time.
    pub fn with_balance(self, account: impl Into<AccountId>, amount: u128) -> Self {
        {
            let mut book = self.lock();
            *book.balances.entry(account.into()).or_default() += amount;
            book.total_supply += amount;
        }
        self
    }

    /// Move tokens between holders without touching supply.
    pub fn transfer(&self, from: &str, to: &str, amount: u128) -> Result<(), CollaboratorError> {
        let mut book = self.lock();
        debit(&mut book, from, amount)?;
        *book.balances.entry(to.to_string()).or_default() += amount;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn debit(book: &mut Book, account: &str, amount: u128) -> Result<(), CollaboratorError> {
    let available = book.balances.get(account).copied().unwrap_or(0);
    if available < amount {
        return Err(CollaboratorError::InsufficientBalance {
            account: account.to_string(),
            needed: amount,
            available,
        });
    }
    book.balances.insert(account.to_string(), available - amount);
    Ok(())
}

impl TokenLedger for MemoryToken {
    fn balance_of(&self, account: &str) -> Result<u128, CollaboratorError> {
        Ok(self.lock().balances.get(account).copied().unwrap_or(0))
    }

    fn total_supply(&self) -> Result<u128, CollaboratorError> {
        Ok(self.lock().total_supply)
    }
}

impl TokenManager for MemoryToken {
    fn mint(&self, to: &str, amount: u128) -> Result<(), CollaboratorError> {
        let mut book = self.lock();
        let supply = book
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| CollaboratorError::Rejected(format!("mint of {amount} overflows supply")))?;
        book.total_supply = supply;
        *book.balances.entry(to.to_string()).or_default() += amount;
        debug!(%to, amount, supply, "minted");
        Ok(())
    }

    fn burn(&self, from: &str, amount: u128) -> Result<(), CollaboratorError> {
        let mut book = self.lock();
        debit(&mut book, from, amount)?;
        book.total_supply -= amount;
        debug!(%from, amount, supply = book.total_supply, "burned");
        Ok(())
    }
}
