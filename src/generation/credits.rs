//! Credit metering: fixed cost table and the ledger contract

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use crate::error::{AppError, Result};

/// Record of a completed debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditTransaction {
    pub cost: u32,
    pub remaining: i64,
}

/// Per-user balance store.
///
/// `verify_and_deduct` is called exactly once per generation request,
/// before any provider is contacted. A successful debit is final: the
/// cascade may still exhaust every provider, and the cost is not returned.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Atomically verify the balance covers `cost` and deduct it
    async fn verify_and_deduct(&self, user: &str, cost: u32) -> Result<CreditTransaction>;

    /// Current balance, if the user is known to the ledger
    async fn balance(&self, user: &str) -> Option<i64>;
}

/// In-process ledger backed by a concurrent map.
///
/// Stands in for the product's persistent balance store; unknown users are
/// seeded with the configured starting balance on first contact.
pub struct InMemoryCreditLedger {
    balances: DashMap<String, i64>,
    starting_balance: i64,
}

impl InMemoryCreditLedger {
    pub fn new(starting_balance: i64) -> Self {
        Self {
            balances: DashMap::new(),
            starting_balance,
        }
    }

    /// Set a user's balance directly
    pub fn set_balance(&self, user: &str, balance: i64) {
        self.balances.insert(user.to_string(), balance);
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn verify_and_deduct(&self, user: &str, cost: u32) -> Result<CreditTransaction> {
        let mut entry = self
            .balances
            .entry(user.to_string())
            .or_insert(self.starting_balance);

        if *entry < i64::from(cost) {
            return Err(AppError::InsufficientCredits {
                required: cost,
                available: *entry,
            });
        }

        *entry -= i64::from(cost);
        let remaining = *entry;
        drop(entry);

        info!(user = %user, cost = cost, remaining = remaining, "Credits deducted");

        Ok(CreditTransaction { cost, remaining })
    }

    async fn balance(&self, user: &str) -> Option<i64> {
        self.balances.get(user).map(|b| *b)
    }
}
