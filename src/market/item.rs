use super::{Amount, Attempt, Buyer, BuyerName, MarketError};
use crate::service::Cancelled;
use parking_lot::Mutex;
use std::{fmt, sync::OnceLock};
use tracing::debug;

/// A unit of sale with a fixed price that can be sold exactly once
#[derive(Debug)]
pub struct Item {
    name: String,
    price: Amount,
    /// Held for the whole check-and-buy sequence
    lock: Mutex<()>,
    /// Set once, under `lock`. Readable without it.
    owner: OnceLock<BuyerName>,
}

impl Item {
    pub fn new(name: impl Into<String>, price: Amount) -> Result<Self, MarketError> {
        let name = name.into();
        if name.is_empty() {
            return Err(MarketError::EmptyName);
        }
        if price == 0 {
            return Err(MarketError::ZeroPrice(name));
        }
        Ok(Self {
            name,
            price,
            lock: Mutex::new(()),
            owner: OnceLock::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Amount {
        self.price
    }

    pub fn is_sold(&self) -> bool {
        self.owner.get().is_some()
    }

    pub fn sold_to(&self) -> Option<BuyerName> {
        self.owner.get().cloned()
    }

    /// Try to sell this item to `buyer`
    ///
    /// Never waits for the item lock: if another buyer holds it, this
    /// returns `Attempt::Contended` right away. `settle` simulates the
    /// transaction processing time and runs with the item lock held,
    /// between the advisory budget check and the authoritative debit.
    /// The lock is released on every return path.
    pub fn try_buy<F>(&self, buyer: &Buyer, settle: F) -> Attempt
    where
        F: FnOnce() -> Result<(), Cancelled>,
    {
        let Some(_guard) = self.lock.try_lock() else {
            return Attempt::Contended;
        };

        if self.is_sold() {
            return Attempt::AlreadySold;
        }

        if !buyer.has_enough_budget(self.price) {
            return Attempt::Unaffordable;
        }

        if settle().is_err() {
            debug!(item = %self.name, buyer = %buyer.name(), "transaction interrupted");
            return Attempt::Cancelled;
        }

        if !buyer.spend_budget(self.price) {
            debug!(item = %self.name, buyer = %buyer.name(), "budget spent elsewhere");
            return Attempt::InsufficientFunds;
        }

        if self.owner.set(buyer.name().to_owned()).is_err() {
            unreachable!("item {} sold twice while locked", self.name);
        }
        Attempt::Acquired
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.price)
    }
}
