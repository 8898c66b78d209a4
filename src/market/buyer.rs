use super::{Amount, BuyerName, BuyerNameRef, Item, MarketError};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// An agent with a private, concurrently-debited budget
///
/// `budget` is readable without a lock (see [`Buyer::has_enough_budget`]),
/// but only ever written by [`Buyer::spend_budget`] while holding
/// `budget_lock`.
#[derive(Debug)]
pub struct Buyer {
    name: BuyerName,
    initial_budget: Amount,
    budget: AtomicU64,
    budget_lock: Mutex<()>,
    // only appended to by this buyer's own shopper
    acquired: Mutex<Vec<Arc<Item>>>,
}

impl Buyer {
    pub fn new(name: impl Into<BuyerName>, budget: Amount) -> Result<Self, MarketError> {
        let name = name.into();
        if name.is_empty() {
            return Err(MarketError::EmptyName);
        }
        Ok(Self {
            name,
            initial_budget: budget,
            budget: AtomicU64::new(budget),
            budget_lock: Mutex::new(()),
            acquired: Mutex::new(Vec::new()),
        })
    }

    pub fn name(&self) -> BuyerNameRef<'_> {
        &self.name
    }

    pub fn initial_budget(&self) -> Amount {
        self.initial_budget
    }

    pub fn remaining_budget(&self) -> Amount {
        self.budget.load(Ordering::Acquire)
    }

    pub fn spent(&self) -> Amount {
        self.initial_budget - self.remaining_budget()
    }

    /// Advisory check, may be stale by the time the caller acts on it
    pub fn has_enough_budget(&self, amount: Amount) -> bool {
        self.remaining_budget() >= amount
    }

    /// Authoritative check-and-deduct
    ///
    /// Returns `false` and leaves the budget untouched if it is lower
    /// than `amount` at the moment of the debit.
    pub fn spend_budget(&self, amount: Amount) -> bool {
        let _guard = self.budget_lock.lock();

        let current = self.budget.load(Ordering::Acquire);
        match current.checked_sub(amount) {
            Some(rest) => {
                self.budget.store(rest, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub fn record_acquisition(&self, item: Arc<Item>) {
        self.acquired.lock().push(item);
    }

    pub fn acquired(&self) -> Vec<Arc<Item>> {
        self.acquired.lock().clone()
    }

    /// Sum of prices of everything recorded as acquired
    pub fn acquired_value(&self) -> u128 {
        self.acquired
            .lock()
            .iter()
            .map(|item| u128::from(item.price()))
            .sum()
    }
}
