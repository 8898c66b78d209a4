//! Market
//!
//! Items for sale, the buyers competing for them, and the shared
//! catalog every buyer browses.
mod buyer;
mod catalog;
mod item;

pub use self::{buyer::*, catalog::*, item::*};
use thiserror::Error;

pub type BuyerName = String;
pub type BuyerNameRef<'s> = &'s str;
pub type Amount = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("item {0} has zero price")]
    ZeroPrice(String),
    #[error("name must not be empty")]
    EmptyName,
}

/// Result of a single acquisition attempt
///
/// Everything except `Acquired` is an ordinary, expected loss.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attempt {
    Acquired,
    /// Another buyer is mid-transaction on this item
    Contended,
    AlreadySold,
    /// Advisory budget check said no
    Unaffordable,
    /// Budget was spent elsewhere between the advisory check and the debit
    InsufficientFunds,
    /// Interrupted while the transaction was being processed
    Cancelled,
}

impl Attempt {
    #[cfg(test)]
    pub fn is_acquired(self) -> bool {
        self == Attempt::Acquired
    }
}
