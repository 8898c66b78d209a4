use crate::{
    market::{Amount, BuyerName},
    service::Exit,
};

/// Something worth reporting that happened during the auction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuctionEvent {
    /// A buyer entered the market
    Started { buyer: BuyerName, budget: Amount },
    Purchased {
        buyer: BuyerName,
        item: String,
        price: Amount,
    },
    BudgetExhausted { buyer: BuyerName },
    /// A buyer is done, for whatever reason
    Finished {
        buyer: BuyerName,
        exit: Exit,
        acquired: Vec<String>,
        remaining: Amount,
    },
    /// The auction ran out of time and remaining buyers were cancelled
    TimedOut,
}
