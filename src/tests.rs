mod buyer;
mod service;

use crate::market::{Buyer, Item};
use std::sync::Arc;

fn item(name: &str, price: u64) -> Arc<Item> {
    Arc::new(Item::new(name, price).expect("valid item"))
}

fn buyer(name: &str, budget: u64) -> Arc<Buyer> {
    Arc::new(Buyer::new(name, budget).expect("valid buyer"))
}
