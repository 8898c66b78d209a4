//! Post-auction statistics
use crate::market::{Amount, Buyer, BuyerName, Catalog};
use std::{fmt, sync::Arc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerSummary {
    pub name: BuyerName,
    pub initial_budget: Amount,
    pub acquired: Vec<String>,
    pub spent: Amount,
    pub remaining: Amount,
    /// Sum of prices of `acquired`; equals `spent` unless accounting broke
    pub acquired_value: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub name: String,
    pub price: Amount,
    pub sold_to: Option<BuyerName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub buyers: Vec<BuyerSummary>,
    pub items: Vec<ItemSummary>,
    pub sold: usize,
    /// Totals are summed wider than `Amount` so they cannot overflow
    pub total_spent: u128,
    pub sold_value: u128,
}

impl Summary {
    pub fn collect(buyers: &[Arc<Buyer>], catalog: &Catalog) -> Self {
        let buyers: Vec<_> = buyers
            .iter()
            .map(|buyer| BuyerSummary {
                name: buyer.name().to_owned(),
                initial_budget: buyer.initial_budget(),
                acquired: buyer
                    .acquired()
                    .iter()
                    .map(|item| item.name().to_owned())
                    .collect(),
                spent: buyer.spent(),
                remaining: buyer.remaining_budget(),
                acquired_value: buyer.acquired_value(),
            })
            .collect();

        let items: Vec<_> = catalog
            .iter()
            .map(|item| ItemSummary {
                name: item.name().to_owned(),
                price: item.price(),
                sold_to: item.sold_to(),
            })
            .collect();

        Self {
            total_spent: buyers.iter().map(|buyer| u128::from(buyer.spent)).sum(),
            buyers,
            items,
            sold: catalog.sold_count(),
            sold_value: catalog.sold_value(),
        }
    }

    pub fn average_price(&self) -> u128 {
        self.total_spent / self.sold.max(1) as u128
    }

    /// Every buyer paid exactly for what it holds, and money spent
    /// matches the value of sold items
    pub fn is_balanced(&self) -> bool {
        self.total_spent == self.sold_value
            && self
                .buyers
                .iter()
                .all(|buyer| {
                    u128::from(buyer.spent) == buyer.acquired_value
                        && buyer.spent.checked_add(buyer.remaining) == Some(buyer.initial_budget)
                })
            && self.buyers.iter().map(|b| b.acquired.len()).sum::<usize>() == self.sold
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final statistics")?;
        writeln!(f, "================")?;
        for buyer in &self.buyers {
            writeln!(
                f,
                "{:<18}: {} items, spent: {:>3}, remaining: {:>3}",
                buyer.name,
                buyer.acquired.len(),
                buyer.spent,
                buyer.remaining
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Items")?;
        writeln!(f, "-----")?;
        for item in &self.items {
            match &item.sold_to {
                Some(buyer) => writeln!(f, "{:<20} SOLD to {}", item.name, buyer)?,
                None => writeln!(f, "{:<20} available", item.name)?,
            }
        }

        writeln!(f)?;
        writeln!(f, "Totals")?;
        writeln!(f, "------")?;
        writeln!(f, "Buyers:        {}", self.buyers.len())?;
        writeln!(f, "Items listed:  {}", self.items.len())?;
        writeln!(f, "Items sold:    {}", self.sold)?;
        writeln!(f, "Total spent:   {}", self.total_spent)?;
        write!(f, "Average price: {}", self.average_price())
    }
}
