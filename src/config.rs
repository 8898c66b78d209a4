//! Auction configuration
//!
//! Loaded from an optional TOML file. Anything left out falls back to
//! the default transfer-window roster.
use crate::market::{Amount, MarketError};
use rand::Rng;
use serde::Deserialize;
use std::{collections::BTreeSet, path::Path, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Market(#[from] MarketError),
    #[error("duplicate item: {0}")]
    DuplicateItem(String),
    #[error("duplicate buyer: {0}")]
    DuplicateBuyer(String),
    #[error("no buyers configured")]
    NoBuyers,
    #[error("{0} delay range is empty")]
    EmptyRange(&'static str),
    #[error("total {0} does not fit in an amount")]
    TotalOverflow(&'static str),
}

/// A `[min_ms, max_ms)` range of delays, sampled uniformly
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange::fixed(0);

    pub const fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max_ms <= self.min_ms {
            Duration::from_millis(self.min_ms)
        } else {
            Duration::from_millis(rng.gen_range(self.min_ms..self.max_ms))
        }
    }

    fn is_empty(&self) -> bool {
        self.max_ms < self.min_ms
    }
}

/// Random delays that shape how buyers interleave
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Held while the item lock is held, between budget check and debit
    pub processing: DelayRange,
    /// Between two acquisition attempts
    pub browsing: DelayRange,
}

impl Pacing {
    #[cfg(test)]
    pub const INSTANT: Pacing = Pacing {
        processing: DelayRange::ZERO,
        browsing: DelayRange::ZERO,
    };
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            processing: DelayRange {
                min_ms: 50,
                max_ms: 100,
            },
            browsing: DelayRange {
                min_ms: 0,
                max_ms: 100,
            },
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ItemDef {
    pub name: String,
    pub price: Amount,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BuyerDef {
    pub name: String,
    pub budget: Amount,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Fixed seed for reproducible runs; random if unset
    pub seed: Option<u64>,
    pub timeout_secs: u64,
    pub pacing: Pacing,
    pub items: Vec<ItemDef>,
    pub buyers: Vec<BuyerDef>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buyers.is_empty() {
            return Err(ConfigError::NoBuyers);
        }
        if self.pacing.processing.is_empty() {
            return Err(ConfigError::EmptyRange("processing"));
        }
        if self.pacing.browsing.is_empty() {
            return Err(ConfigError::EmptyRange("browsing"));
        }

        let mut seen = BTreeSet::new();
        for item in &self.items {
            if item.name.is_empty() {
                return Err(MarketError::EmptyName.into());
            }
            if item.price == 0 {
                return Err(MarketError::ZeroPrice(item.name.clone()).into());
            }
            if !seen.insert(item.name.as_str()) {
                return Err(ConfigError::DuplicateItem(item.name.clone()));
            }
        }

        let mut seen = BTreeSet::new();
        for buyer in &self.buyers {
            if buyer.name.is_empty() {
                return Err(MarketError::EmptyName.into());
            }
            if !seen.insert(buyer.name.as_str()) {
                return Err(ConfigError::DuplicateBuyer(buyer.name.clone()));
            }
        }

        checked_total(self.items.iter().map(|item| item.price))
            .ok_or(ConfigError::TotalOverflow("item prices"))?;
        checked_total(self.buyers.iter().map(|buyer| buyer.budget))
            .ok_or(ConfigError::TotalOverflow("buyer budgets"))?;
        Ok(())
    }
}

fn checked_total(mut amounts: impl Iterator<Item = Amount>) -> Option<Amount> {
    amounts.try_fold(0, Amount::checked_add)
}

impl Default for Config {
    fn default() -> Self {
        let items = [
            ("Lionel Messi", 50),
            ("Cristiano Ronaldo", 45),
            ("Kylian Mbappe", 180),
            ("Erling Haaland", 170),
            ("Vinicius Junior", 120),
            ("Kevin De Bruyne", 80),
            ("Mohamed Salah", 90),
            ("Robert Lewandowski", 60),
            ("Neymar", 70),
            ("Harry Kane", 100),
            ("Gianluigi Buffon", 30),
            ("Zinedine Zidane", 55),
        ];
        let buyers = [
            ("Real Madrid", 300),
            ("Barcelona", 200),
            ("Manchester City", 400),
            ("PSG", 250),
            ("Bayern", 180),
            ("Chelsea", 150),
            ("Juventus", 120),
            ("Liverpool", 220),
        ];

        Self {
            seed: None,
            timeout_secs: 120,
            pacing: Pacing::default(),
            items: items
                .into_iter()
                .map(|(name, price)| ItemDef {
                    name: name.to_owned(),
                    price,
                })
                .collect(),
            buyers: buyers
                .into_iter()
                .map(|(name, budget)| BuyerDef {
                    name: name.to_owned(),
                    budget,
                })
                .collect(),
        }
    }
}
