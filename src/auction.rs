//! Auction
//!
//! Wires buyers and the shared catalog together and runs one shopper
//! per buyer, all at once, under a global deadline.
use crate::{
    config::{Config, Pacing},
    event::AuctionEvent,
    event_log,
    market::{Buyer, BuyerName, Catalog, Item},
    service::{Exit, ServiceControl, Shopper},
};
use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub pacing: Pacing,
    pub timeout: Duration,
    /// Base seed; each shopper derives its own from it
    pub seed: Option<u64>,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pacing: config.pacing,
            timeout: config.timeout(),
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub exits: Vec<(BuyerName, Exit)>,
    pub timed_out: bool,
}

impl Outcome {
    pub fn cancelled(&self) -> usize {
        self.exits
            .iter()
            .filter(|(_, exit)| *exit == Exit::Cancelled)
            .count()
    }
}

pub struct Auction {
    catalog: Catalog,
    buyers: Vec<Arc<Buyer>>,
}

impl Auction {
    pub fn new(items: impl IntoIterator<Item = Item>, buyers: impl IntoIterator<Item = Buyer>) -> Self {
        Self {
            catalog: Catalog::new(items),
            buyers: buyers.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let items = config
            .items
            .iter()
            .map(|def| Item::new(def.name.clone(), def.price))
            .collect::<Result<Vec<_>, _>>()
            .context("invalid item")?;
        let buyers = config
            .buyers
            .iter()
            .map(|def| Buyer::new(def.name.clone(), def.budget))
            .collect::<Result<Vec<_>, _>>()
            .context("invalid buyer")?;
        Ok(Self::new(items, buyers))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn buyers(&self) -> &[Arc<Buyer>] {
        &self.buyers
    }

    /// Run every buyer concurrently until all are done or time is up
    ///
    /// On timeout all still-running shoppers are cancelled; either way
    /// every shopper is joined before this returns.
    pub fn run(
        &self,
        svc_ctl: &ServiceControl,
        options: &RunOptions,
        event_writer: event_log::SharedWriter,
    ) -> Result<Outcome> {
        info!(
            buyers = self.buyers.len(),
            items = self.catalog.len(),
            "auction opens"
        );

        let handles = self
            .buyers
            .iter()
            .enumerate()
            .map(|(i, buyer)| {
                let rng = match options.seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
                    None => StdRng::from_entropy(),
                };
                svc_ctl.spawn_loop(Shopper::new(
                    buyer.clone(),
                    self.catalog.clone(),
                    options.pacing,
                    rng,
                    event_writer.clone(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let timed_out = !svc_ctl.wait_idle(options.timeout);
        if timed_out {
            warn!(timeout = ?options.timeout, "auction timed out");
            svc_ctl.stop_all();
            event_writer.write(&[AuctionEvent::TimedOut])?;
        }

        let exits = self
            .buyers
            .iter()
            .zip(handles)
            .map(|(buyer, handle)| Ok((buyer.name().to_owned(), handle.join()?)))
            .collect::<Result<Vec<_>>>()?;

        info!(sold = self.catalog.sold_count(), "auction closed");
        Ok(Outcome { exits, timed_out })
    }
}
