//! Shopper
//!
//! The loop a single buyer runs: walk a private shuffled copy of the
//! catalog and try to buy each item until the catalog or the budget
//! runs out, or the auction is stopped.
use super::{Exit, Flow, LoopService, ServiceId, StopSignal};
use crate::{
    config::Pacing,
    event::AuctionEvent,
    event_log,
    market::{Attempt, Buyer, Catalog, Item},
};
use anyhow::Result;
use rand::Rng;
use std::{mem, sync::Arc, vec};
use tracing::debug;

#[derive(Debug)]
pub enum ShopperState {
    Starting,
    Shopping { queue: vec::IntoIter<Arc<Item>> },
    Finished,
    Cancelled,
}

pub struct Shopper<R> {
    buyer: Arc<Buyer>,
    catalog: Catalog,
    pacing: Pacing,
    rng: R,
    event_writer: event_log::SharedWriter,
    state: ShopperState,
}

impl<R> Shopper<R>
where
    R: Rng + Send,
{
    pub fn new(
        buyer: Arc<Buyer>,
        catalog: Catalog,
        pacing: Pacing,
        rng: R,
        event_writer: event_log::SharedWriter,
    ) -> Self {
        Self {
            buyer,
            catalog,
            pacing,
            rng,
            event_writer,
            state: ShopperState::Starting,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &ShopperState {
        &self.state
    }

    /// Announce the buyer and draw its private browsing order
    fn start(&mut self) -> Result<()> {
        self.event_writer.write(&[AuctionEvent::Started {
            buyer: self.buyer.name().to_owned(),
            budget: self.buyer.remaining_budget(),
        }])?;

        let queue = self.catalog.shuffled(&mut self.rng).into_iter();
        self.state = ShopperState::Shopping { queue };
        Ok(())
    }

    fn shop(&mut self, mut queue: vec::IntoIter<Arc<Item>>, stop: &StopSignal) -> Result<Flow> {
        let Some(item) = queue.next() else {
            self.state = ShopperState::Finished;
            return Ok(Flow::Finished);
        };

        // advisory: only decides whether this shopper keeps going
        if self.buyer.remaining_budget() == 0 {
            self.event_writer.write(&[AuctionEvent::BudgetExhausted {
                buyer: self.buyer.name().to_owned(),
            }])?;
            self.state = ShopperState::Finished;
            return Ok(Flow::Finished);
        }

        let processing = self.pacing.processing.sample(&mut self.rng);
        match item.try_buy(&self.buyer, || stop.sleep(processing)) {
            Attempt::Acquired => {
                self.buyer.record_acquisition(item.clone());
                self.event_writer.write(&[AuctionEvent::Purchased {
                    buyer: self.buyer.name().to_owned(),
                    item: item.name().to_owned(),
                    price: item.price(),
                }])?;
            }
            Attempt::Cancelled => {
                self.state = ShopperState::Cancelled;
                return Ok(Flow::Cancelled);
            }
            attempt => {
                debug!(buyer = %self.buyer.name(), item = %item.name(), ?attempt, "not acquired");
            }
        }

        self.state = ShopperState::Shopping { queue };

        let browsing = self.pacing.browsing.sample(&mut self.rng);
        if stop.sleep(browsing).is_err() {
            self.state = ShopperState::Cancelled;
            return Ok(Flow::Cancelled);
        }
        Ok(Flow::Continue)
    }
}

impl<R> LoopService for Shopper<R>
where
    R: Rng + Send,
{
    fn service_id(&self) -> ServiceId {
        format!("shopper-{}", self.buyer.name())
    }

    fn on_start(&mut self) -> Result<()> {
        match self.state {
            ShopperState::Starting => self.start(),
            _ => Ok(()),
        }
    }

    fn run_iteration(&mut self, stop: &StopSignal) -> Result<Flow> {
        match mem::replace(&mut self.state, ShopperState::Finished) {
            ShopperState::Starting => {
                self.start()?;
                Ok(Flow::Continue)
            }
            ShopperState::Shopping { queue } => self.shop(queue, stop),
            ShopperState::Finished => Ok(Flow::Finished),
            ShopperState::Cancelled => {
                self.state = ShopperState::Cancelled;
                Ok(Flow::Cancelled)
            }
        }
    }

    fn on_exit(&mut self, exit: Exit) -> Result<()> {
        self.state = match exit {
            Exit::Finished => ShopperState::Finished,
            Exit::Cancelled => ShopperState::Cancelled,
        };

        self.event_writer.write(&[AuctionEvent::Finished {
            buyer: self.buyer.name().to_owned(),
            exit,
            acquired: self
                .buyer
                .acquired()
                .iter()
                .map(|item| item.to_string())
                .collect(),
            remaining: self.buyer.remaining_budget(),
        }])
    }
}
