//! Where auction events go
//!
//! The market core never prints anything itself; it hands
//! [`AuctionEvent`]s to an injected [`Writer`].
#[cfg(test)]
mod in_memory;

#[cfg(test)]
pub use self::in_memory::*;
use crate::event::AuctionEvent;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub trait Writer {
    fn write(&self, events: &[AuctionEvent]) -> Result<()>;
}

pub type SharedWriter = Arc<dyn Writer + Send + Sync + 'static>;

/// Renders every event as a `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl TracingLog {
    pub fn new_shared() -> SharedWriter {
        Arc::new(Self)
    }
}

impl Writer for TracingLog {
    fn write(&self, events: &[AuctionEvent]) -> Result<()> {
        for event in events {
            match event {
                AuctionEvent::Started { buyer, budget } => {
                    info!(%buyer, %budget, "starts shopping");
                }
                AuctionEvent::Purchased { buyer, item, price } => {
                    info!(%buyer, %item, %price, "bought");
                }
                AuctionEvent::BudgetExhausted { buyer } => {
                    info!(%buyer, "ran out of budget");
                }
                AuctionEvent::Finished {
                    buyer,
                    exit,
                    acquired,
                    remaining,
                } => {
                    info!(
                        %buyer,
                        ?exit,
                        count = acquired.len(),
                        acquired = %acquired.join(", "),
                        %remaining,
                        "done shopping"
                    );
                }
                AuctionEvent::TimedOut => {
                    warn!("auction timed out, cancelling remaining buyers");
                }
            }
        }
        debug!(count = events.len(), "events written");
        Ok(())
    }
}
