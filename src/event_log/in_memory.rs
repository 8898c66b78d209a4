use super::*;
use parking_lot::RwLock;

/// Keeps every written event, in order
///
/// Useful for unit-tests.
#[derive(Debug, Default)]
pub struct InMemoryLog {
    inner: RwLock<Vec<AuctionEvent>>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn events(&self) -> Vec<AuctionEvent> {
        self.inner.read().clone()
    }
}

impl Writer for InMemoryLog {
    fn write(&self, events: &[AuctionEvent]) -> Result<()> {
        self.inner.write().extend_from_slice(events);
        Ok(())
    }
}
