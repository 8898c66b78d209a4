use super::Item;
use rand::{seq::SliceRandom, Rng};
use std::{ops::Deref, sync::Arc};

/// The shared list of items every buyer browses
///
/// Never structurally mutated after construction; buyers share the
/// same `Item` instances.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Arc<[Arc<Item>]>,
}

impl Catalog {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().map(Arc::new).collect(),
        }
    }

    /// A private, randomly permuted view of the catalog
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Arc<Item>> {
        let mut view = self.items.to_vec();
        view.shuffle(rng);
        view
    }

    pub fn sold(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.items.iter().filter(|item| item.is_sold())
    }

    pub fn sold_count(&self) -> usize {
        self.sold().count()
    }

    /// Total price of sold items; wide enough that it cannot overflow
    pub fn sold_value(&self) -> u128 {
        self.sold().map(|item| u128::from(item.price())).sum()
    }
}

impl Deref for Catalog {
    type Target = [Arc<Item>];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}
