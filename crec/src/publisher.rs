use crate::index::Index;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

/// Holds the currently served index generation.
///
/// Readers get a complete generation without locking; publishing replaces it
/// with a single atomic pointer swap. A reader holding the previous
/// generation keeps it alive until it is done with it.
#[derive(Debug)]
pub struct Publisher {
    current: ArcSwap<Index>,
}

impl Publisher {
    pub fn new(initial: Index) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    pub fn get(&self) -> Arc<Index> {
        self.current.load_full()
    }

    /// Publishes `index` and returns the generation it replaced.
    pub fn set(&self, index: Arc<Index>) -> Arc<Index> {
        info!(generation = %index.id(), items = index.len(), "Publishing index");
        self.current.swap(index)
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(Index::with_id(uuid::Uuid::new_v4().to_string()))
    }
}
