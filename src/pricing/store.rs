use crate::pricing::models::PriceTable;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Holds the currently visible price table.
///
/// Readers take a snapshot without locking; `publish` replaces the whole
/// table with a single pointer swap, so a reader sees either the old or the
/// new table and never a mix.
pub struct PriceStore {
    current: ArcSwap<PriceTable>,
}

impl PriceStore {
    /// Store starting with an empty table
    pub fn new() -> Self {
        Self::with_table(PriceTable::new())
    }

    pub fn with_table(table: PriceTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// Snapshot of the table visible right now
    pub fn current_table(&self) -> Arc<PriceTable> {
        self.current.load_full()
    }

    /// Atomically replace the visible table
    pub fn publish(&self, table: PriceTable) {
        self.current.store(Arc::new(table));
    }
}

impl Default for PriceStore {
    fn default() -> Self {
        Self::new()
    }
}
