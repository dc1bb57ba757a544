//! Shared application state for the HTTP surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::catalog::CategoryRegistry;
use crate::checkout::OrderPlacementService;
use crate::store::MemoryStore;

/// State handed to every request handler.
pub struct AppState {
    store: Arc<MemoryStore>,
    placement: OrderPlacementService,
    /// Orders committed since startup.
    orders_placed: AtomicU64,
    /// Order requests that failed for any reason.
    orders_failed: AtomicU64,
}

impl AppState {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        let registry = Arc::new(CategoryRegistry::with_memory_backends());
        let placement = OrderPlacementService::new(Arc::clone(&store), registry);
        Self {
            store,
            placement,
            orders_placed: AtomicU64::new(0),
            orders_failed: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn placement(&self) -> &OrderPlacementService {
        &self.placement
    }

    pub fn record_order_placed(&self) {
        self.orders_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_failed(&self) {
        self.orders_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// (placed, failed) counters snapshot.
    pub fn order_counters(&self) -> (u64, u64) {
        (
            self.orders_placed.load(Ordering::Relaxed),
            self.orders_failed.load(Ordering::Relaxed),
        )
    }
}
