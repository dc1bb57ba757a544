//! Category-keyed product repositories.
//!
//! Each product category owns its own collection, but all four expose the
//! same repository interface, so order placement dispatches through a
//! registry built at startup instead of a conditional chain over the
//! category tag.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use strum::IntoEnumIterator;

use crate::model::{Category, LedgerKey, Order, Product, ProductId};
use crate::store::{LedgerUpdate, StoreError, Transaction};

/// Uniform, transaction-scoped access to one category's products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(
        &self,
        tx: &mut Transaction,
        id: &ProductId,
    ) -> Result<Option<Product>, StoreError>;

    /// Conditionally decrement stock by `quantity`, returning the stock
    /// level left after the reservation.
    async fn reserve(
        &self,
        tx: &mut Transaction,
        id: &ProductId,
        quantity: u32,
    ) -> Result<u32, StoreError>;
}

/// Transaction-scoped upserts into the denormalized stock ledger.
#[async_trait]
pub trait StockLedgerRepository: Send + Sync {
    async fn upsert(
        &self,
        tx: &mut Transaction,
        key: LedgerKey,
        update: LedgerUpdate,
    ) -> Result<(), StoreError>;
}

/// Transaction-scoped order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, tx: &mut Transaction, order: Order) -> Result<(), StoreError>;
}

/// Memory-store product repository for a single category.
pub struct MemoryProductRepository {
    category: Category,
}

impl MemoryProductRepository {
    pub fn new(category: Category) -> Self {
        Self { category }
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn find_by_id(
        &self,
        tx: &mut Transaction,
        id: &ProductId,
    ) -> Result<Option<Product>, StoreError> {
        tx.find_product(self.category, id)
    }

    async fn reserve(
        &self,
        tx: &mut Transaction,
        id: &ProductId,
        quantity: u32,
    ) -> Result<u32, StoreError> {
        tx.reserve_stock(self.category, id, quantity)
    }
}

pub struct MemoryStockLedgerRepository;

#[async_trait]
impl StockLedgerRepository for MemoryStockLedgerRepository {
    async fn upsert(
        &self,
        tx: &mut Transaction,
        key: LedgerKey,
        update: LedgerUpdate,
    ) -> Result<(), StoreError> {
        tx.upsert_ledger(key, update)
    }
}

pub struct MemoryOrderRepository;

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn insert(&self, tx: &mut Transaction, order: Order) -> Result<(), StoreError> {
        tx.insert_order(order)
    }
}

/// Registry mapping every category tag to its product repository. All four
/// categories are registered at construction, so lookups cannot miss for a
/// parsed [`Category`].
pub struct CategoryRegistry {
    repositories: HashMap<Category, Arc<dyn ProductRepository>>,
}

impl CategoryRegistry {
    /// Registry over the memory store backend, one repository per category.
    pub fn with_memory_backends() -> Self {
        let repositories = Category::iter()
            .map(|category| {
                let repo: Arc<dyn ProductRepository> =
                    Arc::new(MemoryProductRepository::new(category));
                (category, repo)
            })
            .collect();
        Self { repositories }
    }

    pub fn product_repository(&self, category: Category) -> &Arc<dyn ProductRepository> {
        // Every category variant is registered in the constructor.
        &self.repositories[&category]
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}
