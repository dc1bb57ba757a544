//! In-process document store with transactional writes.
//!
//! Collections live behind a single store-wide lock. A [`Transaction`]
//! stages its writes locally and sees its own staged stock reservations
//! layered over the committed state; at commit the store takes the lock,
//! validates every staged conditional decrement and order insert against
//! the committed state, and only then applies anything. Validation and
//! application happen under one lock acquisition, which is what serializes
//! two checkouts racing for the same units: the first commit wins, the
//! second fails validation with `InsufficientStock`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::StoreError;
use crate::model::{Category, LedgerKey, Order, Product, ProductId, StockLedgerEntry};

#[derive(Default)]
struct Collections {
    products: HashMap<(Category, ProductId), Product>,
    ledger: HashMap<LedgerKey, StockLedgerEntry>,
    orders: HashMap<String, Order>,
}

/// In-memory transactional store.
pub struct MemoryStore {
    collections: Mutex<Collections>,
    ready: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(Collections::default()),
            ready: AtomicBool::new(true),
        }
    }

    /// Whether the store accepts new transactions. Toggled off to simulate
    /// an outage.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Insert or replace a product outside any transaction. Used by catalog
    /// seeding and tests.
    pub fn insert_product(&self, category: Category, product: Product) {
        self.collections
            .lock()
            .products
            .insert((category, product.id.clone()), product);
    }

    /// Committed view of a product.
    pub fn product(&self, category: Category, id: &ProductId) -> Option<Product> {
        self.collections
            .lock()
            .products
            .get(&(category, id.clone()))
            .cloned()
    }

    /// Committed view of a stock-ledger entry.
    pub fn ledger_entry(&self, key: &LedgerKey) -> Option<StockLedgerEntry> {
        self.collections.lock().ledger.get(key).cloned()
    }

    /// Committed order by order number.
    pub fn order(&self, order_number: &str) -> Option<Order> {
        self.collections.lock().orders.get(order_number).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.collections.lock().orders.len()
    }

    /// Open a transaction. Fails when the store is not ready.
    pub fn begin(self: &Arc<Self>) -> Result<Transaction, StoreError> {
        if !self.is_ready() {
            return Err(StoreError::Unavailable);
        }
        Ok(Transaction {
            store: Arc::clone(self),
            staged: Vec::new(),
            state: TxState::Open,
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields written on every ledger upsert.
#[derive(Debug, Clone)]
pub struct LedgerUpdate {
    pub current_stock: u32,
    pub last_updated: DateTime<Utc>,
    pub on_insert: LedgerOnInsert,
}

/// Fields written only when the upsert creates the entry.
#[derive(Debug, Clone)]
pub struct LedgerOnInsert {
    pub product_code: String,
    pub product_name: String,
    pub source: String,
}

#[derive(Debug, Clone)]
enum StagedWrite {
    ReserveStock {
        category: Category,
        id: ProductId,
        quantity: u32,
    },
    UpsertLedger {
        key: LedgerKey,
        update: LedgerUpdate,
    },
    InsertOrder(Box<Order>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Open,
    Committed,
    Aborted,
}

/// One all-or-nothing unit of work against the store.
///
/// Dropping an open transaction discards its staged writes, so every exit
/// path that does not commit rolls back.
pub struct Transaction {
    store: Arc<MemoryStore>,
    staged: Vec<StagedWrite>,
    state: TxState,
}

impl Transaction {
    pub fn is_open(&self) -> bool {
        self.state == TxState::Open
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::TransactionClosed)
        }
    }

    /// Quantity already reserved for a product within this transaction.
    fn staged_reservation(&self, category: Category, id: &ProductId) -> u32 {
        self.staged
            .iter()
            .filter_map(|write| match write {
                StagedWrite::ReserveStock {
                    category: c,
                    id: i,
                    quantity,
                } if *c == category && i == id => Some(*quantity),
                _ => None,
            })
            .sum()
    }

    /// Read a product as this transaction sees it: committed state with the
    /// transaction's own staged reservations applied.
    pub fn find_product(
        &self,
        category: Category,
        id: &ProductId,
    ) -> Result<Option<Product>, StoreError> {
        self.ensure_open()?;
        let collections = self.store.collections.lock();
        let Some(product) = collections.products.get(&(category, id.clone())) else {
            return Ok(None);
        };
        let mut product = product.clone();
        product.in_stock = product
            .in_stock
            .saturating_sub(self.staged_reservation(category, id));
        Ok(Some(product))
    }

    /// Stage a conditional stock decrement and return the stock level the
    /// transaction observes after it. The condition (`in_stock >= quantity`)
    /// is checked here against the transaction's view and re-validated
    /// atomically against committed state at commit.
    pub fn reserve_stock(
        &mut self,
        category: Category,
        id: &ProductId,
        quantity: u32,
    ) -> Result<u32, StoreError> {
        self.ensure_open()?;
        let product = self
            .find_product(category, id)?
            .ok_or_else(|| StoreError::ProductMissing { id: id.to_string() })?;
        if product.in_stock < quantity {
            return Err(StoreError::InsufficientStock {
                name: product.name,
                available: product.in_stock,
                requested: quantity,
            });
        }
        self.staged.push(StagedWrite::ReserveStock {
            category,
            id: id.clone(),
            quantity,
        });
        Ok(product.in_stock - quantity)
    }

    /// Stage a ledger upsert: `current_stock` and `last_updated` are always
    /// written, the `on_insert` fields only when the entry does not exist
    /// yet. When the transaction also reserved stock for the same product,
    /// `current_stock` is recomputed from the committed stock at commit so
    /// the ledger never records a stale remainder.
    pub fn upsert_ledger(&mut self, key: LedgerKey, update: LedgerUpdate) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.staged.push(StagedWrite::UpsertLedger { key, update });
        Ok(())
    }

    /// Stage an order insert. Order numbers are unique; a duplicate fails
    /// the transaction rather than overwriting.
    pub fn insert_order(&mut self, order: Order) -> Result<(), StoreError> {
        self.ensure_open()?;
        let duplicate_staged = self.staged.iter().any(|write| {
            matches!(write, StagedWrite::InsertOrder(staged) if staged.order_number == order.order_number)
        });
        if duplicate_staged
            || self
                .store
                .collections
                .lock()
                .orders
                .contains_key(&order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(order.order_number));
        }
        self.staged.push(StagedWrite::InsertOrder(Box::new(order)));
        Ok(())
    }

    /// Validate and apply every staged write under the store lock.
    ///
    /// Validation runs to completion before anything is applied, so a
    /// failed commit leaves the committed state untouched.
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut collections = self.store.collections.lock();

        // Re-validate conditional decrements against committed state,
        // aggregated per product so several lines for one product are
        // checked as a whole.
        let mut totals: HashMap<(Category, ProductId), u32> = HashMap::new();
        for write in &self.staged {
            if let StagedWrite::ReserveStock {
                category,
                id,
                quantity,
            } = write
            {
                *totals.entry((*category, id.clone())).or_default() += *quantity;
            }
        }
        for ((category, id), requested) in &totals {
            let product = collections
                .products
                .get(&(*category, id.clone()))
                .ok_or_else(|| StoreError::ProductMissing { id: id.to_string() })?;
            if product.in_stock < *requested {
                return Err(StoreError::InsufficientStock {
                    name: product.name.clone(),
                    available: product.in_stock,
                    requested: *requested,
                });
            }
        }
        for write in &self.staged {
            if let StagedWrite::InsertOrder(order) = write {
                if collections.orders.contains_key(&order.order_number) {
                    return Err(StoreError::DuplicateOrderNumber(order.order_number.clone()));
                }
            }
        }

        for write in self.staged.drain(..) {
            match write {
                StagedWrite::ReserveStock {
                    category,
                    id,
                    quantity,
                } => {
                    if let Some(product) = collections.products.get_mut(&(category, id)) {
                        product.in_stock -= quantity;
                    }
                }
                StagedWrite::UpsertLedger { key, update } => {
                    let LedgerUpdate {
                        mut current_stock,
                        last_updated,
                        on_insert,
                    } = update;
                    // The staged stock level is this transaction's own view.
                    // When the transaction also reserved from the product,
                    // mirror the committed stock instead: an overlapping
                    // commit may have moved it since staging.
                    let reserved_key = (key.category, key.product_id.clone());
                    if totals.contains_key(&reserved_key) {
                        if let Some(product) = collections.products.get(&reserved_key) {
                            current_stock = product.in_stock;
                        }
                    }
                    collections
                        .ledger
                        .entry(key.clone())
                        .and_modify(|entry| {
                            entry.current_stock = current_stock;
                            entry.last_updated = last_updated;
                        })
                        .or_insert_with(|| StockLedgerEntry {
                            product_id: key.product_id,
                            category: key.category,
                            current_stock,
                            product_code: on_insert.product_code,
                            product_name: on_insert.product_name,
                            source: on_insert.source,
                            last_updated,
                        });
                }
                StagedWrite::InsertOrder(order) => {
                    collections.orders.insert(order.order_number.clone(), *order);
                }
            }
        }

        self.state = TxState::Committed;
        Ok(())
    }

    /// Discard every staged write.
    pub fn abort(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.staged.clear();
        self.state = TxState::Aborted;
        Ok(())
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("staged", &self.staged.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.state == TxState::Open && !self.staged.is_empty() {
            tracing::debug!(
                staged = self.staged.len(),
                "transaction dropped without commit, discarding staged writes"
            );
        }
    }
}
