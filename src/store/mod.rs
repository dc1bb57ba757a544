//! Transactional document store backing the order workflow.
//!
//! The order placement service only ever talks to the store through a
//! [`Transaction`](memory::Transaction): every read and write between
//! `begin` and `commit` is staged, and nothing becomes visible unless the
//! transaction commits. Stock decrements are conditional operations that
//! the store re-validates atomically at commit, so two transactions racing
//! for the last unit can never both succeed.

pub mod memory;

pub use memory::{LedgerOnInsert, LedgerUpdate, MemoryStore, Transaction};

use thiserror::Error;

/// Storage-level failures. Mapped to the order error taxonomy at the
/// service boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store is not connected / not ready to open transactions.
    #[error("store is not connected")]
    Unavailable,

    /// The transaction was already committed or aborted.
    #[error("transaction is no longer open")]
    TransactionClosed,

    /// A staged conditional decrement failed validation at commit, or a
    /// reservation exceeded the stock visible to the transaction.
    #[error("insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: u32,
        requested: u32,
    },

    /// A product referenced by a staged write no longer exists.
    #[error("product {id} no longer exists")]
    ProductMissing { id: String },

    /// An order with the same order number already exists.
    #[error("order number {0} already exists")]
    DuplicateOrderNumber(String),
}
