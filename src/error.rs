//! Error taxonomy for order placement.
//!
//! Every failure the order endpoint can report is a variant here, and each
//! variant knows its HTTP status and its category for structured logging.
//! Errors raised inside the transactional phase abort the transaction before
//! they surface; abort and cleanup failures are logged but never override
//! the originating error (first error wins).

use axum::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced by the order placement service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The backing store is not in a ready state. Reported before any
    /// transaction is opened.
    #[error("Database connection failed. Please try again.")]
    DatabaseUnavailable,

    /// One of the top-level request fields is absent.
    #[error("Missing required fields")]
    MissingFields,

    /// The request carried an empty item list.
    #[error("No items selected for order")]
    NoItemsSelected,

    /// A line item is malformed: missing id, unknown category tag, or a
    /// non-positive quantity.
    #[error("Invalid item data: {reason}")]
    InvalidItem { reason: String },

    /// A referenced product id does not resolve in its category repository.
    #[error("Product not found: {id}")]
    ProductNotFound { id: String },

    /// Requested quantity exceeds the stock available for a product.
    #[error("Insufficient stock for {name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        name: String,
        available: u32,
        requested: u32,
    },

    /// The store rejected a transactional read or write.
    #[error("Order transaction failed: {0}")]
    Transaction(StoreError),
}

impl OrderError {
    /// HTTP status for the order endpoint's error contract.
    pub fn status_code(&self) -> StatusCode {
        match self {
            OrderError::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            OrderError::MissingFields
            | OrderError::NoItemsSelected
            | OrderError::InvalidItem { .. } => StatusCode::BAD_REQUEST,
            OrderError::ProductNotFound { .. }
            | OrderError::InsufficientStock { .. }
            | OrderError::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Category label used in log fields and failure counters.
    pub fn category(&self) -> &'static str {
        match self {
            OrderError::DatabaseUnavailable => "infrastructure",
            OrderError::MissingFields
            | OrderError::NoItemsSelected
            | OrderError::InvalidItem { .. } => "validation",
            OrderError::ProductNotFound { .. } | OrderError::InsufficientStock { .. } => {
                "resource_state"
            }
            OrderError::Transaction(_) => "transaction",
        }
    }

    /// Whether retrying the same request later could succeed without the
    /// caller changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrderError::DatabaseUnavailable | OrderError::Transaction(_)
        )
    }

    /// Extra hint carried in 5xx response bodies.
    pub fn details(&self) -> Option<&'static str> {
        match self {
            OrderError::InsufficientStock { .. } => {
                Some("Please adjust the quantities in your cart and try again.")
            }
            OrderError::ProductNotFound { .. } => {
                Some("Please remove the unavailable item from your cart and try again.")
            }
            OrderError::Transaction(_) => {
                Some("Please check your internet connection and try again.")
            }
            _ => None,
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => OrderError::DatabaseUnavailable,
            StoreError::InsufficientStock {
                name,
                available,
                requested,
            } => OrderError::InsufficientStock {
                name,
                available,
                requested,
            },
            StoreError::ProductMissing { id } => OrderError::ProductNotFound { id },
            other => OrderError::Transaction(other),
        }
    }
}
