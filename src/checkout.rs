//! Order placement: the one transactional workflow in the storefront.
//!
//! A checkout request is validated, then every line item is resolved and
//! its stock reserved inside a single store transaction, the stock ledger
//! is mirrored, pricing is computed, and the order is persisted — all or
//! nothing. Any failure between begin and commit aborts the transaction
//! and surfaces the originating error; abort failures are logged only.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{error, info, warn};

use crate::catalog::{
    CategoryRegistry, MemoryOrderRepository, MemoryStockLedgerRepository, OrderRepository,
    StockLedgerRepository,
};
use crate::error::OrderError;
use crate::model::{
    Category, CheckoutRequest, CustomerInfo, DeliveryAddress, LedgerKey, LineItemRequest, Order,
    OrderLineItem, OrderStatus, ProductId,
};
use crate::pricing;
use crate::store::{LedgerOnInsert, LedgerUpdate, MemoryStore, Transaction};

/// Prefix of every generated order number.
pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Source tag stamped on ledger entries created by online checkouts.
const LEDGER_SOURCE_ONLINE: &str = "online";

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_number: String,
    pub total_amount: u64,
}

/// The order placement service.
pub struct OrderPlacementService {
    store: Arc<MemoryStore>,
    registry: Arc<CategoryRegistry>,
    ledger: Arc<dyn StockLedgerRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl OrderPlacementService {
    pub fn new(store: Arc<MemoryStore>, registry: Arc<CategoryRegistry>) -> Self {
        Self {
            store,
            registry,
            ledger: Arc::new(MemoryStockLedgerRepository),
            orders: Arc::new(MemoryOrderRepository),
        }
    }

    /// Place an order for the given checkout request.
    ///
    /// Fails fast with [`OrderError::DatabaseUnavailable`] when the store
    /// is down and rejects invalid requests before any transaction is
    /// opened. Everything after `begin` runs inside one transaction.
    pub async fn place_order(&self, request: CheckoutRequest) -> Result<PlacedOrder, OrderError> {
        if !self.store.is_ready() {
            warn!("store not ready, rejecting order request");
            return Err(OrderError::DatabaseUnavailable);
        }

        let checkout = validate(request)?;

        let mut tx = self.store.begin().map_err(OrderError::from)?;
        match self.build_order(&mut tx, &checkout).await {
            Ok(order) => match tx.commit() {
                Ok(()) => {
                    info!(
                        order_number = %order.order_number,
                        item_count = order.items.len(),
                        subtotal = order.subtotal,
                        delivery_charge = order.delivery_charge,
                        total_amount = order.total_amount,
                        "order placed"
                    );
                    Ok(PlacedOrder {
                        order_number: order.order_number,
                        total_amount: order.total_amount,
                    })
                }
                Err(store_err) => {
                    let err = OrderError::from(store_err);
                    error!(error = %err, category = err.category(), "order commit failed");
                    Err(err)
                }
            },
            Err(err) => {
                error!(
                    error = %err,
                    category = err.category(),
                    "order placement failed, aborting transaction"
                );
                if let Err(abort_err) = tx.abort() {
                    // Logged only. The originating error still wins.
                    warn!(error = %abort_err, "failed to abort order transaction");
                }
                Err(err)
            }
        }
    }

    /// Reserve stock, mirror the ledger, price the order, and stage its
    /// persistence. Runs entirely inside `tx`.
    async fn build_order(
        &self,
        tx: &mut Transaction,
        checkout: &ValidCheckout,
    ) -> Result<Order, OrderError> {
        let mut items = Vec::with_capacity(checkout.items.len());
        let mut subtotal: u64 = 0;

        for line in &checkout.items {
            let repo = self.registry.product_repository(line.category);

            let product = repo
                .find_by_id(tx, &line.id)
                .await?
                .ok_or_else(|| OrderError::ProductNotFound {
                    id: line.id.to_string(),
                })?;

            let remaining = repo.reserve(tx, &line.id, line.quantity).await?;

            let product_code = product.code_or_derived(line.category);
            self.ledger
                .upsert(
                    tx,
                    LedgerKey {
                        product_id: line.id.clone(),
                        category: line.category,
                    },
                    LedgerUpdate {
                        current_stock: remaining,
                        last_updated: Utc::now(),
                        on_insert: LedgerOnInsert {
                            product_code: product_code.clone(),
                            product_name: product.name.clone(),
                            source: LEDGER_SOURCE_ONLINE.to_string(),
                        },
                    },
                )
                .await?;

            subtotal += product.selling_price * u64::from(line.quantity);
            let weight_grams = product.shipping_weight_grams();
            items.push(OrderLineItem {
                product_code,
                category: line.category,
                name: product.name,
                quantity: line.quantity,
                price_at_order: product.selling_price,
                weight_grams,
            });
        }

        let total_grams: u64 = items
            .iter()
            .map(|item| u64::from(item.weight_grams) * u64::from(item.quantity))
            .sum();
        let delivery_charge =
            pricing::delivery_charge(total_grams, &checkout.delivery_address.state);
        let total_amount = subtotal + delivery_charge;

        let order = Order {
            order_number: generate_order_number(),
            user_email: checkout.user_email.clone(),
            customer_name: checkout.customer.full_name.clone(),
            customer_phone: checkout.customer.mobile.clone(),
            delivery_address: checkout.delivery_address.clone(),
            items,
            subtotal,
            delivery_charge,
            total_amount,
            status: OrderStatus::Pending,
            order_date: Utc::now(),
        };

        self.orders.insert(tx, order.clone()).await?;
        Ok(order)
    }
}

#[derive(Debug)]
struct ValidCheckout {
    user_email: String,
    customer: CustomerInfo,
    delivery_address: DeliveryAddress,
    items: Vec<ValidItem>,
}

#[derive(Debug)]
struct ValidItem {
    id: ProductId,
    category: Category,
    quantity: u32,
}

/// Validate the raw request. Runs before the transaction: an empty item
/// list or missing field never opens one.
fn validate(request: CheckoutRequest) -> Result<ValidCheckout, OrderError> {
    let user_email = request
        .user_email
        .filter(|email| !email.trim().is_empty())
        .ok_or(OrderError::MissingFields)?;
    let customer = request.customer_info.ok_or(OrderError::MissingFields)?;
    let delivery_address = request.delivery_address.ok_or(OrderError::MissingFields)?;
    let items = request.selected_items.ok_or(OrderError::MissingFields)?;

    if items.is_empty() {
        return Err(OrderError::NoItemsSelected);
    }

    let items = items
        .into_iter()
        .map(validate_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ValidCheckout {
        user_email,
        customer,
        delivery_address,
        items,
    })
}

fn validate_item(item: LineItemRequest) -> Result<ValidItem, OrderError> {
    let id = item
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| invalid_item("missing product id"))?;

    let raw_category = item
        .category
        .filter(|tag| !tag.trim().is_empty())
        .ok_or_else(|| invalid_item("missing category type"))?;
    let category = Category::from_str(&raw_category)
        .map_err(|_| invalid_item(format!("invalid category type: {raw_category}")))?;

    let quantity = item
        .quantity
        .ok_or_else(|| invalid_item("missing quantity"))?;
    if quantity <= 0 {
        return Err(invalid_item(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    let quantity = u32::try_from(quantity)
        .map_err(|_| invalid_item(format!("quantity out of range: {quantity}")))?;

    Ok(ValidItem {
        id: ProductId(id),
        category,
        quantity,
    })
}

fn invalid_item(reason: impl Into<String>) -> OrderError {
    OrderError::InvalidItem {
        reason: reason.into(),
    }
}

/// Generate an order number: the prefix, the last 6 digits of the current
/// millisecond timestamp, and a 6-character random uppercase alphanumeric
/// suffix. Uniqueness beyond this construction is enforced at insert.
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis().to_string();
    let tail: String = {
        let digits: Vec<char> = millis.chars().collect();
        let start = digits.len().saturating_sub(6);
        digits[start..].iter().collect()
    };
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|byte| (byte as char).to_ascii_uppercase())
        .collect();
    format!("{ORDER_NUMBER_PREFIX}{tail}{suffix}")
}
