//! Domain types and wire DTOs for the storefront order API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Weight assumed for products that never had one recorded.
pub const DEFAULT_WEIGHT_GRAMS: u32 = 100;

/// Product category discriminator. Selects which repository a line item
/// resolves against and which document shape it carries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Clothes,
    Toy,
    Bath,
    Newborn,
}

impl Category {
    /// Uppercase prefix used when deriving a product code for products
    /// that were created without one.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Category::Clothes => "CLOTHES",
            Category::Toy => "TOY",
            Category::Bath => "BATH",
            Category::Newborn => "NEWBORN",
        }
    }
}

/// Opaque product document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Catalog product. One document per category collection, all sharing this
/// shape. Stock is only ever mutated inside an order transaction and must
/// never go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Unique product code; absent for legacy products, in which case a
    /// derived code is used at order time.
    #[serde(default)]
    pub product_code: Option<String>,
    pub name: String,
    pub selling_price: u64,
    pub in_stock: u32,
    #[serde(default)]
    pub weight_grams: Option<u32>,
}

impl Product {
    /// Product code to stamp on order lines and ledger entries, falling
    /// back to `<CATEGORY>-<last 6 chars of id>` when none was assigned.
    pub fn code_or_derived(&self, category: Category) -> String {
        self.product_code
            .clone()
            .unwrap_or_else(|| derived_product_code(category, &self.id))
    }

    /// Shipping weight, defaulting when the product predates the field.
    pub fn shipping_weight_grams(&self) -> u32 {
        self.weight_grams.unwrap_or(DEFAULT_WEIGHT_GRAMS)
    }
}

/// Derive a product code of the form `<CATEGORY>-<last 6 chars of id>`.
pub fn derived_product_code(category: Category, id: &ProductId) -> String {
    let tail: String = {
        let chars: Vec<char> = id.as_str().chars().collect();
        let start = chars.len().saturating_sub(6);
        chars[start..].iter().collect()
    };
    format!("{}-{}", category.code_prefix(), tail)
}

/// Key of a stock-ledger entry: one entry per (product, category).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub product_id: ProductId,
    pub category: Category,
}

/// Denormalized inventory snapshot, kept in sync with the authoritative
/// product stock inside the same transaction as the order that moved it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLedgerEntry {
    pub product_id: ProductId,
    pub category: Category,
    pub current_stock: u32,
    pub product_code: String,
    pub product_name: String,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// Line-item snapshot embedded in an order. Price and weight are captured
/// at order time and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_code: String,
    pub category: Category,
    pub name: String,
    pub quantity: u32,
    pub price_at_order: u64,
    pub weight_grams: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

/// Committed order document. Created exactly once per successful checkout;
/// never partially persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: String,
    pub user_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: DeliveryAddress,
    pub items: Vec<OrderLineItem>,
    pub subtotal: u64,
    pub delivery_charge: u64,
    pub total_amount: u64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub full_name: String,
    pub mobile: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub pincode: String,
}

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

/// Checkout request body. Top-level fields are optional on the wire so that
/// absence is reported as a 400 with the storefront's own message rather
/// than a deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_email: Option<String>,
    pub customer_info: Option<CustomerInfo>,
    pub delivery_address: Option<DeliveryAddress>,
    pub selected_items: Option<Vec<LineItemRequest>>,
}

/// One requested line item, as sent by the cart page. The category tag is
/// kept raw here and parsed during validation.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemRequest {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "categoryTypemodel")]
    pub category: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub success: bool,
    pub order_number: String,
    pub total_amount: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
