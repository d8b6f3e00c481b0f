//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use emporium_core::{Currency, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// A placed order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub currency: Currency,
    #[sqlx(flatten)]
    pub ship_to: OrderAddress,
    pub payment_method: Option<String>,
    pub payment_intent_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where an order is shipped.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderAddress {
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
}

/// One line of an order, with the product snapshot taken at checkout.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// An order together with its lines.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A priced order ready to be written, computed from locked product rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub order_number: String,
    pub currency: Currency,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub ship_to: OrderAddress,
    pub notes: Option<String>,
    pub lines: Vec<DraftLine>,
}

/// One priced line of an [`OrderDraft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Admin changes to an order. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<String>,
    pub payment_intent_id: Option<String>,
    pub notes: Option<String>,
}
