//! Order payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use emporium_core::{Currency, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use crate::models::{OrderAddress, OrderItem, OrderWithItems};
use crate::services::orders::{Checkout, OrderLine, OrderUpdate as OrderUpdateCommand};

use super::{default_page, default_page_size};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemCreate {
    pub product_id: ProductId,
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderCreate {
    #[validate(length(min = 1, max = 255))]
    pub shipping_address: String,
    #[validate(length(min = 1, max = 100))]
    pub shipping_city: String,
    #[validate(length(min = 1, max = 20))]
    pub shipping_postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub shipping_country: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default)]
    pub currency: Currency,
    #[validate(length(min = 1, message = "Order must contain at least one item"), nested)]
    pub items: Vec<OrderItemCreate>,
}

impl From<OrderCreate> for Checkout {
    fn from(req: OrderCreate) -> Self {
        Self {
            currency: req.currency,
            ship_to: OrderAddress {
                shipping_address: req.shipping_address,
                shipping_city: req.shipping_city,
                shipping_postal_code: req.shipping_postal_code,
                shipping_country: req.shipping_country,
            },
            notes: req.notes,
            lines: req
                .items
                .into_iter()
                .map(|i| OrderLine {
                    product_id: i.product_id,
                    quantity: i.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    #[validate(length(min = 1, max = 50))]
    pub payment_method: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub payment_intent_id: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<OrderUpdate> for OrderUpdateCommand {
    fn from(req: OrderUpdate) -> Self {
        Self {
            status: req.status,
            payment_method: req.payment_method,
            payment_intent_id: req.payment_intent_id,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    pub status: Option<OrderStatus>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            product_sku: item.product_sku,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub currency: Currency,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub payment_method: Option<String>,
    pub payment_intent_id: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderWithItems> for OrderResponse {
    fn from(OrderWithItems { order, items }: OrderWithItems) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            order_number: order.order_number,
            status: order.status,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping: order.shipping,
            total: order.total,
            currency: order.currency,
            shipping_address: order.ship_to.shipping_address,
            shipping_city: order.ship_to.shipping_city,
            shipping_postal_code: order.ship_to.shipping_postal_code,
            shipping_country: order.ship_to.shipping_country,
            payment_method: order.payment_method,
            payment_intent_id: order.payment_intent_id,
            notes: order.notes,
            items: items.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
