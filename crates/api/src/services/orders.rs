//! Order placement and lifecycle rules.
//!
//! Pricing and status decisions are plain functions over already-loaded
//! rows; `OrderService` wires them into the locking transactions of
//! [`OrderRepository`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;

use emporium_core::{
    Currency, OrderId, OrderStatus, Pagination, PaymentProvider, ProductId, round_money,
};

use crate::config::{PaymentConfig, PricingConfig};
use crate::db::{OrderRepository, RepositoryError};
use crate::models::{
    DraftLine, Order, OrderAddress, OrderChanges, OrderDraft, OrderWithItems, Product, User,
};
use crate::state::AppState;

/// Characters used in the random part of an order number.
const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Errors that can occur while placing or changing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    #[error("Product '{0}' is not available")]
    ProductUnavailable(String),

    #[error("Insufficient stock for '{name}': requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: i32,
        available: i32,
    },

    #[error("Quantity for product {0} is too large")]
    QuantityOverflow(ProductId),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Payment method '{0}' is not enabled")]
    PaymentMethodDisabled(String),

    #[error("Order not found")]
    NotFound,

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for OrderError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// A requested quantity of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Everything needed to price an order, minus the product rows.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub currency: Currency,
    pub ship_to: OrderAddress,
    pub notes: Option<String>,
    pub lines: Vec<OrderLine>,
}

/// Admin update request after schema validation.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<String>,
    pub payment_intent_id: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Pure rules
// =============================================================================

/// Combine lines for the same product, keeping first-seen order.
///
/// # Errors
///
/// Returns `OrderError::QuantityOverflow` if a summed quantity overflows.
pub fn merge_lines(lines: &[OrderLine]) -> Result<Vec<OrderLine>, OrderError> {
    let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(existing) = merged.iter_mut().find(|m| m.product_id == line.product_id) {
            existing.quantity = existing
                .quantity
                .checked_add(line.quantity)
                .ok_or(OrderError::QuantityOverflow(line.product_id))?;
        } else {
            merged.push(*line);
        }
    }
    Ok(merged)
}

/// Price `checkout` against locked product rows.
///
/// Lines must already be merged. Unit prices are snapshotted in the order
/// currency; tax is `subtotal * tax_rate` rounded to cents and shipping is
/// the flat rate.
///
/// # Errors
///
/// Returns `OrderError` if a product is missing, inactive or short on stock.
pub fn price_order(
    checkout: &Checkout,
    products: &[Product],
    pricing: &PricingConfig,
    order_number: String,
) -> Result<OrderDraft, OrderError> {
    let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut lines = Vec::with_capacity(checkout.lines.len());
    let mut subtotal = Decimal::ZERO;

    for line in &checkout.lines {
        let product = by_id
            .get(&line.product_id)
            .ok_or(OrderError::ProductNotFound(line.product_id))?;

        if !product.is_active {
            return Err(OrderError::ProductUnavailable(product.name.clone()));
        }
        if product.stock < line.quantity {
            return Err(OrderError::InsufficientStock {
                name: product.name.clone(),
                requested: line.quantity,
                available: product.stock,
            });
        }

        let unit_price = product.price_in(checkout.currency);
        let total_price = round_money(unit_price * Decimal::from(line.quantity));
        subtotal += total_price;

        lines.push(DraftLine {
            product_id: product.id,
            product_name: product.name.clone(),
            product_sku: product.sku.clone(),
            quantity: line.quantity,
            unit_price,
            total_price,
        });
    }

    let tax = round_money(subtotal * pricing.tax_rate);
    let shipping = round_money(pricing.shipping_flat);

    Ok(OrderDraft {
        order_number,
        currency: checkout.currency,
        subtotal,
        tax,
        shipping,
        total: subtotal + tax + shipping,
        ship_to: checkout.ship_to.clone(),
        notes: checkout.notes.clone(),
        lines,
    })
}

/// `ORD-YYYYMMDD-XXXXXXXX` with eight random uppercase letters and digits.
#[must_use]
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..8)
        .filter_map(|_| {
            let idx = rng.random_range(0..ORDER_NUMBER_CHARSET.len());
            ORDER_NUMBER_CHARSET.get(idx).map(|b| char::from(*b))
        })
        .collect();
    format!("ORD-{}-{suffix}", now.format("%Y%m%d"))
}

/// Validate an admin update against the current order.
///
/// # Errors
///
/// Returns `OrderError::InvalidTransition` for a disallowed status change
/// and `OrderError::PaymentMethodDisabled` for a provider that is not
/// configured.
pub fn decide_update(
    order: &Order,
    update: &OrderUpdate,
    payments: &PaymentConfig,
) -> Result<OrderChanges, OrderError> {
    if let Some(next) = update.status
        && next != order.status
        && !order.status.can_transition_to(next)
    {
        return Err(OrderError::InvalidTransition {
            from: order.status,
            to: next,
        });
    }

    let payment_method = match update.payment_method.as_deref() {
        Some(raw) => {
            let provider: PaymentProvider = raw
                .parse()
                .map_err(|_| OrderError::PaymentMethodDisabled(raw.to_owned()))?;
            if !payments.is_enabled(provider) {
                return Err(OrderError::PaymentMethodDisabled(raw.to_owned()));
            }
            Some(provider.as_str().to_owned())
        }
        None => None,
    };

    Ok(OrderChanges {
        status: update.status.filter(|s| *s != order.status),
        payment_method,
        payment_intent_id: update.payment_intent_id.clone(),
        notes: update.notes.clone(),
    })
}

/// Cancel an order if its status allows it.
///
/// # Errors
///
/// Returns `OrderError::InvalidTransition` if the order can no longer be
/// cancelled.
pub fn decide_cancel(order: &Order) -> Result<OrderChanges, OrderError> {
    if !order.status.can_transition_to(OrderStatus::Cancelled) {
        return Err(OrderError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Cancelled,
        });
    }
    Ok(OrderChanges {
        status: Some(OrderStatus::Cancelled),
        payment_method: None,
        payment_intent_id: None,
        notes: None,
    })
}

// =============================================================================
// Service
// =============================================================================

/// Order service.
pub struct OrderService<'a> {
    state: &'a AppState,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            orders: OrderRepository::new(state.pool()),
        }
    }

    /// Place an order for `user`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError` if any line cannot be fulfilled or a query fails.
    pub async fn place(&self, user: &User, checkout: Checkout) -> Result<OrderWithItems, OrderError> {
        let checkout = Checkout {
            lines: merge_lines(&checkout.lines)?,
            ..checkout
        };
        let product_ids: Vec<ProductId> = checkout.lines.iter().map(|l| l.product_id).collect();
        let pricing = self.state.config().pricing;
        let order_number = generate_order_number(Utc::now());

        let placed = self
            .orders
            .place(user.id, &product_ids, |products| {
                price_order(&checkout, products, &pricing, order_number)
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            order_id = %placed.order.id,
            order_number = %placed.order.order_number,
            total = %placed.order.total,
            currency = %placed.order.currency,
            "Order placed"
        );

        Ok(placed)
    }

    /// Orders visible to `user`: their own, or everyone's for an admin.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list(
        &self,
        user: &User,
        status: Option<OrderStatus>,
        page: Pagination,
    ) -> Result<(Vec<OrderWithItems>, i64), OrderError> {
        let owner = (!user.is_admin()).then_some(user.id);
        Ok(self.orders.list(owner, status, page).await?)
    }

    /// An order the user may see.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if it does not exist or belongs to
    /// someone else.
    pub async fn get(&self, user: &User, id: OrderId) -> Result<OrderWithItems, OrderError> {
        self.orders
            .get(id)
            .await?
            .filter(|o| user.is_admin() || o.order.user_id == user.id)
            .ok_or(OrderError::NotFound)
    }

    /// Apply an admin update.
    ///
    /// # Errors
    ///
    /// Returns `OrderError` if the order is missing or the update is rejected.
    pub async fn update(&self, id: OrderId, update: &OrderUpdate) -> Result<OrderWithItems, OrderError> {
        let payments = &self.state.config().payments;
        let updated = self
            .orders
            .update(id, |order| decide_update(order, update, payments))
            .await?;

        tracing::info!(order_id = %id, status = %updated.order.status, "Order updated");
        Ok(updated)
    }

    /// Cancel an order on behalf of its owner or an admin, restoring stock.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the user may not see the order and
    /// `OrderError::InvalidTransition` if it can no longer be cancelled.
    pub async fn cancel(&self, user: &User, id: OrderId) -> Result<OrderWithItems, OrderError> {
        let cancelled = self
            .orders
            .update(id, |order| {
                if !user.is_admin() && order.user_id != user.id {
                    return Err(OrderError::NotFound);
                }
                decide_cancel(order)
            })
            .await?;

        tracing::info!(order_id = %id, user_id = %user.id, "Order cancelled");
        Ok(cancelled)
    }
}
