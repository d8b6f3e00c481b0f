//! Order repository.
//!
//! Placement and status changes run in one transaction that locks the
//! affected product rows (`FOR UPDATE`, in id order) before touching stock.
//! The caller supplies the business decision as a closure evaluated against
//! the locked rows, so the rules stay in `services::orders`.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use emporium_core::{OrderId, OrderStatus, Pagination, ProductId, UserId};

use super::RepositoryError;
use super::products::PRODUCT_COLUMNS;
use crate::models::{Order, OrderChanges, OrderDraft, OrderItem, OrderWithItems, Product};

const ORDER_COLUMNS: &str = "id, user_id, order_number, status, subtotal, tax, shipping, total, \
     currency, shipping_address, shipping_city, shipping_postal_code, shipping_country, \
     payment_method, payment_intent_id, notes, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, product_sku, quantity, \
     unit_price, total_price, created_at";

/// Repository for orders and their items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order.
    ///
    /// Locks the products in `product_ids`, hands them to `price` to build
    /// the draft, then writes the order and its items and decrements stock.
    /// Nothing is written if `price` fails.
    ///
    /// # Errors
    ///
    /// Returns the error from `price`, or a `RepositoryError` converted into
    /// `E` if a query fails.
    pub async fn place<E, F>(
        &self,
        user_id: UserId,
        product_ids: &[ProductId],
        price: F,
    ) -> Result<OrderWithItems, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&[Product]) -> Result<OrderDraft, E>,
    {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(product_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        let draft = price(&products)?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO orders (
                user_id, order_number, status, subtotal, tax, shipping, total, currency,
                shipping_address, shipping_city, shipping_postal_code, shipping_country, notes
            )
            VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&draft.order_number)
        .bind(draft.subtotal)
        .bind(draft.tax)
        .bind(draft.shipping)
        .bind(draft.total)
        .bind(draft.currency)
        .bind(&draft.ship_to.shipping_address)
        .bind(&draft.ship_to.shipping_city)
        .bind(&draft.ship_to.shipping_postal_code)
        .bind(&draft.ship_to.shipping_country)
        .bind(draft.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "order number already exists"))?;

        let mut insert = QueryBuilder::<Postgres>::new(
            "INSERT INTO order_items \
             (order_id, product_id, product_name, product_sku, quantity, unit_price, total_price) ",
        );
        insert.push_values(&draft.lines, |mut row, line| {
            row.push_bind(order.id)
                .push_bind(line.product_id)
                .push_bind(line.product_name.clone())
                .push_bind(line.product_sku.clone())
                .push_bind(line.quantity)
                .push_bind(line.unit_price)
                .push_bind(line.total_price);
        });
        insert.push(format!(" RETURNING {ITEM_COLUMNS}"));

        let items = insert
            .build_query_as::<OrderItem>()
            .fetch_all(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

        for line in &draft.lines {
            sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1")
                .bind(line.product_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await
                .map_err(RepositoryError::from)?;
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(OrderWithItems { order, items })
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderWithItems { order, items }))
    }

    /// One page of orders, newest first, plus the total number of matches.
    ///
    /// `user_id = None` lists every user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        user_id: Option<UserId>,
        status: Option<OrderStatus>,
        page: Pagination,
    ) -> Result<(Vec<OrderWithItems>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM orders
            WHERE ($1::INTEGER IS NULL OR user_id = $1)
              AND ($2::order_status IS NULL OR status = $2)
            ",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::INTEGER IS NULL OR user_id = $1)
              AND ($2::order_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(user_id)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        let rows = orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect();

        Ok((rows, total))
    }

    /// Change an order under a row lock.
    ///
    /// `decide` sees the locked order and returns the changes to apply.
    /// When the status moves into one that releases stock, the ordered
    /// quantities are added back to their products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (converted into `E`) if the order
    /// does not exist, the error from `decide`, or a converted
    /// `RepositoryError` if a query fails.
    pub async fn update<E, F>(&self, id: OrderId, decide: F) -> Result<OrderWithItems, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&Order) -> Result<OrderChanges, E>,
    {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let current = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from)?
        .ok_or(RepositoryError::NotFound)?;

        let changes = decide(&current)?;

        if let Some(next) = changes.status
            && next != current.status
            && next.releases_stock()
        {
            restore_stock(&mut tx, id).await?;
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE orders SET
                status = COALESCE($2, status),
                payment_method = COALESCE($3, payment_method),
                payment_intent_id = COALESCE($4, payment_intent_id),
                notes = COALESCE($5, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.status)
        .bind(changes.payment_method.as_deref())
        .bind(changes.payment_intent_id.as_deref())
        .bind(changes.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(OrderWithItems { order, items })
    }
}

/// Put an order's quantities back into stock.
async fn restore_stock(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        SELECT p.id FROM products p
        WHERE p.id IN (SELECT product_id FROM order_items WHERE order_id = $1)
        ORDER BY p.id
        FOR UPDATE
        ",
    )
    .bind(order_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r"
        UPDATE products p
        SET stock = p.stock + totals.quantity, updated_at = NOW()
        FROM (
            SELECT product_id, SUM(quantity)::INTEGER AS quantity
            FROM order_items
            WHERE order_id = $1
            GROUP BY product_id
        ) AS totals
        WHERE p.id = totals.product_id
        ",
    )
    .bind(order_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
