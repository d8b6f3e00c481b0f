//! Product repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use emporium_core::{Pagination, ProductId};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductChanges, ProductFilter};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, slug, description, sku, \
     price_usd, price_pln, price_eur, stock, is_active, is_featured, images, \
     category_id, created_at, updated_at";

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products matching `filter`, newest first, plus the total
    /// number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"
        ));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok((items, total))
    }

    /// Active featured products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let items = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = TRUE AND is_featured = TRUE \
             ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug or SKU is taken or the
    /// category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO products (
                name, slug, description, sku, price_usd, price_pln, price_eur,
                stock, is_active, is_featured, images, category_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(&new.slug)
        .bind(new.description.as_deref())
        .bind(new.sku.as_deref())
        .bind(new.price_usd)
        .bind(new.price_pln)
        .bind(new.price_eur)
        .bind(new.stock)
        .bind(new.is_active)
        .bind(new.is_featured)
        .bind(&new.images)
        .bind(new.category_id)
        .fetch_one(self.pool)
        .await
        .map_err(product_write_error)
    }

    /// Apply changes to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` on slug, SKU or category conflicts.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE products SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                sku = COALESCE($5, sku),
                price_usd = COALESCE($6, price_usd),
                price_pln = COALESCE($7, price_pln),
                price_eur = COALESCE($8, price_eur),
                stock = COALESCE($9, stock),
                is_active = COALESCE($10, is_active),
                is_featured = COALESCE($11, is_featured),
                images = COALESCE($12, images),
                category_id = COALESCE($13, category_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.slug.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.sku.as_deref())
        .bind(changes.price_usd)
        .bind(changes.price_pln)
        .bind(changes.price_eur)
        .bind(changes.stock)
        .bind(changes.is_active)
        .bind(changes.is_featured)
        .bind(changes.images.as_deref())
        .bind(changes.category_id)
        .fetch_optional(self.pool)
        .await
        .map_err(product_write_error)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if orders reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_constraint(
                    e,
                    "Product is referenced by existing orders; deactivate it instead",
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Append `AND ...` clauses for each set filter.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(is_featured) = filter.is_featured {
        qb.push(" AND is_featured = ").push_bind(is_featured);
    }
    if let Some(min_price) = filter.min_price {
        qb.push(" AND price_usd >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        qb.push(" AND price_usd <= ").push_bind(max_price);
    }
    match filter.in_stock {
        Some(true) => {
            qb.push(" AND stock > 0");
        }
        Some(false) => {
            qb.push(" AND stock = 0");
        }
        None => {}
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// `%term%` with `LIKE` metacharacters in `term` escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn product_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            let message = if db_err.constraint().is_some_and(|c| c.contains("sku")) {
                "Product with this SKU already exists"
            } else {
                "Product with this slug already exists"
            };
            return RepositoryError::Conflict(message.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Conflict("Category not found".to_owned());
        }
    }
    RepositoryError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("mug"), "%mug%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_filters_render_in_order() {
        let filter = ProductFilter {
            category_id: Some(emporium_core::CategoryId::new(2)),
            is_active: Some(true),
            in_stock: Some(true),
            search: Some("tea".to_owned()),
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM products WHERE TRUE");
        push_filters(&mut qb, &filter);

        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM products WHERE TRUE AND category_id = $1 AND is_active = $2 \
             AND stock > 0 AND (name ILIKE $3 OR description ILIKE $4)"
        );
    }

    #[test]
    fn test_empty_search_is_ignored() {
        let filter = ProductFilter {
            search: Some(String::new()),
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM products WHERE TRUE");
        push_filters(&mut qb, &filter);
        assert_eq!(qb.sql(), "SELECT 1 FROM products WHERE TRUE");
    }
}
