//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use emporium_core::{CategoryId, Currency, ProductId};

/// A catalog product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price_usd: Decimal,
    pub price_pln: Decimal,
    pub price_eur: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    /// Public image URLs.
    pub images: Vec<String>,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Unit price in `currency`.
    #[must_use]
    pub const fn price_in(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => self.price_usd,
            Currency::Pln => self.price_pln,
            Currency::Eur => self.price_eur,
        }
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Fields for a new product. Images are already resolved to URLs.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price_usd: Decimal,
    pub price_pln: Decimal,
    pub price_eur: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub images: Vec<String>,
    pub category_id: Option<CategoryId>,
}

/// Partial product update; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price_usd: Option<Decimal>,
    pub price_pln: Option<Decimal>,
    pub price_eur: Option<Decimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub images: Option<Vec<String>>,
    pub category_id: Option<CategoryId>,
}

/// Catalog listing filters.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    /// `None` lists both active and inactive products.
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    /// Bounds on `price_usd`.
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::product;
    use super::*;

    #[test]
    fn test_price_in_currency() {
        let p = product(1, Decimal::new(1000, 2), 3);
        assert_eq!(p.price_in(Currency::Usd), Decimal::new(1000, 2));
        assert_eq!(p.price_in(Currency::Pln), Decimal::new(4000, 2));
        assert_eq!(p.price_in(Currency::Eur), Decimal::new(900, 2));
    }

    #[test]
    fn test_in_stock() {
        assert!(product(1, Decimal::ONE, 1).in_stock());
        assert!(!product(1, Decimal::ONE, 0).in_stock());
    }
}
