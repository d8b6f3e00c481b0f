//! Product payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use emporium_core::{CategoryId, ProductId};

use crate::models::{Product, ProductChanges, ProductFilter};
use crate::services::catalog::MAX_PRODUCT_IMAGES;

use super::category::CategoryResponse;
use super::{
    default_page, default_page_size, default_true, validate_positive_price, validate_slug,
};

// =============================================================================
// Queries
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ProductListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    pub category_id: Option<CategoryId>,
    #[serde(default = "default_true")]
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

impl ProductListQuery {
    #[must_use]
    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            category_id: self.category_id,
            is_active: self.is_active,
            is_featured: self.is_featured,
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock: self.in_stock,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct FeaturedQuery {
    #[serde(default = "default_featured_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: i64,
}

const fn default_featured_limit() -> i64 {
    10
}

// =============================================================================
// Bodies
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ProductCreate {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    #[validate(custom(function = "validate_positive_price"))]
    pub price_usd: Decimal,
    #[validate(custom(function = "validate_positive_price"))]
    pub price_pln: Decimal,
    #[validate(custom(function = "validate_positive_price"))]
    pub price_eur: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default = "yes")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    #[validate(length(max = MAX_PRODUCT_IMAGES))]
    pub images: Vec<String>,
    pub category_id: Option<CategoryId>,
}

const fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255), custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    #[validate(custom(function = "validate_positive_price"))]
    pub price_usd: Option<Decimal>,
    #[validate(custom(function = "validate_positive_price"))]
    pub price_pln: Option<Decimal>,
    #[validate(custom(function = "validate_positive_price"))]
    pub price_eur: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    #[validate(length(max = MAX_PRODUCT_IMAGES))]
    pub images: Option<Vec<String>>,
    pub category_id: Option<CategoryId>,
}

impl ProductUpdate {
    /// Convert into repository changes with already resolved image URLs.
    #[must_use]
    pub fn into_changes(self, images: Option<Vec<String>>) -> ProductChanges {
        ProductChanges {
            name: self.name,
            slug: self.slug,
            description: self.description,
            sku: self.sku,
            price_usd: self.price_usd,
            price_pln: self.price_pln,
            price_eur: self.price_eur,
            stock: self.stock,
            is_active: self.is_active,
            is_featured: self.is_featured,
            images,
            category_id: self.category_id,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price_usd: Decimal,
    pub price_pln: Decimal,
    pub price_eur: Decimal,
    pub stock: i32,
    pub in_stock: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub images: Vec<String>,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            in_stock: p.in_stock(),
            id: p.id,
            name: p.name,
            slug: p.slug,
            description: p.description,
            sku: p.sku,
            price_usd: p.price_usd,
            price_pln: p.price_pln,
            price_eur: p.price_eur,
            stock: p.stock,
            is_active: p.is_active,
            is_featured: p.is_featured,
            images: p.images,
            category_id: p.category_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Single product lookup, with its category expanded.
#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub category: Option<CategoryResponse>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::fixtures::product;

    #[test]
    fn test_list_query_defaults() {
        let q: ProductListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 20);
        assert_eq!(q.is_active, Some(true));
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_list_query_page_size_bounds() {
        let q: ProductListQuery = serde_json::from_str(r#"{"page_size":101}"#).unwrap();
        assert!(q.validate().is_err());
        let q: ProductListQuery = serde_json::from_str(r#"{"page":0}"#).unwrap();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let q: ProductListQuery = serde_json::from_str(r#"{"search":"   "}"#).unwrap();
        assert!(q.filter().search.is_none());
        let q: ProductListQuery = serde_json::from_str(r#"{"search":" mug "}"#).unwrap();
        assert_eq!(q.filter().search.as_deref(), Some("mug"));
    }

    #[test]
    fn test_create_limits_images_and_prices() {
        let images: Vec<String> = (0..11).map(|i| format!("products/{i}.jpg")).collect();
        let body = serde_json::json!({
            "name": "Mug",
            "slug": "mug",
            "price_usd": "0",
            "price_pln": "40.00",
            "price_eur": "9.00",
            "images": images,
        });
        let req: ProductCreate = serde_json::from_value(body).unwrap();
        let fields = req.validate().unwrap_err();
        let fields = fields.field_errors();
        assert!(fields.contains_key("images"));
        assert!(fields.contains_key("price_usd"));
        assert!(!fields.contains_key("price_pln"));
    }

    #[test]
    fn test_response_reports_stock() {
        let json = serde_json::to_value(ProductResponse::from(product(1, Decimal::ONE, 0))).unwrap();
        assert_eq!(json["in_stock"], false);
        assert_eq!(json["stock"], 0);
    }
}
