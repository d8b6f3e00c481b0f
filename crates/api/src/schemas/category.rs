//! Category payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use emporium_core::CategoryId;

use crate::models::{Category, CategoryChanges, CategoryWithCount, NewCategory};

use super::{default_true, validate_slug};

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default = "default_true")]
    pub is_active: Option<bool>,
}

const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryCreate {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default = "yes")]
    pub is_active: bool,
}

const fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl From<CategoryCreate> for NewCategory {
    fn from(req: CategoryCreate) -> Self {
        Self {
            name: req.name,
            slug: req.slug,
            description: req.description,
            is_active: req.is_active,
        }
    }
}

impl From<CategoryUpdate> for CategoryChanges {
    fn from(req: CategoryUpdate) -> Self {
        Self {
            name: req.name,
            slug: req.slug,
            description: req.description,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Active products in the category; only present on listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_count: Option<i64>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
            product_count: None,
        }
    }
}

impl From<CategoryWithCount> for CategoryResponse {
    fn from(row: CategoryWithCount) -> Self {
        Self {
            product_count: Some(row.product_count),
            ..Self::from(row.category)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let q: CategoryListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.skip, 0);
        assert_eq!(q.limit, 100);
        assert_eq!(q.is_active, Some(true));
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_list_query_limit_bounds() {
        let q: CategoryListQuery = serde_json::from_str(r#"{"limit":101}"#).unwrap();
        assert!(q.validate().is_err());
        let q: CategoryListQuery = serde_json::from_str(r#"{"limit":0}"#).unwrap();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_create_rejects_bad_slug() {
        let req: CategoryCreate =
            serde_json::from_str(r#"{"name":"Mugs","slug":"Big Mugs"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("slug"));
    }
}
