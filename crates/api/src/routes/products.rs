//! Product routes. Reads are public; writes require an admin.

use std::borrow::Cow;

use axum::{Json, extract::State, http::StatusCode};
use validator::{ValidationError, ValidationErrors};

use emporium_core::{Pagination, ProductId};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product};
use crate::schemas::product::{
    FeaturedQuery, ProductCreate, ProductDetailResponse, ProductListQuery, ProductResponse,
    ProductUpdate,
};
use crate::schemas::{ApiPath, ListResponse, ValidatedJson, ValidatedQuery};
use crate::services::catalog::resolve_images;
use crate::state::AppState;

use super::not_found;

const PRODUCT_NOT_FOUND: &str = "Product not found";
const MAX_PAGE_SIZE: u32 = 100;

/// GET /api/v1/products
///
/// # Errors
///
/// 422 for out-of-range paging or an over-long search term.
pub async fn list(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ProductListQuery>,
) -> Result<Json<ListResponse<ProductResponse>>> {
    let page = Pagination::new(query.page, query.page_size, MAX_PAGE_SIZE);
    let (items, total) = ProductRepository::new(state.pool())
        .list(&query.filter(), page)
        .await?;

    Ok(Json(ListResponse::new(
        items.into_iter().map(Into::into).collect(),
        total,
        page,
    )))
}

/// GET /api/v1/products/featured
///
/// # Errors
///
/// 422 for a `limit` outside 1..=50.
pub async fn featured(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<FeaturedQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let items = ProductRepository::new(state.pool())
        .featured(query.limit)
        .await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/products/{id}
///
/// # Errors
///
/// 404 if the product does not exist.
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductDetailResponse>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()))?;
    Ok(Json(with_category(&state, product).await?))
}

/// GET /api/v1/products/slug/{slug}
///
/// # Errors
///
/// 404 if no product has this slug.
pub async fn get_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<ProductDetailResponse>> {
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()))?;
    Ok(Json(with_category(&state, product).await?))
}

/// POST /api/v1/products
///
/// # Errors
///
/// 400 on slug, SKU or category conflicts; 422 for invalid input or image
/// keys that cannot be resolved.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(req): ValidatedJson<ProductCreate>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let images = images_for(&state, &req.images)?;
    let new = NewProduct {
        name: req.name,
        slug: req.slug,
        description: req.description,
        sku: req.sku,
        price_usd: req.price_usd,
        price_pln: req.price_pln,
        price_eur: req.price_eur,
        stock: req.stock,
        is_active: req.is_active,
        is_featured: req.is_featured,
        images,
        category_id: req.category_id,
    };

    let product = ProductRepository::new(state.pool()).create(&new).await?;

    tracing::info!(admin_id = %admin.id, product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /api/v1/products/{id}
///
/// # Errors
///
/// 404 if the product does not exist; otherwise as for create.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ValidatedJson(req): ValidatedJson<ProductUpdate>,
) -> Result<Json<ProductResponse>> {
    let images = req
        .images
        .as_deref()
        .map(|entries| images_for(&state, entries))
        .transpose()?;

    let product = ProductRepository::new(state.pool())
        .update(id, &req.into_changes(images))
        .await
        .map_err(not_found(PRODUCT_NOT_FOUND))?;

    tracing::info!(admin_id = %admin.id, product_id = %id, "Product updated");
    Ok(Json(product.into()))
}

/// DELETE /api/v1/products/{id}
///
/// # Errors
///
/// 404 if the product does not exist, 400 if orders reference it.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found(PRODUCT_NOT_FOUND))?;

    tracing::info!(admin_id = %admin.id, product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn with_category(state: &AppState, product: Product) -> Result<ProductDetailResponse> {
    let category = match product.category_id {
        Some(id) => CategoryRepository::new(state.pool()).get_by_id(id).await?,
        None => None,
    };

    Ok(ProductDetailResponse {
        product: product.into(),
        category: category.map(Into::into),
    })
}

fn images_for(state: &AppState, entries: &[String]) -> Result<Vec<String>> {
    resolve_images(entries, state.config().storage.as_ref()).map_err(|message| {
        let mut errors = ValidationErrors::new();
        errors.add(
            "images",
            ValidationError::new("image").with_message(Cow::Owned(message)),
        );
        AppError::Validation(errors)
    })
}
