//! Category routes. Reads are public; writes require an admin.

use axum::{Json, extract::State, http::StatusCode};

use emporium_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{CategoryChanges, NewCategory};
use crate::schemas::category::{
    CategoryCreate, CategoryListQuery, CategoryResponse, CategoryUpdate,
};
use crate::schemas::{ApiPath, ValidatedJson, ValidatedQuery};
use crate::state::AppState;

use super::not_found;

const CATEGORY_NOT_FOUND: &str = "Category not found";

/// GET /api/v1/categories
///
/// # Errors
///
/// 422 for an out-of-range `limit`.
pub async fn list(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<CategoryListQuery>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let rows = CategoryRepository::new(state.pool())
        .list(query.skip.max(0), query.limit, query.is_active)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/categories/{id}
///
/// # Errors
///
/// 404 if the category does not exist.
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<CategoryResponse>> {
    CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(|c| Json(c.into()))
        .ok_or_else(|| AppError::NotFound(CATEGORY_NOT_FOUND.to_owned()))
}

/// GET /api/v1/categories/slug/{slug}
///
/// # Errors
///
/// 404 if no category has this slug.
pub async fn get_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<CategoryResponse>> {
    CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .map(|c| Json(c.into()))
        .ok_or_else(|| AppError::NotFound(CATEGORY_NOT_FOUND.to_owned()))
}

/// POST /api/v1/categories
///
/// # Errors
///
/// 400 if the slug is taken.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(req): ValidatedJson<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let category = CategoryRepository::new(state.pool())
        .create(&NewCategory::from(req))
        .await?;

    tracing::info!(admin_id = %admin.id, category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// PUT /api/v1/categories/{id}
///
/// # Errors
///
/// 404 if the category does not exist, 400 if the new slug is taken.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
    ValidatedJson(req): ValidatedJson<CategoryUpdate>,
) -> Result<Json<CategoryResponse>> {
    let category = CategoryRepository::new(state.pool())
        .update(id, &CategoryChanges::from(req))
        .await
        .map_err(not_found(CATEGORY_NOT_FOUND))?;

    tracing::info!(admin_id = %admin.id, category_id = %id, "Category updated");
    Ok(Json(category.into()))
}

/// DELETE /api/v1/categories/{id}
///
/// # Errors
///
/// 404 if the category does not exist, 400 while products still use it.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found(CATEGORY_NOT_FOUND))?;

    tracing::info!(admin_id = %admin.id, category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
