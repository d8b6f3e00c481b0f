//! Order routes. Every route requires a bearer token; updates require an
//! admin.

use axum::{Json, extract::State, http::StatusCode};

use emporium_core::{OrderId, Pagination};

use crate::error::Result;
use crate::middleware::{AuthUser, RequireAdmin};
use crate::schemas::order::{OrderCreate, OrderListQuery, OrderResponse, OrderUpdate};
use crate::schemas::{ApiPath, ListResponse, ValidatedJson, ValidatedQuery};
use crate::services::orders::OrderService;
use crate::state::AppState;

const MAX_PAGE_SIZE: u32 = 100;

/// POST /api/v1/orders
///
/// # Errors
///
/// 400 if a product is missing, inactive or short on stock.
pub async fn create(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    ValidatedJson(req): ValidatedJson<OrderCreate>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let order = OrderService::new(&state).place(&user, req.into()).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /api/v1/orders
///
/// Customers see their own orders, admins see everyone's.
///
/// # Errors
///
/// 422 for out-of-range paging.
pub async fn list(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    ValidatedQuery(query): ValidatedQuery<OrderListQuery>,
) -> Result<Json<ListResponse<OrderResponse>>> {
    let page = Pagination::new(query.page, query.page_size, MAX_PAGE_SIZE);
    let (orders, total) = OrderService::new(&state)
        .list(&user, query.status, page)
        .await?;

    Ok(Json(ListResponse::new(
        orders.into_iter().map(Into::into).collect(),
        total,
        page,
    )))
}

/// GET /api/v1/orders/{id}
///
/// # Errors
///
/// 404 unless the order belongs to the caller or the caller is an admin.
pub async fn get(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(&state).get(&user, id).await?;
    Ok(Json(order.into()))
}

/// PUT /api/v1/orders/{id}
///
/// # Errors
///
/// 400 for a disallowed status change or a payment method that is not
/// enabled, 404 if the order does not exist.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ValidatedJson(req): ValidatedJson<OrderUpdate>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(&state).update(id, &req.into()).await?;
    tracing::debug!(admin_id = %admin.id, order_id = %id, "Admin order update applied");
    Ok(Json(order.into()))
}

/// DELETE /api/v1/orders/{id}
///
/// Cancels the order and puts its stock back.
///
/// # Errors
///
/// 404 unless the caller may see the order, 400 if it can no longer be
/// cancelled.
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(&state).cancel(&user, id).await?;
    Ok(Json(order.into()))
}
