//! Checkout and fulfillment request handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::ORDER_TAG;
use crate::api::dto::{CreateOrderRequest, ErrorResponse, OrderResponse, PaymentRequest};
use crate::api::middleware::{AdminUser, AuthUser};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Creates the order routes
///
/// # Routes
/// - `POST /` - Place an order
/// - `GET /` - List every order (admin)
/// - `GET /mine` - The caller's orders
/// - `GET /{id}` - One order (owner or admin)
/// - `PUT /{id}/pay` - Record a payment (owner or admin)
/// - `PUT /{id}/deliver` - Mark as delivered (admin)
pub fn order_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(place_order, list_orders))
        .routes(routes!(my_orders))
        .routes(routes!(get_order))
        .routes(routes!(pay_order))
        .routes(routes!(deliver_order))
}

/// POST /api/orders - Place an order
///
/// Prices are computed server side from the line items.
#[utoipa::path(
    post,
    path = "/",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Empty cart or invalid fields", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    let items = payload.order_items.into_iter().map(Into::into).collect();
    let order = state
        .services
        .orders
        .place_order(
            user.user_id,
            items,
            payload.shipping_address.into(),
            payload.payment_method,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

#[utoipa::path(
    get,
    path = "/",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Every order", body = Vec<OrderResponse>),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    )
)]
async fn list_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<OrderResponse>>> {
    let orders = state.services.orders.list_all().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/mine",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "The caller's orders", body = Vec<OrderResponse>),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<OrderResponse>>> {
    let orders = state.services.orders.list_by_owner(user.user_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 403, description = "Someone else's order", body = ErrorResponse),
        (status = 404, description = "No such order", body = ErrorResponse)
    )
)]
async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<OrderResponse>> {
    let order = state.services.orders.get_for(id, user.actor()).await?;
    Ok(Json(order.into()))
}

/// PUT /api/orders/{id}/pay - Record the payment provider's confirmation
#[utoipa::path(
    put,
    path = "/{id}/pay",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Order id")),
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Order marked as paid", body = OrderResponse),
        (status = 403, description = "Someone else's order", body = ErrorResponse),
        (status = 404, description = "No such order", body = ErrorResponse)
    )
)]
async fn pay_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<PaymentRequest>,
) -> AppResult<Json<OrderResponse>> {
    let order = state
        .services
        .orders
        .mark_paid(id, payload.into(), user.actor())
        .await?;
    Ok(Json(order.into()))
}

#[utoipa::path(
    put,
    path = "/{id}/deliver",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order marked as delivered", body = OrderResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "No such order", body = ErrorResponse)
    )
)]
async fn deliver_order(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> AppResult<Json<OrderResponse>> {
    let order = state.services.orders.mark_delivered(id).await?;
    Ok(Json(order.into()))
}
