//! Catalog and review request handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use crate::api::doc::PRODUCT_TAG;
use crate::api::dto::{
    CreateProductRequest, ErrorResponse, MessageResponse, ProductPageResponse, ProductResponse,
    ProductSearchParams, ReviewRequest, UpdateProductRequest,
};
use crate::api::messages::{Lang, Message};
use crate::api::middleware::{AdminUser, AuthUser};
use crate::error::AppResult;
use crate::services::{CrudService, ReviewAuthor};
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Creates the catalog routes
///
/// # Routes
/// - `GET /` - Search with paging
/// - `POST /` - Create a product (admin)
/// - `GET /top` - Best rated products
/// - `GET|PUT|DELETE /{id}` - Read, edit (admin) or remove (admin) a product
/// - `POST /{id}/reviews` - Review a product
/// - `DELETE /{id}/reviews/{review_id}` - Withdraw one's own review
pub fn product_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(search_products, create_product))
        .routes(routes!(top_products))
        .routes(routes!(get_product, update_product, delete_product))
        .routes(routes!(add_review))
        .routes(routes!(remove_review))
}

/// GET /api/products - Search the catalog
///
/// Unusable paging values fall back to the first page and the default size.
#[utoipa::path(
    get,
    path = "/",
    tag = PRODUCT_TAG,
    params(ProductSearchParams),
    responses(
        (status = 200, description = "One page of matching products", body = ProductPageResponse)
    )
)]
async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<ProductSearchParams>,
) -> AppResult<Json<ProductPageResponse>> {
    let page = state
        .services
        .products
        .search(
            params.page_number.as_deref(),
            params.page_size.as_deref(),
            params.filter(),
        )
        .await?;
    Ok(Json(page.into()))
}

/// GET /api/products/top - Best rated products
#[utoipa::path(
    get,
    path = "/top",
    tag = PRODUCT_TAG,
    responses(
        (status = 200, description = "Highest rated first", body = Vec<ProductResponse>)
    )
)]
async fn top_products(State(state): State<AppState>) -> AppResult<Json<Vec<ProductResponse>>> {
    let products = state.services.products.top_rated().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with its reviews", body = ProductResponse),
        (status = 404, description = "No such product", body = ErrorResponse)
    )
)]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ProductResponse>> {
    let product = state.services.products.get(id).await?;
    Ok(Json(product.into()))
}

/// POST /api/products - Create a product owned by the calling admin
#[utoipa::path(
    post,
    path = "/",
    tag = PRODUCT_TAG,
    security(("bearerAuth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    )
)]
async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    let product = state
        .services
        .products
        .create(payload.into_new_product(admin.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /api/products/{id} - Edit catalog fields
///
/// Reviews and the rating are not editable through this route.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = PRODUCT_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "No such product", body = ErrorResponse)
    )
)]
async fn update_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<ProductResponse>> {
    let product = state
        .services
        .products
        .update(id, payload.into_update_product())
        .await?;
    Ok(Json(product.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = PRODUCT_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product removed", body = MessageResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "No such product", body = ErrorResponse)
    )
)]
async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    lang: Lang,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.products.delete(id).await?;
    Ok(Json(MessageResponse::new(Message::ProductDeleted.text(lang))))
}

/// POST /api/products/{id}/reviews - Review a product
///
/// One review per user and product; the author name is taken from the account.
#[utoipa::path(
    post,
    path = "/{id}/reviews",
    tag = PRODUCT_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Product id")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review added", body = MessageResponse),
        (status = 400, description = "Rating outside 1..=5", body = ErrorResponse),
        (status = 404, description = "No such product", body = ErrorResponse),
        (status = 409, description = "Already reviewed by this user", body = ErrorResponse)
    )
)]
async fn add_review(
    State(state): State<AppState>,
    user: AuthUser,
    lang: Lang,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let profile = state.services.users.get_profile(user.user_id).await?;
    let author = ReviewAuthor {
        user_id: profile.id,
        name: format!("{} {}", profile.first_name, profile.last_name)
            .trim()
            .to_string(),
    };

    state
        .services
        .products
        .add_review(id, author, payload.rating, payload.comment)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(Message::ReviewAdded.text(lang))),
    ))
}

/// DELETE /api/products/{id}/reviews/{review_id} - Withdraw a review
///
/// Only the review's author may remove it.
#[utoipa::path(
    delete,
    path = "/{id}/reviews/{review_id}",
    tag = PRODUCT_TAG,
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Product id"),
        ("review_id" = String, Path, format = Uuid, description = "Review id")
    ),
    responses(
        (status = 200, description = "Review removed", body = MessageResponse),
        (status = 403, description = "Not the author of this review", body = ErrorResponse),
        (status = 404, description = "No such product or review", body = ErrorResponse)
    )
)]
async fn remove_review(
    State(state): State<AppState>,
    user: AuthUser,
    lang: Lang,
    Path((id, review_id)): Path<(i32, Uuid)>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .products
        .remove_review(id, review_id, user.user_id)
        .await?;
    Ok(Json(MessageResponse::new(Message::ReviewDeleted.text(lang))))
}
