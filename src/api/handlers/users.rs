//! Account request handlers.
//!
//! Registration and sign-in are public, profile routes need a signed-in
//! user, and the remaining routes are for administrators.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::USER_TAG;
use crate::api::dto::{
    AdminUpdateUserRequest, AuthResponse, ErrorResponse, LoginRequest, MessageResponse,
    RegisterRequest, UpdateProfileRequest, UserResponse,
};
use crate::api::messages::{Lang, Message};
use crate::api::middleware::{AdminUser, AuthUser};
use crate::error::AppResult;
use crate::services::CrudService;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Creates the account routes
///
/// # Routes
/// - `POST /` - Register a new account
/// - `GET /` - List accounts (admin)
/// - `POST /login` - Sign in
/// - `GET|PUT /profile` - Read or edit the caller's own profile
/// - `GET|PUT|DELETE /{id}` - Manage any account (admin)
pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register, list_users))
        .routes(routes!(login))
        .routes(routes!(get_profile, update_profile))
        .routes(routes!(get_user, update_user, delete_user))
}

/// POST /api/users - Register a new account
///
/// Signs the new user in straight away.
#[utoipa::path(
    post,
    path = "/",
    tag = USER_TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let session = state.services.users.register(payload.into_registration()).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/users/login - Sign in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = USER_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let session = state
        .services
        .users
        .authenticate(&payload.email, &payload.password)
        .await?;
    Ok(Json(session.into()))
}

/// GET /api/users - List every account
#[utoipa::path(
    get,
    path = "/",
    tag = USER_TAG,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "All accounts", body = Vec<UserResponse>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    )
)]
async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.services.users.list_all().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/profile - The caller's own profile
#[utoipa::path(
    get,
    path = "/profile",
    tag = USER_TAG,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    )
)]
async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let profile = state.services.users.get_profile(user.user_id).await?;
    Ok(Json(profile.into()))
}

/// PUT /api/users/profile - Edit the caller's own profile
///
/// Returns fresh tokens since the email claim may have changed.
#[utoipa::path(
    put,
    path = "/profile",
    tag = USER_TAG,
    security(("bearerAuth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AuthResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Password confirmation does not match", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<AuthResponse>> {
    let session = state
        .services
        .users
        .update_profile(user.user_id, payload.into_profile_update())
        .await?;
    Ok(Json(session.into()))
}

/// GET /api/users/{id} - Any account by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = USER_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "No such account", body = ErrorResponse)
    )
)]
async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.get(id).await?;
    Ok(Json(user.into()))
}

/// PUT /api/users/{id} - Edit any account
#[utoipa::path(
    put,
    path = "/{id}",
    tag = USER_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "User id")),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "No such account", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<AdminUpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .services
        .users
        .update(id, payload.into_update_user())
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /api/users/{id} - Remove an account
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = USER_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Account removed", body = MessageResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "No such account", body = ErrorResponse),
        (status = 409, description = "Account still owns orders or products", body = ErrorResponse)
    )
)]
async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    lang: Lang,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.users.delete(id).await?;
    tracing::info!(user_id = id, admin_id = admin.user_id, "Account removed by admin");
    Ok(Json(MessageResponse::new(Message::UserDeleted.text(lang))))
}
