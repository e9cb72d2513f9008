//! Bearer-token authentication.
//!
//! [`auth_middleware`] runs on every request. A request without an
//! `Authorization` header passes through anonymously; a request with a bad
//! or expired token is rejected with 401. Handlers state their requirement
//! through the [`AuthUser`] and [`AdminUser`] extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::api::messages::{Lang, Message};
use crate::error::{AppError, AppResult};
use crate::services::Actor;
use crate::state::AppState;
use crate::utils::jwt::{Claims, TokenType};

/// Identity taken from a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            is_admin: self.is_admin,
        }
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> AppResult<Self> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email,
            is_admin: claims.is_admin,
        })
    }
}

/// Reads the bearer token, if any.
///
/// # Errors
/// Unauthorized when the header is present but is not a `Bearer` credential.
fn bearer_token(request: &Request) -> AppResult<Option<&str>> {
    let Some(value) = request.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| Some(token.trim()))
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid authorization header format. Expected: Bearer <token>".to_string(),
        })
}

/// Validates an optional access token and stores the caller in extensions.
///
/// # Example
/// ```ignore
/// Router::new()
///     .route("/protected", get(handler))
///     .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
/// ```
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(&request)? {
        let claims = state.jwt.validate(token, TokenType::Access)?;
        let user = AuthUser::try_from(claims)?;
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized {
                message: Message::NotAuthenticated.text(Lang::En).to_string(),
            })
    }
}

/// An authenticated caller holding the admin flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden {
                message: Message::NotAdmin.text(Lang::En).to_string(),
            });
        }
        Ok(AdminUser(user))
    }
}
