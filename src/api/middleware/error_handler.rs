//! Error handler for converting AppError to HTTP responses.
//!
//! `IntoResponse for AppError` picks the status code and an English body.
//! [`error_envelope_middleware`] then finishes every error response on its
//! way out: it attaches the request id, localizes the message and wraps
//! framework rejections (plain-text bodies) in the same JSON shape.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::api::messages::{Lang, Message};
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// # Status Code Mapping
    /// - NotFound → 404 NOT_FOUND
    /// - Conflict → 409 CONFLICT
    /// - InvalidInput → 400 BAD_REQUEST
    /// - Unauthorized → 401 UNAUTHORIZED
    /// - Forbidden → 403 FORBIDDEN
    /// - Persistence → 500 INTERNAL_SERVER_ERROR
    /// - Configuration → 500 INTERNAL_SERVER_ERROR
    /// - ConnectionPool → 503 SERVICE_UNAVAILABLE
    /// - Internal → 500 INTERNAL_SERVER_ERROR
    ///
    /// Server-side failures are logged here and their causes never reach the body.
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        let body = match &self {
            AppError::NotFound {
                entity,
                field,
                value,
            } => ErrorResponse::new(error_to_code(&self), &format!("{} not found", capitalize(entity)))
                .with_details(json!({ "entity": entity, "field": field, "value": value })),
            AppError::Conflict { entity, reason } => {
                ErrorResponse::new(error_to_code(&self), &format!("{} {}", capitalize(entity), reason))
            }
            AppError::InvalidInput { errors } => {
                ErrorResponse::new(error_to_code(&self), Message::InvalidRequest.text(Lang::En))
                    .with_details(json!({ "errors": errors }))
            }
            AppError::Unauthorized { message } | AppError::Forbidden { message } => {
                ErrorResponse::new(error_to_code(&self), message)
            }
            AppError::Configuration { key, .. } => {
                ErrorResponse::new(error_to_code(&self), Message::Default.text(Lang::En))
                    .with_details(json!({ "key": key }))
            }
            AppError::ConnectionPool { .. } => {
                ErrorResponse::new(error_to_code(&self), Message::Unavailable.text(Lang::En))
            }
            AppError::Persistence { .. } | AppError::Internal { .. } => {
                ErrorResponse::new(error_to_code(&self), Message::Default.text(Lang::En))
            }
        };

        let key = error_message_key(&self);
        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response.extensions_mut().insert(key);
        response
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Conflict { .. } => StatusCode::CONFLICT,
        AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AppError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Conflict { .. } => "CONFLICT",
        AppError::InvalidInput { .. } => "VALIDATION_ERROR",
        AppError::Unauthorized { .. } => "UNAUTHORIZED",
        AppError::Forbidden { .. } => "FORBIDDEN",
        AppError::Persistence { .. } => "DATABASE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Catalog entry used when the client asks for a non-default language.
pub fn error_message_key(error: &AppError) -> Message {
    match error {
        AppError::NotFound { .. } => Message::NotFound,
        AppError::Conflict { entity, reason } => match (entity.as_str(), reason.as_str()) {
            ("user", "email already exists") => Message::EmailTaken,
            ("user", "has orders" | "has products") => Message::UserHasRecords,
            ("product", "already reviewed") => Message::AlreadyReviewed,
            _ => Message::Conflict,
        },
        AppError::InvalidInput { .. } => Message::InvalidRequest,
        AppError::Unauthorized { message } if message == Message::NotAuthenticated.text(Lang::En) => {
            Message::NotAuthenticated
        }
        AppError::Unauthorized { .. } => Message::InvalidCredentials,
        AppError::Forbidden { message } if message == Message::NotAdmin.text(Lang::En) => {
            Message::NotAdmin
        }
        AppError::Forbidden { .. } => Message::Forbidden,
        AppError::ConnectionPool { .. } => Message::Unavailable,
        AppError::Persistence { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            Message::Default
        }
    }
}

fn status_code_name(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_CONTENT",
        s if s.is_server_error() => "INTERNAL_SERVER_ERROR",
        _ => "UNKNOWN_ERROR",
    }
}

/// Finishes error responses: request id, localized message, uniform JSON body.
pub async fn error_envelope_middleware(request: Request, next: Next) -> Response {
    let lang = Lang::from_headers(request.headers());
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());

    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let mut body = match response.extensions().get::<ErrorResponse>().cloned() {
        Some(mut body) => {
            if lang != Lang::En {
                if let Some(key) = response.extensions().get::<Message>() {
                    body.message = key.text(lang).to_string();
                }
            }
            body
        }
        None => {
            let is_json = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("application/json"));
            if is_json {
                return response;
            }
            let (_parts, raw) = response.into_parts();
            let bytes = axum::body::to_bytes(raw, 64 * 1024).await.unwrap_or_default();
            let original = String::from_utf8_lossy(&bytes).trim().to_string();
            let message = match status {
                StatusCode::NOT_FOUND if original.is_empty() => Message::NotFound.text(lang).to_string(),
                s if s.is_server_error() || original.is_empty() => Message::Default.text(lang).to_string(),
                _ => original,
            };
            ErrorResponse::new(status_code_name(status), &message)
        }
    };

    if let Some(id) = request_id {
        body = body.with_request_id(&id);
    }
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::not_found("product", "id", 1), StatusCode::NOT_FOUND),
            (
                AppError::Conflict {
                    entity: "user".into(),
                    reason: "email already exists".into(),
                },
                StatusCode::CONFLICT,
            ),
            (AppError::invalid_input("name", "is required"), StatusCode::BAD_REQUEST),
            (
                AppError::Unauthorized {
                    message: "x".into(),
                },
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::Forbidden {
                    message: "x".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::ConnectionPool {
                    source: anyhow::anyhow!("down"),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::persistence("insert", anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error_to_status_code(&error), expected, "{error}");
        }
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = AppError::not_found("product", "id", 7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_of(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Product not found");
        assert_eq!(body["details"]["value"], "7");
    }

    #[tokio::test]
    async fn test_invalid_input_lists_fields() {
        let response = AppError::InvalidInput {
            errors: vec![FieldError {
                field: "rating".into(),
                reason: "Rating must be between 1 and 5".into(),
            }],
        }
        .into_response();

        let body = body_of(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["errors"][0]["field"], "rating");
    }

    #[tokio::test]
    async fn test_internal_causes_are_not_exposed() {
        let response = AppError::persistence("insert", anyhow::anyhow!("password=hunter2")).into_response();
        let body = body_of(response).await;
        assert!(!body.to_string().contains("hunter2"));
        assert_eq!(body["message"], "An error occurred");
    }

    #[test]
    fn test_message_keys() {
        let taken = AppError::Conflict {
            entity: "user".into(),
            reason: "email already exists".into(),
        };
        assert_eq!(error_message_key(&taken), Message::EmailTaken);

        let reviewed = AppError::Conflict {
            entity: "product".into(),
            reason: "already reviewed".into(),
        };
        assert_eq!(error_message_key(&reviewed), Message::AlreadyReviewed);

        let owner = AppError::Conflict {
            entity: "user".into(),
            reason: "has orders".into(),
        };
        assert_eq!(error_message_key(&owner), Message::UserHasRecords);

        let admin = AppError::Forbidden {
            message: Message::NotAdmin.text(Lang::En).into(),
        };
        assert_eq!(error_message_key(&admin), Message::NotAdmin);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("order"), "Order");
        assert_eq!(capitalize(""), "");
    }
}
