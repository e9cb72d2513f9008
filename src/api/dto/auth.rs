//! Token refresh DTOs.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Request body for exchanging a refresh token.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}
