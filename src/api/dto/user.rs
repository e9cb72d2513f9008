//! User-related DTOs for API requests and responses.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{UpdateUser, User};
use crate::services::{ProfileUpdate, PublicProfile, Registration, Session};

// ============================================================================
// Request DTOs
// ============================================================================

/// Request body for registering an account.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    #[schema(format = "email")]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    #[schema(format = "password")]
    pub password: String,
}

impl RegisterRequest {
    pub fn into_registration(self) -> Registration {
        Registration {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
        }
    }
}

/// Request body for signing in.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[schema(format = "email")]
    pub email: String,
    #[schema(format = "password")]
    pub password: String,
}

/// Self-service profile edit. Omitted or empty fields keep their value.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email(message = "Invalid email format"))]
    #[schema(format = "email")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    #[schema(format = "password")]
    pub password: Option<String>,
    /// Must repeat `password` exactly when a new password is given
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(format = "password")]
    pub confirm_password: Option<String>,
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

impl UpdateProfileRequest {
    pub fn into_profile_update(self) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            confirm_password: self.confirm_password,
        }
    }
}

/// Administrative edit of another account; the password is not editable here.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    #[schema(format = "email")]
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

impl AdminUpdateUserRequest {
    pub fn into_update_user(self) -> UpdateUser {
        UpdateUser {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: None,
            is_admin: self.is_admin,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Response body for user data (never includes the password hash).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<PublicProfile> for UserResponse {
    fn from(profile: PublicProfile) -> Self {
        Self {
            id: profile.id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            is_admin: profile.is_admin,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        PublicProfile::from(&user).into()
    }
}

/// Profile plus a fresh token pair, returned by register, login, profile update and refresh.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            user: session.profile.into(),
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: session.tokens.expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_profile_fields_are_absent() {
        let request: UpdateProfileRequest = serde_json::from_str(
            r#"{"firstName": "Grace", "lastName": "  ", "email": "", "password": ""}"#,
        )
        .unwrap();

        assert!(request.validate().is_ok());
        let update = request.into_profile_update();
        assert_eq!(update.first_name.as_deref(), Some("Grace"));
        assert!(update.last_name.is_none());
        assert!(update.email.is_none());
        assert!(update.password.is_none());
        assert!(update.confirm_password.is_none());
    }

    #[test]
    fn test_short_profile_password_is_rejected() {
        let request: UpdateProfileRequest =
            serde_json::from_str(r#"{"password": "abc", "confirmPassword": "abc"}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
