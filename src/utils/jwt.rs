//! Access/refresh token issuing and validation (HS256).

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::models::User;

/// Token type enumeration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token for API authentication (short-lived)
    Access,
    /// Refresh token for obtaining a new pair (long-lived)
    Refresh,
}

/// JWT claims carried by both token types
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub is_admin: bool,
    pub token_type: TokenType,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

impl Claims {
    fn for_user(user: &User, token_type: TokenType, expiration_hours: i64) -> Self {
        let now = jiff::Timestamp::now().as_second();
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            token_type,
            iat: now,
            exp: now + expiration_hours * 3600,
        }
    }

    /// Numeric user id from `sub`.
    pub fn user_id(&self) -> AppResult<i32> {
        self.sub.parse().map_err(|_| AppError::Unauthorized {
            message: "Invalid token subject".to_string(),
        })
    }
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Signs and validates tokens with the configured secret and lifetimes.
#[derive(Clone)]
pub struct JwtIssuer {
    secret: String,
    access_hours: i64,
    refresh_hours: i64,
}

impl JwtIssuer {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_hours: config.access_token_expiration,
            refresh_hours: config.refresh_token_expiration,
        }
    }

    /// Issues an access and a refresh token for `user`.
    pub fn issue(&self, user: &User) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(&Claims::for_user(user, TokenType::Access, self.access_hours))?,
            refresh_token: self.sign(&Claims::for_user(
                user,
                TokenType::Refresh,
                self.refresh_hours,
            ))?,
            expires_in: self.access_hours * 3600,
        })
    }

    fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal {
            source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
        })
    }

    /// Validates and decodes a token of the expected type
    ///
    /// # Arguments
    /// * `token` - The JWT token string to validate
    /// * `expected` - The token type the caller accepts
    ///
    /// # Returns
    /// The decoded claims if the token is valid
    pub fn validate(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::Unauthorized {
                message: "Token has expired".to_string(),
            },
            jsonwebtoken::errors::ErrorKind::InvalidSignature => AppError::Unauthorized {
                message: "Invalid token signature".to_string(),
            },
            _ => AppError::Unauthorized {
                message: "Invalid token".to_string(),
            },
        })?;

        if claims.token_type != expected {
            return Err(AppError::Unauthorized {
                message: format!(
                    "Invalid token type: expected {:?}, got {:?}",
                    expected, claims.token_type
                ),
            });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> JwtIssuer {
        JwtIssuer::new(&JwtConfig {
            secret: "test_secret_key_for_jwt_testing".to_string(),
            access_token_expiration: 1,
            refresh_token_expiration: 168,
        })
    }

    fn user() -> User {
        let now = jiff::Timestamp::now().into();
        User {
            id: 42,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "hash".to_string(),
            is_admin: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_token_pair() {
        let pair = issuer().issue(&user()).unwrap();

        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(pair.expires_in, 3600);
    }

    #[test]
    fn test_validate_access_token() {
        let issuer = issuer();
        let pair = issuer.issue(&user()).unwrap();

        let claims = issuer.validate(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.email, "ada@example.com");
        assert!(claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_validate_wrong_token_type() {
        let issuer = issuer();
        let pair = issuer.issue(&user()).unwrap();

        match issuer.validate(&pair.access_token, TokenType::Refresh) {
            Err(AppError::Unauthorized { message }) => {
                assert!(message.contains("Invalid token type"))
            }
            other => panic!("Expected Unauthorized error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_token_invalid_secret() {
        let pair = issuer().issue(&user()).unwrap();
        let other = JwtIssuer::new(&JwtConfig {
            secret: "another_secret".to_string(),
            ..JwtConfig::default()
        });

        match other.validate(&pair.access_token, TokenType::Access) {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("signature")),
            other => panic!("Expected Unauthorized error, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_token() {
        let expired = JwtIssuer::new(&JwtConfig {
            secret: "test_secret_key_for_jwt_testing".to_string(),
            access_token_expiration: -1,
            refresh_token_expiration: -1,
        });
        let pair = expired.issue(&user()).unwrap();

        match expired.validate(&pair.access_token, TokenType::Access) {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("expired")),
            other => panic!("Expected Unauthorized error, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token() {
        let result = issuer().validate("invalid.token.format", TokenType::Access);
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[test]
    fn test_token_type_serialization() {
        let claims = Claims::for_user(&user(), TokenType::Refresh, 1);
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"token_type\":\"refresh\""));
    }
}
