//! User service for registration, authentication and profile management.
//!
//! Emails are normalized (trimmed, lowercased) before every lookup or write,
//! and passwords are hashed here so no plain text ever reaches a store.

use std::sync::Arc;

use async_trait::async_trait;

use super::entity_service::{CrudService, EntityService};
use crate::error::{AppError, AppResult, FieldError};
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::{OrderStore, ProductStore, Repositories, UserStore};
use crate::utils::jwt::{JwtIssuer, TokenPair, TokenType};
use crate::utils::password::{hash_password, verify_password};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Account view that is safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicProfile {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Profile plus a freshly issued token pair.
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: PublicProfile,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Self-service profile edit. Empty strings count as "not provided".
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// User service for handling user-related business logic.
///
/// Cloning is cheap: the stores sit behind `Arc`s.
#[derive(Clone)]
pub struct UserService {
    crud: EntityService<User, dyn UserStore>,
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
    jwt: JwtIssuer,
}

impl UserService {
    /// The product and order stores are only read, to keep owners from being deleted.
    pub fn new(repos: &Repositories, jwt: JwtIssuer) -> Self {
        Self {
            crud: EntityService::new(Arc::clone(&repos.users)),
            products: Arc::clone(&repos.products),
            orders: Arc::clone(&repos.orders),
            jwt,
        }
    }

    async fn ensure_owns_nothing(&self, user_id: i32) -> AppResult<()> {
        let reason = if self.orders.count_by_owner(user_id).await? > 0 {
            "has orders"
        } else if self.products.count_by_owner(user_id).await? > 0 {
            "has products"
        } else {
            return Ok(());
        };
        Err(AppError::Conflict {
            entity: "user".to_string(),
            reason: reason.to_string(),
        })
    }

    fn session(&self, user: &User) -> AppResult<Session> {
        Ok(Session {
            profile: PublicProfile::from(user),
            tokens: self.jwt.issue(user)?,
        })
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<i32>) -> AppResult<()> {
        match self.crud.store().find_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => Err(AppError::Conflict {
                entity: "user".to_string(),
                reason: "email already exists".to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Registers a new account and signs it in.
    ///
    /// # Returns
    /// The new profile and tokens, `InvalidInput` listing every missing
    /// field, or `Conflict` when the email is taken
    pub async fn register(&self, registration: Registration) -> AppResult<Session> {
        let missing: Vec<FieldError> = [
            ("first_name", &registration.first_name),
            ("last_name", &registration.last_name),
            ("email", &registration.email),
            ("password", &registration.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| FieldError {
            field: field.to_string(),
            reason: "is required".to_string(),
        })
        .collect();
        if !missing.is_empty() {
            return Err(AppError::InvalidInput { errors: missing });
        }

        let user = self
            .create(NewUser {
                first_name: registration.first_name.trim().to_string(),
                last_name: registration.last_name.trim().to_string(),
                email: registration.email,
                password: registration.password,
                is_admin: false,
            })
            .await?;

        self.session(&user)
    }

    /// Checks credentials. Unknown email and wrong password are indistinguishable.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<Session> {
        let unauthorized = || AppError::Unauthorized {
            message: INVALID_CREDENTIALS.to_string(),
        };

        let user = self
            .crud
            .store()
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(unauthorized)?;

        if !verify_password(password, &user.password)? {
            tracing::debug!(user_id = user.id, "Password mismatch");
            return Err(unauthorized());
        }

        tracing::info!(user_id = user.id, "User signed in");
        self.session(&user)
    }

    /// Trades a refresh token for a new pair, re-reading the account.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<Session> {
        let claims = self.jwt.validate(refresh_token, TokenType::Refresh)?;
        let user = self
            .crud
            .store()
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::Unauthorized {
                message: "Account no longer exists".to_string(),
            })?;
        self.session(&user)
    }

    pub async fn list_all(&self) -> AppResult<Vec<User>> {
        self.crud.store().list_all().await
    }

    pub async fn get_profile(&self, user_id: i32) -> AppResult<PublicProfile> {
        let user = self.crud.get(user_id).await?;
        Ok(PublicProfile::from(&user))
    }

    /// Applies a self-service profile edit and re-issues tokens.
    ///
    /// The account is looked up first (`NotFound`). A new password then needs
    /// an identical `confirm_password`; otherwise the call fails with
    /// `Forbidden` before anything is written.
    pub async fn update_profile(&self, user_id: i32, update: ProfileUpdate) -> AppResult<Session> {
        self.crud.get(user_id).await?;

        let password = match provided(update.password) {
            Some(password) if update.confirm_password.as_deref() == Some(password.as_str()) => {
                Some(hash_password(&password)?)
            }
            Some(_) => {
                return Err(AppError::Forbidden {
                    message: "Password confirmation does not match".to_string(),
                });
            }
            None => None,
        };

        let email = provided(update.email).map(|e| normalize_email(&e));
        if let Some(ref email) = email {
            self.ensure_email_free(email, Some(user_id)).await?;
        }

        let changes = UpdateUser {
            first_name: provided(update.first_name),
            last_name: provided(update.last_name),
            email,
            password,
            is_admin: None,
        };
        let password_changed = changes.password.is_some();
        let user = self
            .crud
            .mutate(user_id, move |user| {
                changes.apply_to(user);
                Ok(())
            })
            .await?;

        tracing::info!(user_id, password_changed, "Profile updated");
        self.session(&user)
    }
}

#[async_trait]
impl CrudService<User> for UserService {
    async fn get(&self, id: i32) -> AppResult<User> {
        self.crud.get(id).await
    }

    /// Normalizes the email, rejects duplicates and hashes the password before insert.
    async fn create(&self, mut new: NewUser) -> AppResult<User> {
        new.email = normalize_email(&new.email);
        self.ensure_email_free(&new.email, None).await?;
        new.password = hash_password(&new.password)?;

        let user = self.crud.create(new).await?;
        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Administrative edit. Never changes the password.
    async fn update(&self, id: i32, mut changes: UpdateUser) -> AppResult<User> {
        changes.password = None;
        if let Some(email) = changes.email.take() {
            let email = normalize_email(&email);
            self.ensure_email_free(&email, Some(id)).await?;
            changes.email = Some(email);
        }
        self.crud.update(id, changes).await
    }

    /// Refuses with `Conflict` while the user still owns orders or products.
    async fn delete(&self, id: i32) -> AppResult<bool> {
        self.ensure_owns_nothing(id).await?;
        let deleted = self.crud.delete(id).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(deleted)
    }
}
