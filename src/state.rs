//! Application state for Axum web framework.

use crate::config::Settings;
use crate::repositories::Repositories;
use crate::services::Services;
use crate::utils::jwt::JwtIssuer;

/// Shared services and resources reachable from every handler.
///
/// Cloning is cheap since the stores and the pool sit behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Kept alongside the services for health checks
    pub repos: Repositories,
    /// Validates bearer tokens on incoming requests
    pub jwt: JwtIssuer,
}

impl AppState {
    /// Wires the services over `repos`.
    ///
    /// # Example
    /// ```ignore
    /// let state = AppState::new(Repositories::in_memory(), &Settings::default());
    /// ```
    pub fn new(repos: Repositories, settings: &Settings) -> Self {
        Self {
            services: Services::new(repos.clone(), settings),
            repos,
            jwt: JwtIssuer::new(&settings.jwt),
        }
    }
}

/// In-memory state with a usable signing secret.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    let mut settings = Settings::default();
    settings.jwt.secret = "test_secret_key_at_least_32_characters_long".to_string();
    AppState::new(Repositories::in_memory(), &settings)
}
