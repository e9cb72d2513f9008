//! Service layer for business logic operations.
//!
//! Services encapsulate business rules and coordinate with the store
//! traits; handlers only ever talk to services.

mod entity_service;
mod order_service;
mod product_service;
mod user_service;

pub use entity_service::{CrudService, EntityService};
pub use order_service::{OrderService, Pricing};
pub use product_service::{PageRequest, ProductPage, ProductService, ReviewAuthor};
pub use user_service::{
    ProfileUpdate, PublicProfile, Registration, Session, UserService, normalize_email,
};

use crate::config::Settings;
use crate::repositories::Repositories;
use crate::utils::jwt::JwtIssuer;

/// The authenticated caller of an operation with owner-or-admin rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub is_admin: bool,
}

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since the stores sit behind `Arc`.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub products: ProductService,
    pub orders: OrderService,
}

impl Services {
    /// Creates the services over `repos`, configured from `settings`.
    pub fn new(repos: Repositories, settings: &Settings) -> Self {
        Self {
            users: UserService::new(&repos, JwtIssuer::new(&settings.jwt)),
            products: ProductService::new(repos.products, settings.catalog.clone()),
            orders: OrderService::new(repos.orders, settings.checkout.clone()),
        }
    }
}
