//! Repository layer for data access operations.
//!
//! [`EntityStore`] is the document-store contract shared by every entity;
//! the per-entity traits add the queries each service needs. Two backends
//! implement them: diesel-async repositories over PostgreSQL and an
//! in-process [`MemoryStore`].

mod memory;
mod order_repo;
mod product_repo;
mod user_repo;

pub use memory::{MemoryDocument, MemoryStore};
pub use order_repo::OrderRepository;
pub use product_repo::ProductRepository;
pub use user_repo::UserRepository;

use std::sync::Arc;

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::models::{Entity, Order, Product, ProductFilter, User};

/// Edit applied to a locked document; returning an error aborts without writing.
pub type Mutation<E> = Box<dyn FnOnce(&mut E) -> AppResult<()> + Send>;

/// Basic document operations. Absence is reported as `None`/`false`, never as an error.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<E>>;

    async fn insert(&self, new: E::New) -> AppResult<E>;

    /// Shallow merge of `changes`; `None` when no document has this id.
    async fn update_by_id(&self, id: i32, changes: E::Changes) -> AppResult<Option<E>>;

    async fn delete_by_id(&self, id: i32) -> AppResult<bool>;

    /// Read-modify-write with the document locked for the whole sequence.
    async fn modify(&self, id: i32, mutation: Mutation<E>) -> AppResult<Option<E>>;
}

#[async_trait]
pub trait UserStore: EntityStore<User> {
    /// Lookup by normalized (trimmed, lowercase) email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn list_all(&self) -> AppResult<Vec<User>>;
}

#[async_trait]
pub trait ProductStore: EntityStore<Product> {
    /// One page of matching products in id order, plus the total match count.
    async fn search(
        &self,
        filter: &ProductFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Product>, i64)>;

    /// Highest rated first; ties keep id order.
    async fn top_rated(&self, limit: i64) -> AppResult<Vec<Product>>;

    /// Number of products created by `owner_id`
    async fn count_by_owner(&self, owner_id: i32) -> AppResult<i64>;
}

#[async_trait]
pub trait OrderStore: EntityStore<Order> {
    async fn list_all(&self) -> AppResult<Vec<Order>>;

    async fn list_by_owner(&self, owner_id: i32) -> AppResult<Vec<Order>>;

    async fn count_by_owner(&self, owner_id: i32) -> AppResult<i64>;
}

/// Aggregates all stores for convenient access.
///
/// Cloning is cheap: the stores sit behind `Arc` and the pool is itself reference counted.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pool: Option<AsyncDbPool>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            products: Arc::new(ProductRepository::new(pool.clone())),
            orders: Arc::new(OrderRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Empty process-local stores.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryStore::<User>::new()),
            products: Arc::new(MemoryStore::<Product>::new()),
            orders: Arc::new(MemoryStore::<Order>::new()),
            pool: None,
        }
    }

    /// Round-trips to the backing store; returns the backend name.
    pub async fn ping(&self) -> AppResult<&'static str> {
        match self.pool {
            Some(ref pool) => {
                let mut conn = pool.get().await?;
                diesel::sql_query("SELECT 1").execute(&mut conn).await?;
                Ok("postgres")
            }
            None => Ok("memory"),
        }
    }
}
