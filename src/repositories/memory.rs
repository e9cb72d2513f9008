//! In-process document store.
//!
//! Rows live in a `BTreeMap` behind a `std::sync::Mutex`, so iteration
//! order is id order and every operation, including a [`Mutation`], runs
//! under the lock. The lock is never held across an await point.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use jiff_diesel::Timestamp;

use super::{EntityStore, Mutation, OrderStore, ProductStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    Entity, NewOrder, NewProduct, NewUser, Order, Product, ProductFilter, Reviews, User,
};

/// How an entity is materialized and merged without a database.
pub trait MemoryDocument: Entity {
    fn materialize(id: i32, new: Self::New, now: Timestamp) -> Self;

    fn merge(&mut self, changes: Self::Changes);

    fn touch(&mut self, now: Timestamp);

    /// Field name and value that must be unique across the collection, if any
    fn unique_key(&self) -> Option<(&'static str, String)> {
        None
    }
}

struct Collection<E> {
    rows: BTreeMap<i32, E>,
    next_id: i32,
}

pub struct MemoryStore<E> {
    inner: Mutex<Collection<E>>,
}

impl<E: MemoryDocument> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Collection {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Collection<E>>> {
        self.inner.lock().map_err(|_| {
            AppError::persistence(
                "memory store lock",
                anyhow::anyhow!("{} collection lock poisoned", E::KIND),
            )
        })
    }

    /// Rows matching `predicate`, in id order.
    fn scan(&self, predicate: impl Fn(&E) -> bool) -> AppResult<Vec<E>> {
        let collection = self.lock()?;
        Ok(collection
            .rows
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect())
    }

    fn count(&self, predicate: impl Fn(&E) -> bool) -> AppResult<i64> {
        let collection = self.lock()?;
        Ok(collection.rows.values().filter(|row| predicate(row)).count() as i64)
    }

    fn ensure_unique(collection: &Collection<E>, candidate: &E) -> AppResult<()> {
        let Some((field, value)) = candidate.unique_key() else {
            return Ok(());
        };
        let taken = collection.rows.values().any(|row| {
            row.id() != candidate.id() && row.unique_key().is_some_and(|(_, other)| other == value)
        });
        if taken {
            return Err(AppError::Conflict {
                entity: E::KIND.to_string(),
                reason: format!("{field} already exists"),
            });
        }
        Ok(())
    }

    /// Validates and stores an edited copy; the stored row is untouched on error.
    fn replace(collection: &mut Collection<E>, mut edited: E) -> AppResult<E> {
        Self::ensure_unique(collection, &edited)?;
        edited.touch(jiff::Timestamp::now().into());
        collection.rows.insert(edited.id(), edited.clone());
        Ok(edited)
    }
}

impl<E: MemoryDocument> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: MemoryDocument> EntityStore<E> for MemoryStore<E> {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<E>> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    async fn insert(&self, new: E::New) -> AppResult<E> {
        let mut collection = self.lock()?;
        let id = collection.next_id;
        let row = E::materialize(id, new, jiff::Timestamp::now().into());
        Self::ensure_unique(&collection, &row)?;
        collection.next_id += 1;
        collection.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update_by_id(&self, id: i32, changes: E::Changes) -> AppResult<Option<E>> {
        let mut collection = self.lock()?;
        let Some(mut edited) = collection.rows.get(&id).cloned() else {
            return Ok(None);
        };
        edited.merge(changes);
        Self::replace(&mut collection, edited).map(Some)
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<bool> {
        Ok(self.lock()?.rows.remove(&id).is_some())
    }

    async fn modify(&self, id: i32, mutation: Mutation<E>) -> AppResult<Option<E>> {
        let mut collection = self.lock()?;
        let Some(mut edited) = collection.rows.get(&id).cloned() else {
            return Ok(None);
        };
        mutation(&mut edited)?;
        Self::replace(&mut collection, edited).map(Some)
    }
}

// ============================================================================
// Entity mappings
// ============================================================================

impl MemoryDocument for User {
    fn materialize(id: i32, new: NewUser, now: Timestamp) -> Self {
        User {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password: new.password,
            is_admin: new.is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    fn merge(&mut self, changes: Self::Changes) {
        changes.apply_to(self);
    }

    fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }

    fn unique_key(&self) -> Option<(&'static str, String)> {
        Some(("email", self.email.to_lowercase()))
    }
}

impl MemoryDocument for Product {
    fn materialize(id: i32, new: NewProduct, now: Timestamp) -> Self {
        Product {
            id,
            user_id: new.user_id,
            name: new.name,
            brand: new.brand,
            category: new.category,
            description: new.description,
            image: new.image,
            price: new.price,
            count_in_stock: new.count_in_stock,
            rating: 0.0,
            num_reviews: 0,
            reviews: Reviews::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn merge(&mut self, changes: Self::Changes) {
        changes.apply_to(self);
    }

    fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }
}

impl MemoryDocument for Order {
    fn materialize(id: i32, new: NewOrder, now: Timestamp) -> Self {
        Order {
            id,
            user_id: new.user_id,
            order_items: new.order_items,
            shipping_address: new.shipping_address,
            payment_method: new.payment_method,
            items_price: new.items_price,
            tax_price: new.tax_price,
            shipping_price: new.shipping_price,
            total_price: new.total_price,
            is_paid: false,
            paid_at: None,
            payment_result: None,
            is_delivered: false,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn merge(&mut self, changes: Self::Changes) {
        changes.apply_to(self);
    }

    fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }
}

// ============================================================================
// Entity-specific queries
// ============================================================================

#[async_trait]
impl UserStore for MemoryStore<User> {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let wanted = email.to_lowercase();
        Ok(self
            .scan(|u| u.email.to_lowercase() == wanted)?
            .into_iter()
            .next())
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        self.scan(|_| true)
    }
}

#[async_trait]
impl ProductStore for MemoryStore<Product> {
    async fn search(
        &self,
        filter: &ProductFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Product>, i64)> {
        let matching = self.scan(|p| filter.matches(p))?;
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn top_rated(&self, limit: i64) -> AppResult<Vec<Product>> {
        let mut all = self.scan(|_| true)?;
        // stable sort keeps id order among equal ratings
        all.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }

    async fn count_by_owner(&self, owner_id: i32) -> AppResult<i64> {
        self.count(|p| p.user_id == owner_id)
    }
}

#[async_trait]
impl OrderStore for MemoryStore<Order> {
    async fn list_all(&self) -> AppResult<Vec<Order>> {
        self.scan(|_| true)
    }

    async fn list_by_owner(&self, owner_id: i32) -> AppResult<Vec<Order>> {
        self.scan(|o| o.user_id == owner_id)
    }

    async fn count_by_owner(&self, owner_id: i32) -> AppResult<i64> {
        self.count(|o| o.user_id == owner_id)
    }
}
