//! Generic CRUD over any [`Entity`] backed by an [`EntityStore`].
//!
//! Specialized services hold an `EntityService` and implement
//! [`CrudService`] by delegating to it or overriding single operations.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::models::Entity;
use crate::repositories::EntityStore;

/// The capability set every entity service exposes.
#[async_trait]
pub trait CrudService<E: Entity>: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<E>;

    async fn create(&self, new: E::New) -> AppResult<E>;

    async fn update(&self, id: i32, changes: E::Changes) -> AppResult<E>;

    async fn delete(&self, id: i32) -> AppResult<bool>;
}

/// Store-backed implementation shared by all entity kinds.
pub struct EntityService<E, S: ?Sized> {
    store: Arc<S>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S: ?Sized> Clone for EntityService<E, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E, S> EntityService<E, S>
where
    E: Entity,
    S: ?Sized + EntityStore<E>,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// The underlying store, for entity-specific queries.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn not_found(id: i32) -> AppError {
        AppError::not_found(E::KIND, "id", id)
    }

    /// Gets an entity by id.
    ///
    /// # Returns
    /// The entity, or `NotFound` when no document has this id
    pub async fn get(&self, id: i32) -> AppResult<E> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn create(&self, new: E::New) -> AppResult<E> {
        let created = self.store.insert(new).await?;
        tracing::debug!(kind = E::KIND, id = created.id(), "Entity created");
        Ok(created)
    }

    /// Shallow merge: only the fields present in `changes` are written.
    pub async fn update(&self, id: i32, changes: E::Changes) -> AppResult<E> {
        self.store
            .update_by_id(id, changes)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        if !self.store.delete_by_id(id).await? {
            return Err(Self::not_found(id));
        }
        tracing::debug!(kind = E::KIND, id, "Entity deleted");
        Ok(true)
    }

    /// Locked read-modify-write. An error from `edit` aborts with nothing written.
    pub async fn mutate<F>(&self, id: i32, edit: F) -> AppResult<E>
    where
        F: FnOnce(&mut E) -> AppResult<()> + Send + 'static,
    {
        self.store
            .modify(id, Box::new(edit))
            .await?
            .ok_or_else(|| Self::not_found(id))
    }
}

#[async_trait]
impl<E, S> CrudService<E> for EntityService<E, S>
where
    E: Entity,
    S: ?Sized + EntityStore<E> + 'static,
{
    async fn get(&self, id: i32) -> AppResult<E> {
        EntityService::get(self, id).await
    }

    async fn create(&self, new: E::New) -> AppResult<E> {
        EntityService::create(self, new).await
    }

    async fn update(&self, id: i32, changes: E::Changes) -> AppResult<E> {
        EntityService::update(self, id, changes).await
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        EntityService::delete(self, id).await
    }
}
