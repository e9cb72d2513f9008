//! User repository for async database operations.
//!
//! Implements the user store contract for the users table using diesel_async.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::{EntityStore, Mutation, UserStore};
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UpdateUser, User};

/// User repository holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap
/// (just reference count increment). No need for `Arc<UserRepository>`.
#[derive(Clone)]
pub struct UserRepository {
    pool: AsyncDbPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<User> for UserRepository {
    /// Finds a user by their ID.
    ///
    /// # Arguments
    /// * `user_id` - The user's ID
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    async fn find_by_id(&self, user_id: i32) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        users
            .filter(id.eq(user_id))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Creates a new user in the database.
    ///
    /// # Arguments
    /// * `new_user` - The user data to insert, email already normalized
    ///
    /// # Returns
    /// The created user with generated id and timestamps. A duplicate email
    /// surfaces as `AppError::Conflict` via the `users_email_key` index.
    async fn insert(&self, new_user: NewUser) -> AppResult<User> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Updates a user's data.
    ///
    /// # Arguments
    /// * `user_id` - The user's ID
    /// * `update_data` - The fields to update (None fields are ignored)
    ///
    /// # Returns
    /// The updated user, or `None` if no user has this ID
    async fn update_by_id(&self, user_id: i32, update_data: UpdateUser) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        if update_data.is_empty() {
            return self.find_by_id(user_id).await;
        }
        let mut conn = self.pool.get().await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set(&update_data)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Deletes a user from the database.
    ///
    /// # Returns
    /// `true` if a row was removed
    async fn delete_by_id(&self, user_id: i32) -> AppResult<bool> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(users.filter(id.eq(user_id)))
            .execute(&mut conn)
            .await
            .map(|affected| affected > 0)
            .map_err(AppError::from)
    }

    /// Applies `mutation` to the user row while holding `FOR UPDATE`.
    async fn modify(&self, user_id: i32, mutation: Mutation<User>) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let Some(mut user) = users
                    .filter(id.eq(user_id))
                    .select(User::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                else {
                    return Ok(None);
                };

                mutation(&mut user)?;

                let saved = diesel::update(users.filter(id.eq(user_id)))
                    .set(&UpdateUser::from(&user))
                    .returning(User::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(Some(saved))
            }
            .scope_boxed()
        })
        .await
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// Finds a user by their email address.
    ///
    /// # Arguments
    /// * `user_email` - The normalized email address
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    async fn find_by_email(&self, user_email: &str) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        users
            .filter(email.eq(user_email))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Lists all users in id order.
    async fn list_all(&self) -> AppResult<Vec<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        users
            .order(id.asc())
            .select(User::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
