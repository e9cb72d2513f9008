//! Order repository for async database operations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::{EntityStore, Mutation, OrderStore};
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewOrder, Order, UpdateOrder};

#[derive(Clone)]
pub struct OrderRepository {
    pool: AsyncDbPool,
}

impl OrderRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<Order> for OrderRepository {
    async fn find_by_id(&self, order_id: i32) -> AppResult<Option<Order>> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        orders
            .filter(id.eq(order_id))
            .select(Order::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Inserts an unpaid, undelivered order.
    ///
    /// # Arguments
    /// * `new_order` - Line items, address and server-computed amounts
    async fn insert(&self, new_order: NewOrder) -> AppResult<Order> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(orders)
            .values(&new_order)
            .returning(Order::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn update_by_id(&self, order_id: i32, changes: UpdateOrder) -> AppResult<Option<Order>> {
        use crate::schema::orders::dsl::*;
        if changes.is_empty() {
            return self.find_by_id(order_id).await;
        }
        let mut conn = self.pool.get().await?;

        diesel::update(orders.filter(id.eq(order_id)))
            .set(&changes)
            .returning(Order::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn delete_by_id(&self, order_id: i32) -> AppResult<bool> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(orders.filter(id.eq(order_id)))
            .execute(&mut conn)
            .await
            .map(|affected| affected > 0)
            .map_err(AppError::from)
    }

    async fn modify(&self, order_id: i32, mutation: Mutation<Order>) -> AppResult<Option<Order>> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let Some(mut order) = orders
                    .filter(id.eq(order_id))
                    .select(Order::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                else {
                    return Ok(None);
                };

                mutation(&mut order)?;

                let saved = diesel::update(orders.filter(id.eq(order_id)))
                    .set(&UpdateOrder::from(&order))
                    .returning(Order::as_returning())
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
impl OrderStore for OrderRepository {
    async fn list_all(&self) -> AppResult<Vec<Order>> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        orders
            .order(id.asc())
            .select(Order::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Orders placed by `owner_id`, oldest first.
    async fn list_by_owner(&self, owner_id: i32) -> AppResult<Vec<Order>> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        orders
            .filter(user_id.eq(owner_id))
            .order(id.asc())
            .select(Order::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn count_by_owner(&self, owner_id: i32) -> AppResult<i64> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        orders
            .filter(user_id.eq(owner_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
