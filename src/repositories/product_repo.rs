//! Product repository for async database operations.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::{EntityStore, Mutation, ProductStore};
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product, ProductFilter, UpdateProduct};

#[derive(Clone)]
pub struct ProductRepository {
    pool: AsyncDbPool,
}

impl ProductRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

/// Escapes LIKE metacharacters so the keyword matches literally.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn filtered(filter: &ProductFilter) -> crate::schema::products::BoxedQuery<'static, Pg> {
    use crate::schema::products;

    let mut query = products::table.into_boxed();
    if let Some(keyword) = filter.keyword.as_deref() {
        query = query.filter(products::name.ilike(like_pattern(keyword)));
    }
    if let Some(category) = filter.category.clone() {
        query = query.filter(products::category.eq(category));
    }
    if let Some(brand) = filter.brand.clone() {
        query = query.filter(products::brand.eq(brand));
    }
    query
}

#[async_trait]
impl EntityStore<Product> for ProductRepository {
    async fn find_by_id(&self, product_id: i32) -> AppResult<Option<Product>> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        products
            .filter(id.eq(product_id))
            .select(Product::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Inserts a product with an empty review list and a zero rating.
    async fn insert(&self, new_product: NewProduct) -> AppResult<Product> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(products)
            .values(&new_product)
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn update_by_id(
        &self,
        product_id: i32,
        changes: UpdateProduct,
    ) -> AppResult<Option<Product>> {
        use crate::schema::products::dsl::*;
        if changes.is_empty() {
            return self.find_by_id(product_id).await;
        }
        let mut conn = self.pool.get().await?;

        diesel::update(products.filter(id.eq(product_id)))
            .set(&changes)
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn delete_by_id(&self, product_id: i32) -> AppResult<bool> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(products.filter(id.eq(product_id)))
            .execute(&mut conn)
            .await
            .map(|affected| affected > 0)
            .map_err(AppError::from)
    }

    /// Review edits go through here so concurrent reviewers serialize on the row lock.
    async fn modify(
        &self,
        product_id: i32,
        mutation: Mutation<Product>,
    ) -> AppResult<Option<Product>> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let Some(mut product) = products
                    .filter(id.eq(product_id))
                    .select(Product::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                else {
                    return Ok(None);
                };

                mutation(&mut product)?;

                let saved = diesel::update(products.filter(id.eq(product_id)))
                    .set(&UpdateProduct::from(&product))
                    .returning(Product::as_returning())
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
impl ProductStore for ProductRepository {
    /// Counts all matches, then loads one page ordered by id.
    async fn search(
        &self,
        filter: &ProductFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Product>, i64)> {
        let mut conn = self.pool.get().await?;

        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)?;

        let page = filtered(filter)
            .order(crate::schema::products::id.asc())
            .offset(offset)
            .limit(limit)
            .select(Product::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok((page, total))
    }

    async fn top_rated(&self, limit: i64) -> AppResult<Vec<Product>> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        products
            .order((rating.desc(), id.asc()))
            .limit(limit)
            .select(Product::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn count_by_owner(&self, owner_id: i32) -> AppResult<i64> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        products
            .filter(user_id.eq(owner_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
