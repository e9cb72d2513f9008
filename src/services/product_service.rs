//! Catalog search and review aggregation.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::entity_service::{CrudService, EntityService};
use crate::config::CatalogConfig;
use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product, ProductFilter, Review, UpdateProduct};
use crate::repositories::ProductStore;

/// Paging parameters after sanitizing caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Builds a request from raw query values.
    ///
    /// A missing, non-numeric or non-positive page becomes 1. A page size
    /// with the same defects becomes `default_size`, and any size is capped
    /// at `max_size`.
    pub fn from_untrusted(
        page: Option<&str>,
        page_size: Option<&str>,
        default_size: i64,
        max_size: i64,
    ) -> Self {
        let positive = |raw: Option<&str>| {
            raw.and_then(|s| s.trim().parse::<i64>().ok())
                .filter(|n| *n > 0)
        };
        Self {
            page: positive(page).unwrap_or(1),
            page_size: positive(page_size).unwrap_or(default_size).min(max_size),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page_size.saturating_mul(self.page - 1)
    }

    /// Number of pages needed for `total` items.
    pub fn pages(&self, total: i64) -> i64 {
        (total + self.page_size - 1) / self.page_size
    }
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
}

/// Who is writing a review; the name is snapshotted into the review.
#[derive(Debug, Clone)]
pub struct ReviewAuthor {
    pub user_id: i32,
    pub name: String,
}

#[derive(Clone)]
pub struct ProductService {
    crud: EntityService<Product, dyn ProductStore>,
    catalog: CatalogConfig,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>, catalog: CatalogConfig) -> Self {
        Self {
            crud: EntityService::new(store),
            catalog,
        }
    }

    /// Paginated, filtered catalog search in id order.
    ///
    /// # Arguments
    /// * `page`, `page_size` - Raw query values, sanitized by [`PageRequest::from_untrusted`]
    /// * `filter` - Keyword, category and brand criteria, all optional
    pub async fn search(
        &self,
        page: Option<&str>,
        page_size: Option<&str>,
        filter: ProductFilter,
    ) -> AppResult<ProductPage> {
        let request = PageRequest::from_untrusted(
            page,
            page_size,
            self.catalog.default_page_size,
            self.catalog.max_page_size,
        );
        let (items, total) = self
            .crud
            .store()
            .search(&filter, request.offset(), request.page_size)
            .await?;

        Ok(ProductPage {
            items,
            page: request.page,
            pages: request.pages(total),
            total,
        })
    }

    /// Adds `author`'s review and recomputes the rating in the same write.
    ///
    /// # Returns
    /// The updated product, `NotFound` for an unknown product, or `Conflict`
    /// when this author already reviewed it
    pub async fn add_review(
        &self,
        product_id: i32,
        author: ReviewAuthor,
        rating: i32,
        comment: String,
    ) -> AppResult<Product> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::invalid_input(
                "rating",
                "Rating must be between 1 and 5",
            ));
        }

        let author_id = author.user_id;
        let product = self
            .crud
            .mutate(product_id, move |product| {
                if product.review_by(author.user_id).is_some() {
                    return Err(AppError::Conflict {
                        entity: "product".to_string(),
                        reason: "already reviewed".to_string(),
                    });
                }
                product.reviews.0.push(Review {
                    id: Uuid::new_v4(),
                    user_id: author.user_id,
                    name: author.name,
                    rating,
                    comment,
                    created_at: jiff::Timestamp::now(),
                });
                product.recompute_rating();
                Ok(())
            })
            .await?;

        tracing::info!(product_id, user_id = author_id, rating, "Review added");
        Ok(product)
    }

    /// Removes a review written by `requester_id`.
    ///
    /// # Returns
    /// The updated product, `NotFound` when the product or review is
    /// missing, or `Forbidden` when the requester did not write the review
    pub async fn remove_review(
        &self,
        product_id: i32,
        review_id: Uuid,
        requester_id: i32,
    ) -> AppResult<Product> {
        let product = self
            .crud
            .mutate(product_id, move |product| {
                let position = product
                    .reviews
                    .0
                    .iter()
                    .position(|r| r.id == review_id)
                    .ok_or_else(|| AppError::not_found("review", "id", review_id))?;
                if product.reviews.0[position].user_id != requester_id {
                    return Err(AppError::Forbidden {
                        message: "Only the author can remove this review".to_string(),
                    });
                }
                product.reviews.0.remove(position);
                product.recompute_rating();
                Ok(())
            })
            .await?;

        tracing::info!(product_id, user_id = requester_id, %review_id, "Review removed");
        Ok(product)
    }

    /// Best rated products, highest first.
    pub async fn top_rated(&self) -> AppResult<Vec<Product>> {
        self.crud
            .store()
            .top_rated(self.catalog.top_rated_limit)
            .await
    }
}

#[async_trait]
impl CrudService<Product> for ProductService {
    async fn get(&self, id: i32) -> AppResult<Product> {
        self.crud.get(id).await
    }

    async fn create(&self, new: NewProduct) -> AppResult<Product> {
        let product = self.crud.create(new).await?;
        tracing::info!(product_id = product.id, "Product created");
        Ok(product)
    }

    /// Catalog fields only; reviews and their aggregates are never overwritten here.
    async fn update(&self, id: i32, changes: UpdateProduct) -> AppResult<Product> {
        self.crud.update(id, changes.catalog_only()).await
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let deleted = self.crud.delete(id).await?;
        tracing::info!(product_id = id, "Product deleted");
        Ok(deleted)
    }
}
