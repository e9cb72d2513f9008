//! Product and review DTOs.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{NewProduct, Product, ProductFilter, Review, UpdateProduct};
use crate::services::ProductPage;

/// Catalog search query. Paging values are taken as raw strings and sanitized by the service.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductSearchParams {
    /// 1-based page; anything unusable means page 1
    pub page_number: Option<String>,
    /// Items per page; capped by the server
    pub page_size: Option<String>,
    /// Case-insensitive substring of the product name
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
}

impl ProductSearchParams {
    /// Blank criteria are treated as absent.
    pub fn filter(&self) -> ProductFilter {
        let present = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        ProductFilter {
            keyword: present(&self.keyword),
            category: present(&self.category),
            brand: present(&self.brand),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, max = 255, message = "Category is required"))]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 512))]
    pub image: String,
    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = String, example = "89.99")]
    pub price: BigDecimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub count_in_stock: i32,
}

fn non_negative_price(price: &BigDecimal) -> Result<(), ValidationError> {
    if *price < BigDecimal::from(0) {
        return Err(
            ValidationError::new("non_negative").with_message("Price cannot be negative".into()),
        );
    }
    Ok(())
}

impl CreateProductRequest {
    /// Builds the insert model owned by `user_id`.
    pub fn into_new_product(self, user_id: i32) -> NewProduct {
        NewProduct {
            user_id,
            name: self.name,
            brand: self.brand,
            category: self.category,
            description: self.description,
            image: self.image,
            price: self.price,
            count_in_stock: self.count_in_stock,
        }
    }
}

/// Partial catalog edit; reviews and rating cannot be set through it.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "update_price_non_negative"))]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 512))]
    pub image: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub count_in_stock: Option<i32>,
}

fn update_price_non_negative(request: &UpdateProductRequest) -> Result<(), ValidationError> {
    request.price.as_ref().map_or(Ok(()), non_negative_price)
}

impl UpdateProductRequest {
    pub fn into_update_product(self) -> UpdateProduct {
        UpdateProduct {
            name: self.name,
            brand: self.brand,
            category: self.category,
            description: self.description,
            image: self.image,
            price: self.price,
            count_in_stock: self.count_in_stock,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub user_id: i32,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: jiff::Timestamp,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            user_id: review.user_id,
            name: review.name,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub image: String,
    #[schema(value_type = String, example = "89.99")]
    pub price: BigDecimal,
    pub count_in_stock: i32,
    pub rating: f64,
    pub num_reviews: i32,
    pub reviews: Vec<ReviewResponse>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: jiff::Timestamp,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: jiff::Timestamp,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            user_id: product.user_id,
            name: product.name,
            brand: product.brand,
            category: product.category,
            description: product.description,
            image: product.image,
            price: product.price,
            count_in_stock: product.count_in_stock,
            rating: product.rating,
            num_reviews: product.num_reviews,
            reviews: product.reviews.0.into_iter().map(ReviewResponse::from).collect(),
            created_at: product.created_at.to_jiff(),
            updated_at: product.updated_at.to_jiff(),
        }
    }
}

/// One page of catalog results.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductPageResponse {
    pub products: Vec<ProductResponse>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
}

impl From<ProductPage> for ProductPageResponse {
    fn from(page: ProductPage) -> Self {
        Self {
            products: page.items.into_iter().map(ProductResponse::from).collect(),
            page: page.page,
            pages: page.pages,
            total: page.total,
        }
    }
}
