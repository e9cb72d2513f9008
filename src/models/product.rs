use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel::sql_types::Jsonb;
use diesel::{AsExpression, FromSqlRow};
use jiff_diesel::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single customer review, embedded in its product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: i32,
    /// Author display name captured when the review was written
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: jiff::Timestamp,
}

/// Ordered review list stored in the `products.reviews` JSONB column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Jsonb)]
#[serde(transparent)]
pub struct Reviews(pub Vec<Review>);

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub image: String,
    pub price: BigDecimal,
    pub count_in_stock: i32,
    pub rating: f64,
    pub num_reviews: i32,
    pub reviews: Reviews,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Product {
    pub fn review_by(&self, user_id: i32) -> Option<&Review> {
        self.reviews.0.iter().find(|r| r.user_id == user_id)
    }

    /// Re-derive `num_reviews` and `rating` from the embedded review list.
    ///
    /// Must be called after every change to `reviews`; an empty list yields a rating of 0.
    pub fn recompute_rating(&mut self) {
        let reviews = &self.reviews.0;
        self.num_reviews = reviews.len() as i32;
        self.rating = if reviews.is_empty() {
            0.0
        } else {
            reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / reviews.len() as f64
        };
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub user_id: i32,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub image: String,
    pub price: BigDecimal,
    pub count_in_stock: i32,
}

#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::products)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<BigDecimal>,
    pub count_in_stock: Option<i32>,
    pub rating: Option<f64>,
    pub num_reviews: Option<i32>,
    pub reviews: Option<Reviews>,
}

impl UpdateProduct {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.brand.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.price.is_none()
            && self.count_in_stock.is_none()
            && self.rating.is_none()
            && self.num_reviews.is_none()
            && self.reviews.is_none()
    }

    /// Drops the review list and its derived aggregates, keeping catalog fields only.
    pub fn catalog_only(self) -> Self {
        Self {
            rating: None,
            num_reviews: None,
            reviews: None,
            ..self
        }
    }

    pub fn apply_to(self, product: &mut Product) {
        if let Some(v) = self.name {
            product.name = v;
        }
        if let Some(v) = self.brand {
            product.brand = v;
        }
        if let Some(v) = self.category {
            product.category = v;
        }
        if let Some(v) = self.description {
            product.description = v;
        }
        if let Some(v) = self.image {
            product.image = v;
        }
        if let Some(v) = self.price {
            product.price = v;
        }
        if let Some(v) = self.count_in_stock {
            product.count_in_stock = v;
        }
        if let Some(v) = self.rating {
            product.rating = v;
        }
        if let Some(v) = self.num_reviews {
            product.num_reviews = v;
        }
        if let Some(v) = self.reviews {
            product.reviews = v;
        }
    }
}

impl From<&Product> for UpdateProduct {
    fn from(p: &Product) -> Self {
        Self {
            name: Some(p.name.clone()),
            brand: Some(p.brand.clone()),
            category: Some(p.category.clone()),
            description: Some(p.description.clone()),
            image: Some(p.image.clone()),
            price: Some(p.price.clone()),
            count_in_stock: Some(p.count_in_stock),
            rating: Some(p.rating),
            num_reviews: Some(p.num_reviews),
            reviews: Some(p.reviews.clone()),
        }
    }
}

/// Conjunctive catalog filter; `None` criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive literal substring of the product name
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let keyword_ok = self.keyword.as_deref().is_none_or(|k| {
            product.name.to_lowercase().contains(&k.to_lowercase())
        });
        let category_ok = self.category.as_deref().is_none_or(|c| product.category == c);
        let brand_ok = self.brand.as_deref().is_none_or(|b| product.brand == b);
        keyword_ok && category_ok && brand_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product_with(ratings: &[i32]) -> Product {
        let now: Timestamp = jiff::Timestamp::now().into();
        Product {
            id: 1,
            user_id: 1,
            name: "Airpods Wireless Bluetooth Headphones".into(),
            brand: "Apple".into(),
            category: "Electronics".into(),
            description: String::new(),
            image: String::new(),
            price: BigDecimal::from(89),
            count_in_stock: 10,
            rating: 0.0,
            num_reviews: 0,
            reviews: Reviews(
                ratings
                    .iter()
                    .enumerate()
                    .map(|(i, r)| Review {
                        id: Uuid::new_v4(),
                        user_id: i as i32 + 1,
                        name: format!("user {i}"),
                        rating: *r,
                        comment: String::new(),
                        created_at: jiff::Timestamp::now(),
                    })
                    .collect(),
            ),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_recompute_rating_empty_is_zero() {
        let mut p = product_with(&[]);
        p.rating = 4.5;
        p.num_reviews = 3;
        p.recompute_rating();
        assert_eq!(p.num_reviews, 0);
        assert_eq!(p.rating, 0.0);
    }

    #[test]
    fn test_recompute_rating_mean() {
        let mut p = product_with(&[5, 4, 3]);
        p.recompute_rating();
        assert_eq!(p.num_reviews, 3);
        assert!((p.rating - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_catalog_only_strips_review_state() {
        let changes = UpdateProduct {
            name: Some("x".into()),
            rating: Some(5.0),
            num_reviews: Some(9),
            reviews: Some(Reviews::default()),
            ..Default::default()
        }
        .catalog_only();
        assert_eq!(changes.name.as_deref(), Some("x"));
        assert!(changes.rating.is_none());
        assert!(changes.num_reviews.is_none());
        assert!(changes.reviews.is_none());
    }

    #[test]
    fn test_filter_keyword_is_literal_and_case_insensitive() {
        let p = product_with(&[]);
        let hit = ProductFilter {
            keyword: Some("AIRPODS".into()),
            ..Default::default()
        };
        let pattern = ProductFilter {
            keyword: Some("Air.*".into()),
            ..Default::default()
        };
        let wrong_brand = ProductFilter {
            keyword: Some("air".into()),
            brand: Some("Sony".into()),
            ..Default::default()
        };
        assert!(hit.matches(&p));
        assert!(!pattern.matches(&p));
        assert!(!wrong_brand.matches(&p));
    }

    proptest! {
        #[test]
        fn prop_derived_fields_track_reviews(ratings in prop::collection::vec(1i32..=5, 0..40)) {
            let mut p = product_with(&ratings);
            p.recompute_rating();
            prop_assert_eq!(p.num_reviews as usize, ratings.len());
            if ratings.is_empty() {
                prop_assert_eq!(p.rating, 0.0);
            } else {
                let mean = ratings.iter().sum::<i32>() as f64 / ratings.len() as f64;
                prop_assert!((p.rating - mean).abs() < 1e-9);
                prop_assert!(p.rating >= 1.0 && p.rating <= 5.0);
            }
        }
    }
}
