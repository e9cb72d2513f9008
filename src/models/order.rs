use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel::sql_types::Jsonb;
use diesel::{AsExpression, FromSqlRow};
use jiff_diesel::Timestamp;
use serde::{Deserialize, Serialize};

/// Denormalized line item; name, image and price are captured at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i32,
    pub name: String,
    pub image: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Jsonb)]
#[serde(transparent)]
pub struct OrderItems(pub Vec<OrderItem>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Jsonb)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Payment provider confirmation snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Jsonb)]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub update_time: String,
    pub email_address: String,
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: i32,
    pub user_id: i32,
    pub order_items: OrderItems,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub items_price: BigDecimal,
    pub tax_price: BigDecimal,
    pub shipping_price: BigDecimal,
    pub total_price: BigDecimal,
    pub is_paid: bool,
    pub paid_at: Option<Timestamp>,
    pub payment_result: Option<PaymentResult>,
    pub is_delivered: bool,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Orders are always inserted unpaid and undelivered; the columns default accordingly.
#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder {
    pub user_id: i32,
    pub order_items: OrderItems,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub items_price: BigDecimal,
    pub tax_price: BigDecimal,
    pub shipping_price: BigDecimal,
    pub total_price: BigDecimal,
}

/// Changeset for an order. Nullable columns use `Option<Option<_>>` so a
/// snapshot can write them explicitly.
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::orders)]
pub struct UpdateOrder {
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
    pub is_paid: Option<bool>,
    pub paid_at: Option<Option<Timestamp>>,
    pub payment_result: Option<Option<PaymentResult>>,
    pub is_delivered: Option<bool>,
    pub delivered_at: Option<Option<Timestamp>>,
}

impl UpdateOrder {
    pub fn is_empty(&self) -> bool {
        self.shipping_address.is_none()
            && self.payment_method.is_none()
            && self.is_paid.is_none()
            && self.paid_at.is_none()
            && self.payment_result.is_none()
            && self.is_delivered.is_none()
            && self.delivered_at.is_none()
    }

    pub fn apply_to(self, order: &mut Order) {
        if let Some(v) = self.shipping_address {
            order.shipping_address = v;
        }
        if let Some(v) = self.payment_method {
            order.payment_method = v;
        }
        if let Some(v) = self.is_paid {
            order.is_paid = v;
        }
        if let Some(v) = self.paid_at {
            order.paid_at = v;
        }
        if let Some(v) = self.payment_result {
            order.payment_result = v;
        }
        if let Some(v) = self.is_delivered {
            order.is_delivered = v;
        }
        if let Some(v) = self.delivered_at {
            order.delivered_at = v;
        }
    }
}

impl From<&Order> for UpdateOrder {
    fn from(o: &Order) -> Self {
        Self {
            shipping_address: Some(o.shipping_address.clone()),
            payment_method: Some(o.payment_method.clone()),
            is_paid: Some(o.is_paid),
            paid_at: Some(o.paid_at),
            payment_result: Some(o.payment_result.clone()),
            is_delivered: Some(o.is_delivered),
            delivered_at: Some(o.delivered_at),
        }
    }
}
