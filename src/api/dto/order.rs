//! Order DTOs.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Order, OrderItem, PaymentResult, ShippingAddress};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub product_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub quantity: i32,
    /// Unit price
    #[schema(value_type = String, example = "19.99")]
    pub price: BigDecimal,
}

impl From<OrderItemDto> for OrderItem {
    fn from(dto: OrderItemDto) -> Self {
        Self {
            product_id: dto.product_id,
            name: dto.name,
            image: dto.image,
            quantity: dto.quantity,
            price: dto.price,
        }
    }
}

impl From<OrderItem> for OrderItemDto {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name,
            image: item.image,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressDto {
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
}

impl From<ShippingAddressDto> for ShippingAddress {
    fn from(dto: ShippingAddressDto) -> Self {
        Self {
            address: dto.address,
            city: dto.city,
            postal_code: dto.postal_code,
            country: dto.country,
        }
    }
}

impl From<ShippingAddress> for ShippingAddressDto {
    fn from(address: ShippingAddress) -> Self {
        Self {
            address: address.address,
            city: address.city,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

/// Checkout request. Amounts are computed by the server from the line items.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[validate(nested)]
    pub order_items: Vec<OrderItemDto>,
    #[validate(nested)]
    pub shipping_address: ShippingAddressDto,
    #[validate(length(min = 1, max = 100, message = "Payment method is required"))]
    pub payment_method: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct Payer {
    pub email_address: String,
}

/// Payment provider confirmation, as posted by the checkout client.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PaymentRequest {
    pub id: String,
    pub status: String,
    pub update_time: String,
    pub payer: Payer,
}

impl From<PaymentRequest> for PaymentResult {
    fn from(req: PaymentRequest) -> Self {
        Self {
            id: req.id,
            status: req.status,
            update_time: req.update_time,
            email_address: req.payer.email_address,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResultDto {
    pub id: String,
    pub status: String,
    pub update_time: String,
    pub email_address: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i32,
    pub user_id: i32,
    pub order_items: Vec<OrderItemDto>,
    pub shipping_address: ShippingAddressDto,
    pub payment_method: String,
    #[schema(value_type = String)]
    pub items_price: BigDecimal,
    #[schema(value_type = String)]
    pub tax_price: BigDecimal,
    #[schema(value_type = String)]
    pub shipping_price: BigDecimal,
    #[schema(value_type = String)]
    pub total_price: BigDecimal,
    pub is_paid: bool,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub paid_at: Option<jiff::Timestamp>,
    pub payment_result: Option<PaymentResultDto>,
    pub is_delivered: bool,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub delivered_at: Option<jiff::Timestamp>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: jiff::Timestamp,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            order_items: order.order_items.0.into_iter().map(OrderItemDto::from).collect(),
            shipping_address: order.shipping_address.into(),
            payment_method: order.payment_method,
            items_price: order.items_price,
            tax_price: order.tax_price,
            shipping_price: order.shipping_price,
            total_price: order.total_price,
            is_paid: order.is_paid,
            paid_at: order.paid_at.map(|t| t.to_jiff()),
            payment_result: order.payment_result.map(|p| PaymentResultDto {
                id: p.id,
                status: p.status,
                update_time: p.update_time,
                email_address: p.email_address,
            }),
            is_delivered: order.is_delivered,
            delivered_at: order.delivered_at.map(|t| t.to_jiff()),
            created_at: order.created_at.to_jiff(),
        }
    }
}
