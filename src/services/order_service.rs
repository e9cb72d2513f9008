//! Checkout, payment and delivery for orders.

use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::{BigDecimal, RoundingMode};

use super::Actor;
use super::entity_service::{CrudService, EntityService};
use crate::config::CheckoutConfig;
use crate::error::{AppError, AppResult, FieldError};
use crate::models::{
    NewOrder, Order, OrderItem, OrderItems, PaymentResult, ShippingAddress, UpdateOrder,
};
use crate::repositories::OrderStore;

/// Server-computed order amounts, all at scale 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pricing {
    pub items: BigDecimal,
    pub tax: BigDecimal,
    pub shipping: BigDecimal,
    pub total: BigDecimal,
}

impl Pricing {
    /// Prices a cart, rejecting empty carts and non-positive quantities.
    pub fn compute(items: &[OrderItem], checkout: &CheckoutConfig) -> AppResult<Self> {
        if items.is_empty() {
            return Err(AppError::invalid_input("order_items", "No order items"));
        }

        let mut errors = Vec::new();
        for (i, item) in items.iter().enumerate() {
            if item.quantity <= 0 {
                errors.push(FieldError {
                    field: format!("order_items[{i}].quantity"),
                    reason: "Quantity must be positive".to_string(),
                });
            }
            if item.price < BigDecimal::from(0) {
                errors.push(FieldError {
                    field: format!("order_items[{i}].price"),
                    reason: "Price must not be negative".to_string(),
                });
            }
        }
        if !errors.is_empty() {
            return Err(AppError::InvalidInput { errors });
        }

        let round = |v: BigDecimal| v.with_scale_round(2, RoundingMode::HalfUp);
        let items_price = round(
            items
                .iter()
                .map(|item| &item.price * BigDecimal::from(item.quantity))
                .sum(),
        );
        let shipping = if items_price > checkout.free_shipping_threshold() {
            BigDecimal::from(0)
        } else {
            checkout.shipping_fee()
        };
        let shipping = round(shipping);
        let tax = round(&items_price * checkout.tax_rate());
        let total = round(&items_price + &shipping + &tax);

        Ok(Self {
            items: items_price,
            tax,
            shipping,
            total,
        })
    }
}

#[derive(Clone)]
pub struct OrderService {
    crud: EntityService<Order, dyn OrderStore>,
    checkout: CheckoutConfig,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, checkout: CheckoutConfig) -> Self {
        Self {
            crud: EntityService::new(store),
            checkout,
        }
    }

    /// Places an order for `owner_id` with amounts computed from the line items.
    ///
    /// # Returns
    /// The new unpaid, undelivered order, or `InvalidInput` for an empty cart
    pub async fn place_order(
        &self,
        owner_id: i32,
        items: Vec<OrderItem>,
        shipping_address: ShippingAddress,
        payment_method: String,
    ) -> AppResult<Order> {
        let pricing = Pricing::compute(&items, &self.checkout)?;

        let order = self
            .crud
            .create(NewOrder {
                user_id: owner_id,
                order_items: OrderItems(items),
                shipping_address,
                payment_method,
                items_price: pricing.items,
                tax_price: pricing.tax,
                shipping_price: pricing.shipping,
                total_price: pricing.total,
            })
            .await?;

        tracing::info!(
            order_id = order.id,
            user_id = owner_id,
            total = %order.total_price,
            "Order placed"
        );
        Ok(order)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Order>> {
        self.crud.store().list_all().await
    }

    pub async fn list_by_owner(&self, owner_id: i32) -> AppResult<Vec<Order>> {
        self.crud.store().list_by_owner(owner_id).await
    }

    /// Gets an order the actor may see: its owner or an admin.
    pub async fn get_for(&self, id: i32, actor: Actor) -> AppResult<Order> {
        let order = self.crud.get(id).await?;
        ensure_visible(&order, actor)?;
        Ok(order)
    }

    /// Records a payment confirmation.
    ///
    /// A repeated call overwrites `paid_at` and the stored confirmation.
    pub async fn mark_paid(&self, id: i32, payment: PaymentResult, actor: Actor) -> AppResult<Order> {
        let order = self
            .crud
            .mutate(id, move |order| {
                ensure_visible(order, actor)?;
                order.is_paid = true;
                order.paid_at = Some(jiff::Timestamp::now().into());
                order.payment_result = Some(payment);
                Ok(())
            })
            .await?;

        tracing::info!(order_id = id, user_id = actor.user_id, "Order paid");
        Ok(order)
    }

    /// Flags the order as delivered; payment state is left as is.
    pub async fn mark_delivered(&self, id: i32) -> AppResult<Order> {
        let order = self
            .crud
            .mutate(id, |order| {
                order.is_delivered = true;
                order.delivered_at = Some(jiff::Timestamp::now().into());
                Ok(())
            })
            .await?;

        tracing::info!(order_id = id, "Order delivered");
        Ok(order)
    }
}

fn ensure_visible(order: &Order, actor: Actor) -> AppResult<()> {
    if actor.is_admin || order.user_id == actor.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden {
            message: "Order belongs to another user".to_string(),
        })
    }
}

#[async_trait]
impl CrudService<Order> for OrderService {
    async fn get(&self, id: i32) -> AppResult<Order> {
        self.crud.get(id).await
    }

    async fn create(&self, new: NewOrder) -> AppResult<Order> {
        self.crud.create(new).await
    }

    async fn update(&self, id: i32, changes: UpdateOrder) -> AppResult<Order> {
        self.crud.update(id, changes).await
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        self.crud.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::Repositories;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn item(product_id: i32, quantity: i32, price: &str) -> OrderItem {
        OrderItem {
            product_id,
            name: format!("Product {product_id}"),
            image: String::new(),
            quantity,
            price: dec(price),
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            address: "10 Downing St".into(),
            city: "London".into(),
            postal_code: "SW1A 2AA".into(),
            country: "UK".into(),
        }
    }

    fn service() -> OrderService {
        OrderService::new(Repositories::in_memory().orders, CheckoutConfig::default())
    }

    fn owner(user_id: i32) -> Actor {
        Actor {
            user_id,
            is_admin: false,
        }
    }

    fn payment() -> PaymentResult {
        PaymentResult {
            id: "PAY-1".into(),
            status: "COMPLETED".into(),
            update_time: "2025-01-01T00:00:00Z".into(),
            email_address: "buyer@example.com".into(),
        }
    }

    #[test]
    fn test_pricing_small_cart_pays_shipping() {
        let pricing =
            Pricing::compute(&[item(1, 2, "19.99"), item(2, 1, "5.00")], &CheckoutConfig::default())
                .unwrap();

        assert_eq!(pricing.items, dec("44.98"));
        assert_eq!(pricing.shipping, dec("10.00"));
        assert_eq!(pricing.tax, dec("6.75"));
        assert_eq!(pricing.total, dec("61.73"));
    }

    #[test]
    fn test_pricing_free_shipping_above_threshold() {
        let pricing = Pricing::compute(&[item(1, 1, "100.01")], &CheckoutConfig::default()).unwrap();

        assert_eq!(pricing.shipping, dec("0.00"));
        assert_eq!(pricing.tax, dec("15.00"));
        assert_eq!(pricing.total, dec("115.01"));
    }

    #[test]
    fn test_pricing_threshold_is_exclusive() {
        let pricing = Pricing::compute(&[item(1, 1, "100.00")], &CheckoutConfig::default()).unwrap();
        assert_eq!(pricing.shipping, dec("10.00"));
    }

    #[test]
    fn test_pricing_rejects_bad_carts() {
        let empty = Pricing::compute(&[], &CheckoutConfig::default());
        match empty {
            Err(AppError::InvalidInput { errors }) => assert_eq!(errors[0].reason, "No order items"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }

        let zero = Pricing::compute(&[item(1, 0, "1.00"), item(2, -1, "1.00")], &CheckoutConfig::default());
        match zero {
            Err(AppError::InvalidInput { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_place_order_starts_unpaid_and_undelivered() {
        let order = service()
            .place_order(3, vec![item(1, 1, "10.00")], address(), "PayPal".into())
            .await
            .unwrap();

        assert_eq!(order.user_id, 3);
        assert!(!order.is_paid && !order.is_delivered);
        assert!(order.paid_at.is_none() && order.payment_result.is_none());
        assert_eq!(order.total_price, dec("21.50"));
    }

    #[tokio::test]
    async fn test_pay_then_deliver_keeps_payment() {
        let service = service();
        let order = service
            .place_order(3, vec![item(1, 1, "10.00")], address(), "PayPal".into())
            .await
            .unwrap();

        let paid = service.mark_paid(order.id, payment(), owner(3)).await.unwrap();
        assert!(paid.is_paid);
        assert!(paid.paid_at.is_some());

        let delivered = service.mark_delivered(order.id).await.unwrap();
        assert!(delivered.is_delivered);
        assert!(delivered.delivered_at.is_some());
        assert!(delivered.is_paid);
        assert_eq!(delivered.paid_at, paid.paid_at);
        assert_eq!(delivered.payment_result, Some(payment()));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_sees_order() {
        let service = service();
        let order = service
            .place_order(3, vec![item(1, 1, "10.00")], address(), "PayPal".into())
            .await
            .unwrap();

        assert!(service.get_for(order.id, owner(3)).await.is_ok());
        assert!(
            service
                .get_for(order.id, Actor { user_id: 99, is_admin: true })
                .await
                .is_ok()
        );
        assert!(matches!(
            service.get_for(order.id, owner(4)).await,
            Err(AppError::Forbidden { .. })
        ));
        assert!(matches!(
            service.mark_paid(order.id, payment(), owner(4)).await,
            Err(AppError::Forbidden { .. })
        ));
        assert!(!service.get(order.id).await.unwrap().is_paid);
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let service = service();
        for owner_id in [1, 2, 1] {
            service
                .place_order(owner_id, vec![item(1, 1, "1.00")], address(), "PayPal".into())
                .await
                .unwrap();
        }

        assert_eq!(service.list_by_owner(1).await.unwrap().len(), 2);
        assert_eq!(service.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_mark_delivered_unknown_order() {
        let result = service().mark_delivered(12).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
