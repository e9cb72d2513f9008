//! Domain models for users, products and orders.
//!
//! Each persisted model implements [`Entity`], which ties it to the payload
//! used to create it and the changeset used to update it.

mod document;
mod order;
mod product;
mod user;

pub use order::{
    NewOrder, Order, OrderItem, OrderItems, PaymentResult, ShippingAddress, UpdateOrder,
};
pub use product::{NewProduct, Product, ProductFilter, Review, Reviews, UpdateProduct};
pub use user::{NewUser, UpdateUser, User};

/// A stored document with a store-assigned integer id.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Lowercase entity name used in errors and logs
    const KIND: &'static str;

    /// Creation payload
    type New: Send + 'static;

    /// Shallow-merge changeset; `None` fields are left untouched
    type Changes: Send + 'static;

    fn id(&self) -> i32;
}

impl Entity for User {
    const KIND: &'static str = "user";
    type New = NewUser;
    type Changes = UpdateUser;

    fn id(&self) -> i32 {
        self.id
    }
}

impl Entity for Product {
    const KIND: &'static str = "product";
    type New = NewProduct;
    type Changes = UpdateProduct;

    fn id(&self) -> i32 {
        self.id
    }
}

impl Entity for Order {
    const KIND: &'static str = "order";
    type New = NewOrder;
    type Changes = UpdateOrder;

    fn id(&self) -> i32 {
        self.id
    }
}
