//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `user` / `auth` - Account, session and token DTOs
//! - `product` - Catalog, search and review DTOs
//! - `order` - Checkout and fulfillment DTOs
//! - `error` - Common error and acknowledgement DTOs

mod auth;
mod error;
mod order;
mod product;
mod user;

pub use auth::RefreshTokenRequest;
pub use error::{ErrorResponse, MessageResponse};
pub use order::{
    CreateOrderRequest, OrderItemDto, OrderResponse, Payer, PaymentRequest, PaymentResultDto,
    ShippingAddressDto,
};
pub use product::{
    CreateProductRequest, ProductPageResponse, ProductResponse, ProductSearchParams,
    ReviewRequest, ReviewResponse, UpdateProductRequest,
};
pub use user::{
    AdminUpdateUserRequest, AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest,
    UserResponse,
};
