//! HTTP API layer: handlers, middleware, DTOs and localized messages.

pub mod dto;
pub mod handlers;
pub mod messages;
pub mod middleware;
pub mod routes;
mod doc;
