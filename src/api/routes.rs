//! Router configuration for the API.

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    auth_middleware, error_envelope_middleware, logging_middleware, request_id_middleware,
};
use crate::state::AppState;

/// Creates the application router with all routes, docs and middleware.
///
/// # Middleware Order
/// Last added runs first, so a request passes through:
/// 1. CORS and compression
/// 2. Request id (generates or propagates `x-request-id`)
/// 3. Logging (span keyed by the request id)
/// 4. Error envelope (request id and language on error bodies)
/// 5. Bearer authentication
///
/// # Routes
/// - `/api/users`, `/api/auth`, `/api/products`, `/api/orders`, `/api/health`
/// - `/swagger-ui` and `/api-docs/openapi.json`
pub fn create_router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/users", handlers::users::user_routes())
        .nest("/api/auth", handlers::auth::auth_routes())
        .nest("/api/products", handlers::products::product_routes())
        .nest("/api/orders", handlers::orders::order_routes())
        .nest("/api", handlers::health::health_routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(error_envelope_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, User};
    use crate::repositories::EntityStore;
    use crate::state::test_state;
    use crate::utils::password::hash_password;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        state: AppState,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let state = test_state();
            let router = create_router(state.clone());
            Self { state, router }
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
            lang: Option<&str>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            if let Some(lang) = lang {
                builder = builder.header(header::ACCEPT_LANGUAGE, lang);
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn register(&self, first: &str, email: &str) -> String {
            let (status, body) = self
                .call(
                    Method::POST,
                    "/api/users",
                    None,
                    Some(json!({
                        "firstName": first,
                        "lastName": "Tester",
                        "email": email,
                        "password": "secret123"
                    })),
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["accessToken"].as_str().unwrap().to_string()
        }

        async fn admin_token(&self) -> String {
            let admin: User = self
                .state
                .repos
                .users
                .insert(NewUser {
                    first_name: "Root".into(),
                    last_name: "Admin".into(),
                    email: "admin@example.com".into(),
                    password: hash_password("admin-pass").unwrap(),
                    is_admin: true,
                })
                .await
                .unwrap();
            self.state.jwt.issue(&admin).unwrap().access_token
        }

        async fn create_product(&self, admin: &str, name: &str) -> i32 {
            let (status, body) = self
                .call(
                    Method::POST,
                    "/api/products",
                    Some(admin),
                    Some(json!({
                        "name": name,
                        "brand": "Acme",
                        "category": "Electronics",
                        "description": "A thing",
                        "price": "22.49",
                        "countInStock": 5
                    })),
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["id"].as_i64().unwrap() as i32
        }
    }

    #[tokio::test]
    async fn test_health_and_docs() {
        let app = TestApp::new();

        let (status, body) = app.call(Method::GET, "/api/health", None, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = app
            .call(Method::GET, "/api-docs/openapi.json", None, None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/products/{id}/reviews"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_route_gets_json_error_with_request_id() {
        let app = TestApp::new();
        let request = Request::builder()
            .uri("/api/nope")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-request-id"], "req-42");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["request_id"], "req-42");
    }

    #[tokio::test]
    async fn test_register_login_and_profile() {
        let app = TestApp::new();
        let token = app.register("Ada", "Ada@Example.com").await;

        let (status, body) = app
            .call(Method::GET, "/api/users/profile", Some(&token), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("password").is_none());

        let (status, _) = app
            .call(
                Method::POST,
                "/api/users/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "secret123" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .call(
                Method::POST,
                "/api/users",
                None,
                Some(json!({
                    "firstName": "Ada",
                    "lastName": "Again",
                    "email": "ada@example.com",
                    "password": "secret123"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT, "{body}");
    }

    #[tokio::test]
    async fn test_failed_login_is_localized() {
        let app = TestApp::new();
        app.register("Ada", "ada@example.com").await;

        let credentials = json!({ "email": "ada@example.com", "password": "wrong" });
        let (status, body) = app
            .call(Method::POST, "/api/users/login", None, Some(credentials.clone()), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid email or password");

        let (status, body) = app
            .call(
                Method::POST,
                "/api/users/login",
                None,
                Some(credentials),
                Some("fr-FR,fr;q=0.9"),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "L'adresse e-mail ou le mot de passe est invalide.");
    }

    #[tokio::test]
    async fn test_admin_routes_need_admin() {
        let app = TestApp::new();
        let customer = app.register("Ada", "ada@example.com").await;

        let (status, _) = app.call(Method::GET, "/api/users", None, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .call(Method::GET, "/api/users", Some(&customer), None, None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = app.admin_token().await;
        let (status, body) = app
            .call(Method::GET, "/api/users", Some(&admin), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_review_lifecycle() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        let ada = app.register("Ada", "ada@example.com").await;
        let bob = app.register("Bob", "bob@example.com").await;
        let id = app.create_product(&admin, "Headphones").await;
        let reviews = format!("/api/products/{id}/reviews");

        let review = json!({ "rating": 4, "comment": "Solid" });
        let (status, body) = app
            .call(Method::POST, &reviews, Some(&ada), Some(review.clone()), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Review added");

        let (status, _) = app
            .call(Method::POST, &reviews, Some(&ada), Some(review), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, product) = app
            .call(Method::GET, &format!("/api/products/{id}"), None, None, None)
            .await;
        assert_eq!(product["numReviews"], 1);
        assert_eq!(product["rating"], 4.0);
        assert_eq!(product["reviews"][0]["name"], "Ada Tester");
        let review_id = product["reviews"][0]["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .call(
                Method::DELETE,
                &format!("{reviews}/{review_id}"),
                Some(&bob),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .call(
                Method::DELETE,
                &format!("{reviews}/{review_id}"),
                Some(&ada),
                None,
                Some("fr"),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Avis supprimé.");

        let (_, product) = app
            .call(Method::GET, &format!("/api/products/{id}"), None, None, None)
            .await;
        assert_eq!(product["numReviews"], 0);
        assert_eq!(product["rating"], 0.0);
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_rejected() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        let ada = app.register("Ada", "ada@example.com").await;
        let id = app.create_product(&admin, "Headphones").await;

        let (status, body) = app
            .call(
                Method::POST,
                &format!("/api/products/{id}/reviews"),
                Some(&ada),
                Some(json!({ "rating": 6, "comment": "Too good" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_registration_rejects_bad_email_and_short_password() {
        let app = TestApp::new();

        let (status, body) = app
            .call(
                Method::POST,
                "/api/users",
                None,
                Some(json!({
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "email": "not-an-email",
                    "password": "x"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["details"]["errors"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["field"].as_str())
            .collect();
        assert_eq!(fields, vec!["email", "password"]);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/users/login",
                None,
                Some(json!({ "email": "not-an-email", "password": "x" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected() {
        let app = TestApp::new();
        let admin = app.admin_token().await;

        let (status, body) = app
            .call(
                Method::POST,
                "/api/products",
                Some(&admin),
                Some(json!({
                    "name": "Mouse",
                    "brand": "Acme",
                    "category": "Electronics",
                    "price": "-5.00",
                    "countInStock": 3
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let id = app.create_product(&admin, "Keyboard").await;
        let (status, _) = app
            .call(
                Method::PUT,
                &format!("/api/products/{id}"),
                Some(&admin),
                Some(json!({ "price": "-1" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, product) = app
            .call(Method::GET, &format!("/api/products/{id}"), None, None, None)
            .await;
        assert_eq!(product["price"], "22.49");
    }

    #[tokio::test]
    async fn test_search_defaults_and_filters() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        app.create_product(&admin, "Airpods Wireless").await;
        app.create_product(&admin, "Cannon Camera").await;

        let (status, body) = app
            .call(
                Method::GET,
                "/api/products?keyword=AIRPODS&pageNumber=abc&pageSize=-3",
                None,
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 1);
        assert_eq!(body["total"], 1);
        assert_eq!(body["products"][0]["name"], "Airpods Wireless");

        let (_, body) = app.call(Method::GET, "/api/products", None, None, None).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["pages"], 1);
    }

    #[tokio::test]
    async fn test_order_lifecycle() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        let ada = app.register("Ada", "ada@example.com").await;
        let bob = app.register("Bob", "bob@example.com").await;
        let product_id = app.create_product(&admin, "Headphones").await;

        let (status, order) = app
            .call(
                Method::POST,
                "/api/orders",
                Some(&ada),
                Some(json!({
                    "orderItems": [{
                        "productId": product_id,
                        "name": "Headphones",
                        "quantity": 2,
                        "price": "22.49"
                    }],
                    "shippingAddress": {
                        "address": "1 Main St",
                        "city": "Paris",
                        "postalCode": "75001",
                        "country": "France"
                    },
                    "paymentMethod": "PayPal"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{order}");
        assert_eq!(order["itemsPrice"], "44.98");
        assert_eq!(order["isPaid"], false);
        let id = order["id"].as_i64().unwrap();

        let (status, _) = app
            .call(Method::GET, &format!("/api/orders/{id}"), Some(&bob), None, None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, mine) = app
            .call(Method::GET, "/api/orders/mine", Some(&ada), None, None)
            .await;
        assert_eq!(mine.as_array().unwrap().len(), 1);

        let (status, paid) = app
            .call(
                Method::PUT,
                &format!("/api/orders/{id}/pay"),
                Some(&ada),
                Some(json!({
                    "id": "PAY-1",
                    "status": "COMPLETED",
                    "update_time": "2026-01-01T00:00:00Z",
                    "payer": { "email_address": "ada@example.com" }
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["isPaid"], true);

        let (status, _) = app
            .call(Method::PUT, &format!("/api/orders/{id}/deliver"), Some(&ada), None, None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, delivered) = app
            .call(Method::PUT, &format!("/api/orders/{id}/deliver"), Some(&admin), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(delivered["isDelivered"], true);
        assert_eq!(delivered["paidAt"], paid["paidAt"]);
        assert_eq!(delivered["paymentResult"]["id"], "PAY-1");
    }

    #[tokio::test]
    async fn test_user_owning_orders_cannot_be_deleted() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        let ada = app.register("Ada", "ada@example.com").await;
        let bob = app.register("Bob", "bob@example.com").await;
        let product_id = app.create_product(&admin, "Headphones").await;

        let (status, _) = app
            .call(
                Method::POST,
                "/api/orders",
                Some(&ada),
                Some(json!({
                    "orderItems": [{
                        "productId": product_id,
                        "name": "Headphones",
                        "quantity": 1,
                        "price": "22.49"
                    }],
                    "shippingAddress": {
                        "address": "1 Main St",
                        "city": "Paris",
                        "postalCode": "75001",
                        "country": "France"
                    },
                    "paymentMethod": "PayPal"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, profile) = app
            .call(Method::GET, "/api/users/profile", Some(&ada), None, None)
            .await;
        let ada_id = profile["id"].as_i64().unwrap();
        let (status, body) = app
            .call(Method::DELETE, &format!("/api/users/{ada_id}"), Some(&admin), None, None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT, "{body}");
        assert_eq!(body["message"], "User has orders");

        let (status, body) = app
            .call(
                Method::DELETE,
                &format!("/api/users/{ada_id}"),
                Some(&admin),
                None,
                Some("fr"),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body["message"],
            "Cet utilisateur possède encore des commandes ou des produits."
        );

        let (_, profile) = app
            .call(Method::GET, "/api/users/profile", Some(&bob), None, None)
            .await;
        let bob_id = profile["id"].as_i64().unwrap();
        let (status, _) = app
            .call(Method::DELETE, &format!("/api/users/{bob_id}"), Some(&admin), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_after_delete_is_not_found() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        let id = app.create_product(&admin, "Headphones").await;
        let uri = format!("/api/products/{id}");

        let (status, body) = app.call(Method::DELETE, &uri, Some(&admin), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Product removed");

        let (status, body) = app.call(Method::GET, &uri, None, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
