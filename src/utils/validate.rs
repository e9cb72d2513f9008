use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// JSON body extractor that runs `validator` rules before the handler sees the value.
///
/// Malformed JSON and rule violations both surface as `AppError::InvalidInput`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::invalid_input("body", rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct TestReview {
        #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
        rating: i32,
        #[validate(length(min = 1, message = "Comment is required"))]
        comment: String,
    }

    fn json_request(body: &str, content_type: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let request = json_request(r#"{"rating":4,"comment":"Solid"}"#, "application/json");

        let ValidatedJson(review) = ValidatedJson::<TestReview>::from_request(request, &())
            .await
            .unwrap();

        assert_eq!(review.rating, 4);
        assert_eq!(review.comment, "Solid");
    }

    #[tokio::test]
    async fn test_rule_violations_are_reported_per_field() {
        let request = json_request(r#"{"rating":9,"comment":""}"#, "application/json");

        match ValidatedJson::<TestReview>::from_request(request, &()).await {
            Err(AppError::InvalidInput { errors }) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["comment", "rating"]);
                assert!(errors[1].reason.contains("between 1 and 5"));
            }
            other => panic!("Expected InvalidInput, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_missing_field_is_invalid_input() {
        let request = json_request(r#"{"rating":3}"#, "application/json");

        match ValidatedJson::<TestReview>::from_request(request, &()).await {
            Err(AppError::InvalidInput { errors }) => assert_eq!(errors[0].field, "body"),
            other => panic!("Expected InvalidInput, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_invalid_input() {
        let request = json_request(r#"{"rating":3,"comment":"ok"}"#, "text/plain");

        let result = ValidatedJson::<TestReview>::from_request(request, &()).await;
        assert!(matches!(result, Err(AppError::InvalidInput { .. })));
    }
}
