/// Request extractors
///
/// Thin wrappers around axum's extractors whose rejections are [`ApiError`]s, so malformed
/// bodies and path segments get the same `{"error": ...}` body as every other failure.

use crate::error::{ApiError, ApiResult};
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

/// JSON request body
///
/// Rejects missing content type, bad syntax and type mismatches with 400.
///
/// # Example
///
/// ```ignore
/// async fn create(Payload(draft): Payload<CreateUser>) -> ApiResult<Json<User>> { ... }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Parses a numeric id path segment
pub fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid id '{}'. Use an integer", raw)))
}
