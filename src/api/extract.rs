use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
        HeaderMap,
    },
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AuthError};

/// Pulls the bearer token out of the `Authorization` header
///
/// The literal `Bearer` is stripped and the rest trimmed; what remains must be non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = header.replace("Bearer", "");
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token.to_string())
}

/// Extractor for the raw bearer token; validating it is up to the handler
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(bearer_token(&parts.headers)?))
    }
}

/// JSON request body whose rejections use the `{"error": ...}` envelope
///
/// Requests that declare a content type go through `axum::Json`. Bodies sent
/// without one (`curl -d '{...}'`) are parsed as JSON anyway.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if request.headers().contains_key(CONTENT_TYPE) {
            let Json(value) = Json::<T>::from_request(request, state).await?;
            return Ok(JsonBody(value));
        }

        let body = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        let value = serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Failed to parse the request body as JSON: {}", e)))?;

        Ok(JsonBody(value))
    }
}

/// Unwraps a required request field
pub fn required<T>(value: Option<T>, message: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(message.to_string()))
}
