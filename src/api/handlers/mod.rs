use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::AppError;

pub mod movies;
pub mod users;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Unmatched paths get the same error envelope as every other failure
pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
