use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        extract::{required, BearerToken, JsonBody},
        AppState,
    },
    error::{AppError, AppResult, AuthError},
    models::User,
    services::{
        credentials::{self, Registration},
        sessions,
    },
};

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    fn into_parts(self) -> AppResult<(String, String)> {
        const MESSAGE: &str = "Invalid username or password";
        Ok((
            required(self.username, MESSAGE)?,
            required(self.password, MESSAGE)?,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_token: String,
    pub session_expiration: DateTime<Utc>,
    pub update_token: String,
}

impl From<&User> for SessionResponse {
    fn from(user: &User) -> Self {
        Self {
            session_token: user.session_token.clone(),
            session_expiration: user.session_expiration,
            update_token: user.update_token.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

// Handlers

/// Registers a new account and returns its first session
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> AppResult<Json<SessionResponse>> {
    let (username, password) = request.into_parts()?;

    match credentials::create(
        state.store.as_ref(),
        &state.auth,
        &username,
        &password,
        Utc::now(),
    )
    .await?
    {
        Registration::Created(user) => Ok(Json(SessionResponse::from(&user))),
        Registration::Existing(_) => Err(AppError::Conflict("User already exists".to_string())),
    }
}

/// Checks credentials and returns the user's current session
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> AppResult<Json<SessionResponse>> {
    let (username, password) = request.into_parts()?;

    let user = credentials::verify(state.store.as_ref(), &username, &password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(SessionResponse::from(&user)))
}

/// Expires the session named by the bearer token
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<MessageResponse>> {
    let now = Utc::now();
    let user = sessions::authenticate(state.store.as_ref(), &token, now).await?;
    sessions::invalidate(state.store.as_ref(), &user, now).await?;

    Ok(MessageResponse::new("User has successfully logged out"))
}

/// Rotates both tokens; the bearer token here is the update token
pub async fn update_session(
    State(state): State<AppState>,
    BearerToken(update_token): BearerToken,
) -> AppResult<Json<SessionResponse>> {
    let user = sessions::renew(state.store.as_ref(), &state.auth, &update_token, Utc::now()).await?;
    Ok(Json(SessionResponse::from(&user)))
}

/// Protected endpoint for checking that a session token works
pub async fn secret(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<MessageResponse>> {
    sessions::authenticate(state.store.as_ref(), &token, Utc::now()).await?;
    Ok(MessageResponse::new("Wow we implemented session token!!"))
}
