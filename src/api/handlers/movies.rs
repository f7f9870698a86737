use std::collections::BTreeMap;
use std::fmt::Display;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    api::{
        extract::{required, JsonBody},
        AppState,
    },
    error::{AppError, AppResult},
    models::{ListKind, MovieView},
    services::{catalog, ledger, sessions},
};

// Request types

/// External IDs arrive either as strings (`"tt1375666"`) or bare numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Text(String),
    Number(u64),
}

impl Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalId::Text(id) => write!(f, "{}", id),
            ExternalId::Number(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMovieRequest {
    #[serde(rename = "movieID")]
    pub movie_id: Option<ExternalId>,
    pub session_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListMoviesRequest {
    pub session_token: Option<String>,
    pub watched: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct MoveMovieRequest {
    pub session_token: Option<String>,
    pub title: Option<String>,
    pub watched: Option<bool>,
}

// Handlers

/// Up to five `"Title (Year)"` → external ID matches
pub async fn search(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SearchRequest>,
) -> AppResult<Json<BTreeMap<String, String>>> {
    let title = required(request.title, "Title not present")?;

    let results = catalog::search(
        state.movie_provider.as_ref(),
        &title,
        state.metadata_timeout,
    )
    .await?;

    Ok(Json(results))
}

/// Adds a movie to the caller's watch list by external ID
pub async fn add(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AddMovieRequest>,
) -> AppResult<(StatusCode, Json<MovieView>)> {
    let movie_id = required(request.movie_id, "movieID not present")?;
    let session_token = required(request.session_token, "session_token not present")?;

    let store = state.store.as_ref();
    let user = sessions::resolve_user(store, &session_token, Utc::now()).await?;

    // Fetch before writing so the transaction never waits on the network
    let new_movie = catalog::fetch(
        state.movie_provider.as_ref(),
        &movie_id.to_string(),
        state.metadata_timeout,
    )
    .await?;

    let movie = ledger::add_to_watch_list(store, &user, &new_movie).await?;
    let view = ledger::describe(store, movie).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the caller's watch list or watched list
pub async fn list(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ListMoviesRequest>,
) -> AppResult<Json<Map<String, Value>>> {
    let session_token = required(request.session_token, "Session token not present")?;
    let watched = required(request.watched, "Watched not present")?;

    let store = state.store.as_ref();
    let user = sessions::resolve_user(store, &session_token, Utc::now()).await?;
    let movies = ledger::list(store, &user, watched).await?;

    let mut body = Map::new();
    body.insert(
        ListKind::from_watched(watched).response_key().to_string(),
        serde_json::to_value(movies).map_err(|e| AppError::Internal(e.to_string()))?,
    );

    Ok(Json(body))
}

/// Moves a movie between the caller's lists; `watched` names the destination
pub async fn move_movie(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<MoveMovieRequest>,
) -> AppResult<(StatusCode, Json<MovieView>)> {
    let session_token = required(request.session_token, "Session token not present")?;
    let title = required(request.title, "Title not present")?;
    let watched = required(request.watched, "Watched not present")?;

    let store = state.store.as_ref();
    let user = sessions::resolve_user(store, &session_token, Utc::now()).await?;
    let movie = ledger::move_movie(store, &user, &title, watched).await?;
    let view = ledger::describe(store, movie).await?;

    Ok((StatusCode::CREATED, Json(view)))
}
