use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{self, movies, users};
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Accounts and sessions
        .route("/register/", post(users::register))
        .route("/login/", post(users::login))
        .route("/logout/", post(users::logout))
        .route("/session/", post(users::update_session))
        .route("/secret/", post(users::secret))
        // Movies
        .route("/movie/search/", post(movies::search))
        .route("/movie/add/", post(movies::add))
        .route("/movie/get/", post(movies::list))
        .route("/movie/move/", post(movies::move_movie))
        .fallback(handlers::not_found)
        .layer(
            // Outermost first: the request id must exist before the trace span is made
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
