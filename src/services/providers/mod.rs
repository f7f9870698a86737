/// Movie metadata provider abstraction
///
/// The catalog only needs two lookups from an external source: a title search
/// that yields candidates with external IDs, and a details fetch by external
/// ID. Implementations are free to cache (see [`cached::CachedProvider`]).
use crate::{
    error::AppResult,
    models::{MovieCandidate, MovieDetails},
};

pub mod cached;
pub mod omdb;

pub use cached::CachedProvider;
pub use omdb::OmdbProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Search for movies by title, best matches first
    async fn search_movies(&self, title: &str) -> AppResult<Vec<MovieCandidate>>;

    /// Fetch full details for one external ID
    ///
    /// Unknown IDs are reported as `AppError::NotFound`.
    async fn fetch_details(&self, external_id: &str) -> AppResult<MovieDetails>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
