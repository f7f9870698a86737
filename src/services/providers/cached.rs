use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::{MovieCandidate, MovieDetails},
    services::providers::MovieProvider,
};

/// Wraps another provider with Redis read-through caching
///
/// Both lookups are read-only, so cached answers are safe to reuse for the TTL.
#[derive(Clone)]
pub struct CachedProvider {
    inner: Arc<dyn MovieProvider>,
    cache: Cache,
    ttl: u64,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn MovieProvider>, cache: Cache, ttl: u64) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait::async_trait]
impl MovieProvider for CachedProvider {
    async fn search_movies(&self, title: &str) -> AppResult<Vec<MovieCandidate>> {
        cached!(
            self.cache,
            CacheKey::MovieSearch(title.to_string()),
            self.ttl,
            self.inner.search_movies(title)
        )
    }

    async fn fetch_details(&self, external_id: &str) -> AppResult<MovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(external_id.to_string()),
            self.ttl,
            self.inner.fetch_details(external_id)
        )
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
