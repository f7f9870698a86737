use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::NewMovie,
    services::providers::MovieProvider,
};

/// Maximum number of candidates returned by a search
pub const SEARCH_LIMIT: usize = 5;

/// Searches the provider and maps `"Title (Year)"` labels to external IDs
///
/// Keeps the first candidate when two share a label.
pub async fn search(
    provider: &dyn MovieProvider,
    title: &str,
    timeout: Duration,
) -> AppResult<BTreeMap<String, String>> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title not present".to_string()));
    }

    let candidates = bounded(provider.name(), timeout, provider.search_movies(title)).await?;

    let mut results = BTreeMap::new();
    for candidate in candidates {
        if results.len() == SEARCH_LIMIT {
            break;
        }
        results
            .entry(candidate.label())
            .or_insert(candidate.external_id);
    }

    Ok(results)
}

/// Fetches details for an external ID and normalizes them into a catalog row
///
/// Runs before any write so that a slow provider never holds a transaction open.
pub async fn fetch(
    provider: &dyn MovieProvider,
    external_id: &str,
    timeout: Duration,
) -> AppResult<NewMovie> {
    let external_id = external_id.trim();
    if external_id.is_empty() {
        return Err(AppError::Validation("movieID not present".to_string()));
    }

    let details = bounded(provider.name(), timeout, provider.fetch_details(external_id)).await?;
    Ok(NewMovie::from(details))
}

/// Applies the lookup timeout and turns transport failures into upstream errors
async fn bounded<T>(
    provider: &'static str,
    timeout: Duration,
    lookup: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(AppError::HttpClient(e))) => {
            tracing::warn!(provider, error = %e, "Metadata lookup failed");
            Err(AppError::Upstream(format!("{} lookup failed", provider)))
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            tracing::warn!(provider, timeout_ms = timeout.as_millis() as u64, "Metadata lookup timed out");
            Err(AppError::Upstream(format!("{} lookup timed out", provider)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieCandidate, MovieDetails};
    use crate::services::providers::MockMovieProvider;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn candidate(title: &str, year: i32, id: &str) -> MovieCandidate {
        MovieCandidate {
            title: title.to_string(),
            year: Some(year),
            external_id: id.to_string(),
        }
    }

    fn mock_provider() -> MockMovieProvider {
        let mut provider = MockMovieProvider::new();
        provider.expect_name().return_const("mock");
        provider
    }

    #[tokio::test]
    async fn test_search_limits_results() {
        let mut provider = mock_provider();
        provider.expect_search_movies().returning(|_| {
            Ok((0..8)
                .map(|i| candidate("Batman", 1990 + i, &format!("tt{}", i)))
                .collect())
        });

        let results = search(&provider, "Batman", TIMEOUT).await.unwrap();
        assert_eq!(results.len(), SEARCH_LIMIT);
        assert_eq!(results.get("Batman (1990)").map(String::as_str), Some("tt0"));
    }

    #[tokio::test]
    async fn test_search_keeps_first_duplicate_label() {
        let mut provider = mock_provider();
        provider.expect_search_movies().returning(|_| {
            Ok(vec![
                candidate("Dune", 2021, "tt1160419"),
                candidate("Dune", 2021, "tt9999999"),
            ])
        });

        let results = search(&provider, "Dune", TIMEOUT).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results["Dune (2021)"], "tt1160419");
    }

    #[tokio::test]
    async fn test_search_skips_duplicates_before_limiting() {
        let mut provider = mock_provider();
        provider.expect_search_movies().returning(|_| {
            let mut hits = vec![
                candidate("Dune", 2021, "tt1160419"),
                candidate("Dune", 2021, "tt9999999"),
            ];
            hits.extend((0..6).map(|i| candidate("Dune", 1984 + i, &format!("tt{}", i))));
            Ok(hits)
        });

        let results = search(&provider, "Dune", TIMEOUT).await.unwrap();
        assert_eq!(results.len(), SEARCH_LIMIT);
        assert_eq!(results["Dune (2021)"], "tt1160419");
        assert_eq!(results["Dune (1987)"], "tt3");
        assert!(!results.contains_key("Dune (1988)"));
    }

    #[tokio::test]
    async fn test_search_rejects_blank_title() {
        let provider = mock_provider();
        let err = search(&provider, "   ", TIMEOUT).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_fetch_normalizes_details() {
        let mut provider = mock_provider();
        provider
            .expect_fetch_details()
            .withf(|id: &str| id == "tt0133093")
            .returning(|_| {
                Ok(MovieDetails {
                    title: "The Matrix".to_string(),
                    genres: vec!["Action".to_string(), "Sci-Fi".to_string()],
                    directors: vec!["Lana Wachowski".to_string(), "Lilly Wachowski".to_string()],
                    year: Some(1999),
                    runtimes: vec![136],
                    rating: Some(8.7),
                    plot_outline: None,
                })
            });

        let movie = fetch(&provider, "tt0133093", TIMEOUT).await.unwrap();
        assert_eq!(movie.director, "Lana Wachowski, Lilly Wachowski");
        assert_eq!(movie.genres, "Action, Sci-Fi");
        assert_eq!(movie.runtime_minutes, Some(136));
    }

    #[tokio::test]
    async fn test_fetch_passes_not_found_through() {
        let mut provider = mock_provider();
        provider
            .expect_fetch_details()
            .returning(|id| Err(AppError::NotFound(format!("Movie {} not found", id))));

        let err = fetch(&provider, "tt0000000", TIMEOUT).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    struct SlowProvider;

    #[async_trait::async_trait]
    impl MovieProvider for SlowProvider {
        async fn search_movies(&self, _title: &str) -> AppResult<Vec<MovieCandidate>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }

        async fn fetch_details(&self, _external_id: &str) -> AppResult<MovieDetails> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(AppError::Internal("unreachable".to_string()))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out_as_upstream() {
        let timeout = Duration::from_millis(20);

        let err = search(&SlowProvider, "Inception", timeout).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref msg) if msg == "slow lookup timed out"));

        let err = fetch(&SlowProvider, "tt1375666", timeout).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    /// Makes real requests against a closed local port
    struct UnreachableProvider;

    #[async_trait::async_trait]
    impl MovieProvider for UnreachableProvider {
        async fn search_movies(&self, _title: &str) -> AppResult<Vec<MovieCandidate>> {
            reqwest::get("http://127.0.0.1:1/").await?;
            Ok(vec![])
        }

        async fn fetch_details(&self, _external_id: &str) -> AppResult<MovieDetails> {
            reqwest::get("http://127.0.0.1:1/").await?;
            Err(AppError::Internal("unreachable".to_string()))
        }

        fn name(&self) -> &'static str {
            "unreachable"
        }
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_upstream() {
        let err = search(&UnreachableProvider, "Inception", TIMEOUT).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref msg) if msg == "unreachable lookup failed"));

        let err = fetch(&UnreachableProvider, "tt1375666", TIMEOUT).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref msg) if msg == "unreachable lookup failed"));
    }
}
