/// OMDb API provider
///
/// API Flow:
/// 1. Title Search: `/?s={title}&type=movie` → title, year and IMDb ID per hit
/// 2. Details: `/?i={imdb_id}&plot=short` → genres, directors, runtime, rating, plot
///
/// OMDb answers HTTP 200 for "not found" and reports the outcome in the
/// `Response`/`Error` fields, and uses the literal `"N/A"` for missing values.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{MovieCandidate, MovieDetails},
    services::providers::MovieProvider,
};

const MISSING: &str = "N/A";
const NOT_FOUND_ERROR: &str = "Movie not found!";
const INCORRECT_ID_ERROR: &str = "Incorrect IMDb ID.";

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

/// Search response envelope
#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<OmdbSearchHit>,
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchHit {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

impl From<OmdbSearchHit> for MovieCandidate {
    fn from(hit: OmdbSearchHit) -> Self {
        MovieCandidate {
            title: hit.title,
            year: parse_year(&hit.year),
            external_id: hit.imdb_id,
        }
    }
}

/// Details response; every field is optional because errors reuse the same shape
#[derive(Debug, Deserialize)]
struct OmdbMovie {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Runtime", default)]
    runtime: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
}

impl TryFrom<OmdbMovie> for MovieDetails {
    type Error = AppError;

    fn try_from(movie: OmdbMovie) -> Result<Self, Self::Error> {
        let title = present(movie.title)
            .ok_or_else(|| AppError::Upstream("OMDb response is missing a title".to_string()))?;

        Ok(MovieDetails {
            title,
            genres: split_list(movie.genre.as_deref()),
            directors: split_list(movie.director.as_deref()),
            year: movie.year.as_deref().and_then(parse_year),
            runtimes: movie
                .runtime
                .as_deref()
                .and_then(parse_runtime)
                .into_iter()
                .collect(),
            rating: present(movie.imdb_rating).and_then(|r| r.parse().ok()),
            plot_outline: present(movie.plot),
        })
    }
}

/// Drops OMDb's `"N/A"` placeholder
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != MISSING)
}

/// `"Action, Adventure"` → `["Action", "Adventure"]`
fn split_list(value: Option<&str>) -> Vec<String> {
    match value {
        Some(v) if v != MISSING => v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Leading four digits of `"2010"` or `"2008–2013"`
fn parse_year(value: &str) -> Option<i32> {
    value.get(..4).and_then(|y| y.parse().ok())
}

/// `"148 min"` → 148
fn parse_runtime(value: &str) -> Option<u32> {
    value.split_whitespace().next().and_then(|m| m.parse().ok())
}

impl OmdbProvider {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> AppResult<T> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, response = %body, "Failed to deserialize OMDb response");
            AppError::Upstream(format!("Failed to parse OMDb response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl MovieProvider for OmdbProvider {
    async fn search_movies(&self, title: &str) -> AppResult<Vec<MovieCandidate>> {
        let results: OmdbSearchResponse = self.get(&[("s", title), ("type", "movie")]).await?;

        if results.response != "True" {
            return match results.error.as_deref() {
                Some(NOT_FOUND_ERROR) | None => Ok(Vec::new()),
                Some(error) => Err(AppError::Upstream(format!("OMDb search failed: {}", error))),
            };
        }

        let candidates: Vec<MovieCandidate> =
            results.search.into_iter().map(MovieCandidate::from).collect();

        tracing::info!(
            query = %title,
            results = candidates.len(),
            provider = "omdb",
            "Movie search completed"
        );

        Ok(candidates)
    }

    async fn fetch_details(&self, external_id: &str) -> AppResult<MovieDetails> {
        let movie: OmdbMovie = self.get(&[("i", external_id), ("plot", "short")]).await?;

        if movie.response != "True" {
            return Err(details_error(external_id, movie.error.as_deref()));
        }

        let details = MovieDetails::try_from(movie)?;

        tracing::info!(
            external_id = %external_id,
            title = %details.title,
            provider = "omdb",
            "Movie details fetched"
        );

        Ok(details)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}

/// Only ID lookup failures mean the movie is absent; any other OMDb error is upstream trouble
fn details_error(external_id: &str, error: Option<&str>) -> AppError {
    match error {
        Some(NOT_FOUND_ERROR) | Some(INCORRECT_ID_ERROR) => {
            tracing::debug!(external_id = %external_id, "OMDb has no such movie");
            AppError::NotFound(format!("Movie {} not found", external_id))
        }
        Some(error) => {
            tracing::warn!(external_id = %external_id, error = %error, "OMDb lookup failed");
            AppError::Upstream(format!("OMDb lookup failed: {}", error))
        }
        None => AppError::Upstream("OMDb lookup failed without an error message".to_string()),
    }
}
