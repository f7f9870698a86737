use serde::{Deserialize, Serialize};

use super::UserSummary;

/// Which of a user's two lists an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Movies the user still wants to watch
    Watch,
    /// Movies the user has already watched
    Watched,
}

impl ListKind {
    pub fn from_watched(watched: bool) -> Self {
        if watched {
            ListKind::Watched
        } else {
            ListKind::Watch
        }
    }

    pub fn other(self) -> Self {
        match self {
            ListKind::Watch => ListKind::Watched,
            ListKind::Watched => ListKind::Watch,
        }
    }

    /// Backing association table
    pub fn table(self) -> &'static str {
        match self {
            ListKind::Watch => "user_watch_list",
            ListKind::Watched => "user_watched_list",
        }
    }

    /// Key used for this list in response bodies
    pub fn response_key(self) -> &'static str {
        match self {
            ListKind::Watch => "watch_list",
            ListKind::Watched => "watched_list",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListKind::Watch => "watch list",
            ListKind::Watched => "watched list",
        }
    }
}

/// A cached catalog row. Rows are never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub genres: String,
    pub director: String,
    pub year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub rating: Option<f64>,
    pub plot_outline: Option<String>,
}

/// Normalized metadata ready to be written to the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub genres: String,
    pub director: String,
    pub year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub rating: Option<f64>,
    pub plot_outline: Option<String>,
}

impl NewMovie {
    pub fn into_movie(self, id: i64) -> Movie {
        Movie {
            id,
            title: self.title,
            genres: self.genres,
            director: self.director,
            year: self.year,
            runtime_minutes: self.runtime_minutes,
            rating: self.rating,
            plot_outline: self.plot_outline,
        }
    }
}

impl From<MovieDetails> for NewMovie {
    fn from(details: MovieDetails) -> Self {
        Self {
            director: join_directors(&details.directors),
            genres: details.genres.join(", "),
            runtime_minutes: details
                .runtimes
                .first()
                .and_then(|minutes| i32::try_from(*minutes).ok()),
            title: details.title,
            year: details.year,
            rating: details.rating,
            plot_outline: details.plot_outline,
        }
    }
}

/// Display string for a director list: the first name bare, each later one comma-prefixed
pub fn join_directors(directors: &[String]) -> String {
    let mut joined = String::new();
    for (i, name) in directors.iter().enumerate() {
        if i > 0 {
            joined.push_str(", ");
        }
        joined.push_str(name);
    }
    joined
}

/// One search hit from the metadata provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieCandidate {
    pub title: String,
    pub year: Option<i32>,
    pub external_id: String,
}

impl MovieCandidate {
    /// `"Title (Year)"`, the key clients pick from
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => format!("{} (unknown)", self.title),
        }
    }
}

/// Structured details as reported by the metadata provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub title: String,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub year: Option<i32>,
    /// Runtimes in minutes; some titles report several cuts
    pub runtimes: Vec<u32>,
    pub rating: Option<f64>,
    pub plot_outline: Option<String>,
}

/// A movie together with the users holding it in each list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieView {
    #[serde(flatten)]
    pub movie: Movie,
    pub user_watch_list: Vec<UserSummary>,
    pub user_watched_list: Vec<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inception_details() -> MovieDetails {
        MovieDetails {
            title: "Inception".to_string(),
            genres: vec![
                "Action".to_string(),
                "Adventure".to_string(),
                "Sci-Fi".to_string(),
            ],
            directors: vec!["Christopher Nolan".to_string()],
            year: Some(2010),
            runtimes: vec![148],
            rating: Some(8.8),
            plot_outline: Some("A thief who steals corporate secrets".to_string()),
        }
    }

    #[test]
    fn test_join_directors() {
        assert_eq!(join_directors(&[]), "");
        assert_eq!(join_directors(&["Christopher Nolan".to_string()]), "Christopher Nolan");
        assert_eq!(
            join_directors(&["Lana Wachowski".to_string(), "Lilly Wachowski".to_string()]),
            "Lana Wachowski, Lilly Wachowski"
        );
    }

    #[test]
    fn test_new_movie_from_details() {
        let movie = NewMovie::from(inception_details());
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.genres, "Action, Adventure, Sci-Fi");
        assert_eq!(movie.director, "Christopher Nolan");
        assert_eq!(movie.year, Some(2010));
        assert_eq!(movie.runtime_minutes, Some(148));
        assert_eq!(movie.rating, Some(8.8));
    }

    #[test]
    fn test_new_movie_takes_first_runtime() {
        let mut details = inception_details();
        details.runtimes = vec![];
        assert_eq!(NewMovie::from(details.clone()).runtime_minutes, None);

        details.runtimes = vec![162, 171];
        assert_eq!(NewMovie::from(details).runtime_minutes, Some(162));
    }

    #[test]
    fn test_candidate_label() {
        let candidate = MovieCandidate {
            title: "Inception".to_string(),
            year: Some(2010),
            external_id: "tt1375666".to_string(),
        };
        assert_eq!(candidate.label(), "Inception (2010)");

        let undated = MovieCandidate {
            year: None,
            ..candidate
        };
        assert_eq!(undated.label(), "Inception (unknown)");
    }

    #[test]
    fn test_list_kind_mapping() {
        assert_eq!(ListKind::from_watched(true), ListKind::Watched);
        assert_eq!(ListKind::from_watched(false), ListKind::Watch);
        assert_eq!(ListKind::Watch.other(), ListKind::Watched);
        assert_eq!(ListKind::Watched.table(), "user_watched_list");
        assert_eq!(ListKind::Watch.response_key(), "watch_list");
    }

    #[test]
    fn test_movie_view_flattens_movie() {
        let view = MovieView {
            movie: NewMovie::from(inception_details()).into_movie(1),
            user_watch_list: vec![UserSummary {
                id: 7,
                username: "alice".to_string(),
            }],
            user_watched_list: vec![],
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Inception");
        assert_eq!(json["user_watch_list"][0]["username"], "alice");
        assert!(json["user_watched_list"].as_array().unwrap().is_empty());
    }
}
