use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{ListKind, Movie, NewMovie, NewUser, Session, User, UserSummary},
};

/// Persistence seam shared by the Postgres and in-memory backends
///
/// Each method is one logical operation and is atomic on its own: either
/// every row it touches is written or none is.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_user_by_session_token(&self, token: &str) -> AppResult<Option<User>>;

    async fn find_user_by_update_token(&self, token: &str) -> AppResult<Option<User>>;

    /// Inserts a user. Returns `None` when the username is already taken.
    async fn insert_user(&self, user: NewUser) -> AppResult<Option<User>>;

    /// Replaces the token pair of whoever currently holds `update_token`.
    ///
    /// Returns `None`, without writing anything, when no user holds it.
    async fn replace_session(
        &self,
        update_token: &str,
        session: &Session,
    ) -> AppResult<Option<User>>;

    async fn expire_session(&self, user_id: i64, at: DateTime<Utc>) -> AppResult<()>;

    async fn find_movie_by_title(&self, title: &str) -> AppResult<Option<Movie>>;

    /// Gets or creates the catalog row for `movie.title` and links it to the
    /// user's watch list. Linking an already listed movie is a no-op.
    async fn add_to_watch_list(&self, user_id: i64, movie: &NewMovie) -> AppResult<Movie>;

    /// Moves a movie out of `from` into the other list.
    ///
    /// Returns `false`, without writing anything, when the movie is not in `from`.
    async fn move_movie(&self, user_id: i64, movie_id: i64, from: ListKind) -> AppResult<bool>;

    /// Members of one of the user's lists, ordered by movie id
    async fn list_movies(&self, user_id: i64, list: ListKind) -> AppResult<Vec<Movie>>;

    /// Users holding the movie in the given list, ordered by user id
    async fn list_holders(&self, movie_id: i64, list: ListKind) -> AppResult<Vec<UserSummary>>;
}
