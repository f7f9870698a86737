use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{ListKind, Movie, MovieView, NewMovie, User},
};

/// Puts a movie on the user's watch list, creating its catalog row on first sight
///
/// Adding a movie that is already listed is a no-op. The watched list is not consulted.
pub async fn add_to_watch_list(store: &dyn Store, user: &User, movie: &NewMovie) -> AppResult<Movie> {
    let movie = store.add_to_watch_list(user.id, movie).await?;

    tracing::info!(
        user_id = user.id,
        movie_id = movie.id,
        title = %movie.title,
        "Movie added to watch list"
    );

    Ok(movie)
}

/// Moves the movie titled `title` between the user's lists
///
/// `to_watched` selects the direction. The movie must currently sit in the
/// source list; otherwise nothing changes and `NotFound` is returned.
pub async fn move_movie(
    store: &dyn Store,
    user: &User,
    title: &str,
    to_watched: bool,
) -> AppResult<Movie> {
    let movie = store
        .find_movie_by_title(title)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    let from = ListKind::from_watched(to_watched).other();

    if !store.move_movie(user.id, movie.id, from).await? {
        return Err(AppError::NotFound(format!(
            "Movie not in {}",
            from.label()
        )));
    }

    tracing::info!(
        user_id = user.id,
        movie_id = movie.id,
        from = from.label(),
        to = from.other().label(),
        "Movie moved"
    );

    Ok(movie)
}

/// Current members of one of the user's lists
pub async fn list(store: &dyn Store, user: &User, watched: bool) -> AppResult<Vec<Movie>> {
    store.list_movies(user.id, ListKind::from_watched(watched)).await
}

/// The movie with everyone who holds it on either list
pub async fn describe(store: &dyn Store, movie: Movie) -> AppResult<MovieView> {
    let user_watch_list = store.list_holders(movie.id, ListKind::Watch).await?;
    let user_watched_list = store.list_holders(movie.id, ListKind::Watched).await?;

    Ok(MovieView {
        movie,
        user_watch_list,
        user_watched_list,
    })
}
