use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};

use crate::{
    db::Store,
    error::AppResult,
    models::{ListKind, Movie, NewMovie, NewUser, Session, User, UserSummary},
};

const USER_COLUMNS: &str =
    "id, username, password_digest, session_token, session_expiration, update_token";

const MOVIE_COLUMNS: &str =
    "id, title, genres, director, year, runtime_minutes, rating, plot_outline";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// `Store` backed by Postgres; every mutating method runs in its own transaction
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_user_by(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Looks the title up first and only inserts on a miss, so an existing row is never rewritten
    async fn get_or_create_movie(conn: &mut PgConnection, movie: &NewMovie) -> AppResult<Movie> {
        let select = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE title = $1");

        if let Some(existing) = sqlx::query_as::<_, Movie>(&select)
            .bind(&movie.title)
            .fetch_optional(&mut *conn)
            .await?
        {
            tracing::debug!(movie_id = existing.id, title = %existing.title, "Catalog hit");
            return Ok(existing);
        }

        let insert = format!(
            r#"
            INSERT INTO movies (title, genres, director, year, runtime_minutes, rating, plot_outline)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (title) DO NOTHING
            RETURNING {MOVIE_COLUMNS}
            "#
        );

        let inserted = sqlx::query_as::<_, Movie>(&insert)
            .bind(&movie.title)
            .bind(&movie.genres)
            .bind(&movie.director)
            .bind(movie.year)
            .bind(movie.runtime_minutes)
            .bind(movie.rating)
            .bind(&movie.plot_outline)
            .fetch_optional(&mut *conn)
            .await?;

        match inserted {
            Some(created) => {
                tracing::info!(movie_id = created.id, title = %created.title, "Catalog entry created");
                Ok(created)
            }
            // A concurrent request created the row between our select and insert
            None => Ok(sqlx::query_as::<_, Movie>(&select)
                .bind(&movie.title)
                .fetch_one(&mut *conn)
                .await?),
        }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_user_by("username", username).await
    }

    async fn find_user_by_session_token(&self, token: &str) -> AppResult<Option<User>> {
        self.find_user_by("session_token", token).await
    }

    async fn find_user_by_update_token(&self, token: &str) -> AppResult<Option<User>> {
        self.find_user_by("update_token", token).await
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            INSERT INTO users (username, password_digest, session_token, session_expiration, update_token)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (username) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.password_digest)
            .bind(&user.session.session_token)
            .bind(user.session.session_expiration)
            .bind(&user.session.update_token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(created)
    }

    async fn replace_session(
        &self,
        update_token: &str,
        session: &Session,
    ) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET session_token = $1, session_expiration = $2, update_token = $3
            WHERE update_token = $4
            RETURNING {USER_COLUMNS}
            "#
        );

        let renewed = sqlx::query_as::<_, User>(&sql)
            .bind(&session.session_token)
            .bind(session.session_expiration)
            .bind(&session.update_token)
            .bind(update_token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(renewed)
    }

    async fn expire_session(&self, user_id: i64, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET session_expiration = $1 WHERE id = $2")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_movie_by_title(&self, title: &str) -> AppResult<Option<Movie>> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE title = $1");
        let movie = sqlx::query_as::<_, Movie>(&sql)
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movie)
    }

    async fn add_to_watch_list(&self, user_id: i64, movie: &NewMovie) -> AppResult<Movie> {
        let mut tx = self.pool.begin().await?;

        let movie = Self::get_or_create_movie(&mut tx, movie).await?;

        sqlx::query(
            r#"
            INSERT INTO user_watch_list (user_id, movie_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, movie_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(movie.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(movie)
    }

    async fn move_movie(&self, user_id: i64, movie_id: i64, from: ListKind) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND movie_id = $2",
            from.table()
        ))
        .bind(user_id)
        .bind(movie_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(&format!(
            "INSERT INTO {} (user_id, movie_id) VALUES ($1, $2) ON CONFLICT (user_id, movie_id) DO NOTHING",
            from.other().table()
        ))
        .bind(user_id)
        .bind(movie_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn list_movies(&self, user_id: i64, list: ListKind) -> AppResult<Vec<Movie>> {
        let sql = format!(
            r#"
            SELECT m.id, m.title, m.genres, m.director, m.year, m.runtime_minutes, m.rating, m.plot_outline
            FROM movies m
            JOIN {} l ON l.movie_id = m.id
            WHERE l.user_id = $1
            ORDER BY m.id
            "#,
            list.table()
        );

        let movies = sqlx::query_as::<_, Movie>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(movies)
    }

    async fn list_holders(&self, movie_id: i64, list: ListKind) -> AppResult<Vec<UserSummary>> {
        let sql = format!(
            r#"
            SELECT u.id, u.username
            FROM users u
            JOIN {} l ON l.user_id = u.id
            WHERE l.movie_id = $1
            ORDER BY u.id
            "#,
            list.table()
        );

        let holders = sqlx::query_as::<_, UserSummary>(&sql)
            .bind(movie_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(holders)
    }
}
