use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    db::Store,
    error::AppResult,
    models::{ListKind, Movie, NewMovie, NewUser, Session, User, UserSummary},
};

/// In-process `Store` for local runs and tests
///
/// Every operation holds the write lock for its whole duration, which gives
/// the same all-or-nothing behaviour as a database transaction.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: HashMap<i64, User>,
    movies: HashMap<i64, Movie>,
    /// (user_id, movie_id) pairs
    watch_list: BTreeSet<(i64, i64)>,
    watched_list: BTreeSet<(i64, i64)>,
    next_user_id: i64,
    next_movie_id: i64,
}

impl MemoryStoreInner {
    fn list(&self, kind: ListKind) -> &BTreeSet<(i64, i64)> {
        match kind {
            ListKind::Watch => &self.watch_list,
            ListKind::Watched => &self.watched_list,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut BTreeSet<(i64, i64)> {
        match kind {
            ListKind::Watch => &mut self.watch_list,
            ListKind::Watched => &mut self.watched_list,
        }
    }

    fn find_user(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users.values().find(|user| predicate(user)).cloned()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of catalog rows
    pub async fn movie_count(&self) -> usize {
        self.inner.read().await.movies.len()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.find_user(|user| user.username == username))
    }

    async fn find_user_by_session_token(&self, token: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.find_user(|user| user.session_token == token))
    }

    async fn find_user_by_update_token(&self, token: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.find_user(|user| user.update_token == token))
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<Option<User>> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.username == user.username) {
            return Ok(None);
        }

        inner.next_user_id += 1;
        let created = User {
            id: inner.next_user_id,
            username: user.username,
            password_digest: user.password_digest,
            session_token: user.session.session_token,
            session_expiration: user.session.session_expiration,
            update_token: user.session.update_token,
        };
        inner.users.insert(created.id, created.clone());

        Ok(Some(created))
    }

    async fn replace_session(
        &self,
        update_token: &str,
        session: &Session,
    ) -> AppResult<Option<User>> {
        let mut inner = self.inner.write().await;

        let Some(user) = inner
            .users
            .values_mut()
            .find(|user| user.update_token == update_token)
        else {
            return Ok(None);
        };

        user.session_token = session.session_token.clone();
        user.session_expiration = session.session_expiration;
        user.update_token = session.update_token.clone();

        Ok(Some(user.clone()))
    }

    async fn expire_session(&self, user_id: i64, at: DateTime<Utc>) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.session_expiration = at;
        }
        Ok(())
    }

    async fn find_movie_by_title(&self, title: &str) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.values().find(|m| m.title == title).cloned())
    }

    async fn add_to_watch_list(&self, user_id: i64, movie: &NewMovie) -> AppResult<Movie> {
        let mut inner = self.inner.write().await;

        let existing = inner.movies.values().find(|m| m.title == movie.title).cloned();
        let movie = match existing {
            Some(movie) => movie,
            None => {
                inner.next_movie_id += 1;
                let created = movie.clone().into_movie(inner.next_movie_id);
                inner.movies.insert(created.id, created.clone());
                created
            }
        };

        inner.watch_list.insert((user_id, movie.id));
        Ok(movie)
    }

    async fn move_movie(&self, user_id: i64, movie_id: i64, from: ListKind) -> AppResult<bool> {
        let mut inner = self.inner.write().await;

        if !inner.list_mut(from).remove(&(user_id, movie_id)) {
            return Ok(false);
        }
        inner.list_mut(from.other()).insert((user_id, movie_id));

        Ok(true)
    }

    async fn list_movies(&self, user_id: i64, list: ListKind) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        let movies = inner
            .list(list)
            .range((user_id, i64::MIN)..=(user_id, i64::MAX))
            .filter_map(|(_, movie_id)| inner.movies.get(movie_id).cloned())
            .collect();
        Ok(movies)
    }

    async fn list_holders(&self, movie_id: i64, list: ListKind) -> AppResult<Vec<UserSummary>> {
        let inner = self.inner.read().await;
        let holders = inner
            .list(list)
            .iter()
            .filter(|(_, m)| *m == movie_id)
            .filter_map(|(user_id, _)| inner.users.get(user_id).map(User::summary))
            .collect();
        Ok(holders)
    }
}
