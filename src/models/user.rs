use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Session;

/// A registered account as stored in `users`
///
/// Not `Serialize`: the password digest must never end up in a response body.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub(crate) password_digest: String,
    pub session_token: String,
    pub session_expiration: DateTime<Utc>,
    pub update_token: String,
}

impl User {
    /// The user's current token pair
    pub fn session(&self) -> Session {
        Session {
            session_token: self.session_token.clone(),
            session_expiration: self.session_expiration,
            update_token: self.update_token.clone(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Input for inserting a user; the digest is computed before this is built
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_digest: String,
    pub session: Session,
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}
