use chrono::{DateTime, Utc};

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{NewUser, User},
    services::{sessions, AuthSettings},
};

/// Outcome of [`create`]
#[derive(Debug)]
pub enum Registration {
    Created(User),
    /// The username was taken; the stored user is returned unchanged
    Existing(User),
}

/// Registers a user with a bcrypt digest and a fresh session
pub async fn create(
    store: &dyn Store,
    settings: &AuthSettings,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> AppResult<Registration> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Invalid username or password".to_string(),
        ));
    }

    if let Some(existing) = store.find_user_by_username(username).await? {
        return Ok(Registration::Existing(existing));
    }

    let password_digest = hash_password(password.to_string(), settings.bcrypt_cost).await?;
    let new_user = NewUser {
        username: username.to_string(),
        password_digest,
        session: sessions::issue(settings, now),
    };

    match store.insert_user(new_user).await? {
        Some(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "User registered");
            Ok(Registration::Created(user))
        }
        // Lost a race with a concurrent registration of the same name
        None => store
            .find_user_by_username(username)
            .await?
            .map(Registration::Existing)
            .ok_or_else(|| AppError::Internal("User vanished after conflict".to_string())),
    }
}

/// Checks a password against the stored digest
///
/// Returns the user only when the password matches.
pub async fn verify(store: &dyn Store, username: &str, password: &str) -> AppResult<Option<User>> {
    let Some(user) = store.find_user_by_username(username).await? else {
        return Ok(None);
    };

    let matches = verify_password(password.to_string(), user.password_digest.clone()).await?;
    if !matches {
        tracing::info!(user_id = user.id, "Password verification failed");
        return Ok(None);
    }

    Ok(Some(user))
}

/// bcrypt is deliberately slow, so it runs on the blocking pool
async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

async fn verify_password(password: String, digest: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::Duration;

    fn fast_settings() -> AuthSettings {
        AuthSettings {
            bcrypt_cost: 4,
            session_ttl: Duration::hours(24),
        }
    }

    async fn register(store: &MemoryStore, username: &str, password: &str) -> Registration {
        create(store, &fast_settings(), username, password, Utc::now())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_stores_digest_not_password() {
        let store = MemoryStore::new();
        let Registration::Created(user) = register(&store, "alice", "pw123").await else {
            panic!("expected a new user");
        };

        assert_ne!(user.password_digest, "pw123");
        assert!(user.password_digest.starts_with("$2"));
        assert!(!user.session_token.is_empty());
        assert!(!user.update_token.is_empty());
    }

    #[tokio::test]
    async fn test_create_twice_keeps_original_tokens() {
        let store = MemoryStore::new();
        let Registration::Created(first) = register(&store, "alice", "pw123").await else {
            panic!("expected a new user");
        };

        let Registration::Existing(existing) = register(&store, "alice", "other").await else {
            panic!("expected the existing user");
        };

        assert_eq!(existing.session(), first.session());
        assert_eq!(existing.password_digest, first.password_digest);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let store = MemoryStore::new();
        let result = create(&store, &fast_settings(), "  ", "pw", Utc::now()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = create(&store, &fast_settings(), "alice", "", Utc::now()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let store = MemoryStore::new();
        register(&store, "alice", "pw123").await;

        let user = verify(&store, "alice", "pw123").await.unwrap();
        assert_eq!(user.map(|u| u.username), Some("alice".to_string()));

        assert!(verify(&store, "alice", "wrong").await.unwrap().is_none());
        assert!(verify(&store, "bob", "pw123").await.unwrap().is_none());
    }

    #[test]
    fn test_digest_is_salted() {
        let (first, second) = tokio_test::block_on(async {
            let first = hash_password("pw123".to_string(), 4).await.unwrap();
            let second = hash_password("pw123".to_string(), 4).await.unwrap();
            (first, second)
        });

        assert_ne!(first, second);
        assert!(tokio_test::block_on(verify_password("pw123".to_string(), first)).unwrap());
        assert!(!tokio_test::block_on(verify_password("nope".to_string(), second)).unwrap());
    }
}
