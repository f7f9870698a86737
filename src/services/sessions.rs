use chrono::{DateTime, Utc};

use crate::{
    db::Store,
    error::{AppError, AppResult, AuthError},
    models::{Session, User},
    services::AuthSettings,
};

/// Issues a fresh token pair expiring one session TTL from `now`
pub fn issue(settings: &AuthSettings, now: DateTime<Utc>) -> Session {
    Session::issue(now, settings.session_ttl)
}

/// True iff `token` is the user's session token and the session has not expired
pub fn verify(user: &User, token: &str, now: DateTime<Utc>) -> bool {
    user.session().verify(token, now)
}

/// Rotates both tokens of the user holding `update_token`
///
/// The swap is a single conditional write, so the old tokens stop working the
/// moment this returns. An unknown update token changes nothing.
pub async fn renew(
    store: &dyn Store,
    settings: &AuthSettings,
    update_token: &str,
    now: DateTime<Utc>,
) -> AppResult<User> {
    let session = issue(settings, now);

    match store.replace_session(update_token, &session).await? {
        Some(user) => {
            tracing::info!(user_id = user.id, "Session renewed");
            Ok(user)
        }
        None => Err(AuthError::InvalidUpdateToken.into()),
    }
}

/// Ends the session by moving its expiry to `now`; the token string is left as is
pub async fn invalidate(store: &dyn Store, user: &User, now: DateTime<Utc>) -> AppResult<()> {
    store.expire_session(user.id, now).await?;
    tracing::info!(user_id = user.id, "Session invalidated");
    Ok(())
}

/// Resolves a bearer session token, rejecting unknown and expired ones alike
pub async fn authenticate(store: &dyn Store, token: &str, now: DateTime<Utc>) -> AppResult<User> {
    match store.find_user_by_session_token(token).await? {
        Some(user) if verify(&user, token, now) => Ok(user),
        _ => Err(AuthError::InvalidSession.into()),
    }
}

/// Like [`authenticate`], but reports a missing user for body-token endpoints
pub async fn resolve_user(store: &dyn Store, token: &str, now: DateTime<Utc>) -> AppResult<User> {
    authenticate(store, token, now)
        .await
        .map_err(|e| match e {
            AppError::Auth(_) => AppError::NotFound("User not found".to_string()),
            other => other,
        })
}
