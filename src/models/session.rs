use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;

/// Entropy per token. Hex encoding doubles the length to 40 characters.
pub const TOKEN_BYTES: usize = 20;

/// Generates an opaque token from the OS random source
pub fn generate_token() -> String {
    let mut buffer = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buffer);
    hex::encode(buffer)
}

/// A session/update token pair with the session's absolute expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub session_token: String,
    pub session_expiration: DateTime<Utc>,
    pub update_token: String,
}

impl Session {
    /// Issues two independent tokens, the session expiring `ttl` after `now`
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            session_token: generate_token(),
            session_expiration: now + ttl,
            update_token: generate_token(),
        }
    }

    /// True iff `token` is the current session token and `now` is strictly before expiry
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.session_token == token && now < self.session_expiration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_fixed_length_hex() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_issue_produces_distinct_tokens() {
        let now = Utc::now();
        let session = Session::issue(now, Duration::hours(24));
        assert_ne!(session.session_token, session.update_token);
        assert_eq!(session.session_expiration, now + Duration::hours(24));

        let other = Session::issue(now, Duration::hours(24));
        assert_ne!(session.session_token, other.session_token);
        assert_ne!(session.update_token, other.update_token);
    }

    #[test]
    fn test_verify_before_expiry() {
        let now = Utc::now();
        let session = Session::issue(now, Duration::hours(24));
        assert!(session.verify(&session.session_token, now));
        assert!(session.verify(&session.session_token, now + Duration::hours(23)));
    }

    #[test]
    fn test_verify_fails_at_and_after_expiry() {
        let now = Utc::now();
        let session = Session::issue(now, Duration::hours(24));
        let token = session.session_token.clone();
        assert!(!session.verify(&token, session.session_expiration));
        assert!(!session.verify(&token, session.session_expiration + Duration::seconds(1)));
    }

    #[test]
    fn test_verify_rejects_other_tokens() {
        let now = Utc::now();
        let session = Session::issue(now, Duration::hours(24));
        assert!(!session.verify(&session.update_token, now));
        assert!(!session.verify("", now));
    }
}
