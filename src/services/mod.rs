pub mod catalog;
pub mod credentials;
pub mod ledger;
pub mod providers;
pub mod sessions;

pub use providers::MovieProvider;

use chrono::Duration;

/// Tunables for credential hashing and session lifetime
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// How long a freshly issued session token stays valid
    pub session_ttl: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: 12,
            session_ttl: Duration::hours(24),
        }
    }
}
