//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::crypto::random_bytes;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing key for access tokens
    pub jwt_secret: Vec<u8>,
    /// `iss` claim, checked on validation
    pub jwt_issuer: String,
    /// Access token lifetime (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (30 days)
    pub refresh_token_ttl: Duration,
    /// Password reset token lifetime (30 minutes)
    pub reset_token_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Largest accepted avatar upload (5 MiB)
    pub avatar_max_bytes: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            jwt_issuer: "paideia".to_string(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 3600),
            reset_token_ttl: Duration::from_secs(30 * 60),
            password_pepper: None,
            avatar_max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl AuthConfig {
    /// Create config with a random signing secret
    pub fn with_random_secret() -> Self {
        Self {
            jwt_secret: random_bytes(32),
            ..Default::default()
        }
    }

    /// Development config (tokens do not survive restarts)
    pub fn development() -> Self {
        Self::with_random_secret()
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        to_chrono(self.access_token_ttl)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        to_chrono(self.refresh_token_ttl)
    }

    pub fn reset_ttl(&self) -> chrono::Duration {
        to_chrono(self.reset_token_ttl)
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX / 1000))
}
