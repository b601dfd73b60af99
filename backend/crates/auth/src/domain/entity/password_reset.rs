//! Password Reset Entity
//!
//! Single-use reset ticket. At most one per user; the row is deleted
//! when it is consumed, whether or not the new password is accepted.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub token_hash: Vec<u8>,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn new(user_id: UserId, token_hash: Vec<u8>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token_hash,
            user_id,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
