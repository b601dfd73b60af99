//! Refresh Token Entity
//!
//! Server-side record of an opaque refresh token. Only the SHA-256 digest
//! of the token is stored. Every token issued from one login shares a
//! `family_id`; rotation revokes the presented token and issues its
//! successor in the same family, so at most one token per family is live.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token_id: Uuid,
    pub family_id: Uuid,
    pub user_id: UserId,
    pub token_hash: Vec<u8>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Freshly generated token material, not yet bound to a family
#[derive(Debug, Clone)]
pub struct Replacement {
    pub token_hash: Vec<u8>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Replacement {
    pub fn new(token_hash: Vec<u8>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token_hash,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }
}

/// What a presented token turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Expired,
    /// Already rotated or logged out; presenting it again is a replay
    Revoked,
}

/// Outcome of an atomic rotation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// The presented token is now revoked; this is its successor.
    Rotated(RefreshToken),
    /// A revoked token was replayed. The whole family has been revoked.
    Reused { user_id: UserId, family_id: Uuid },
    /// Unknown or expired token
    Rejected,
}

impl RefreshToken {
    /// First token of a new family (login or registration)
    pub fn start_family(user_id: UserId, material: Replacement) -> Self {
        Self::in_family(Uuid::new_v4(), user_id, material)
    }

    fn in_family(family_id: Uuid, user_id: UserId, material: Replacement) -> Self {
        Self {
            token_id: Uuid::new_v4(),
            family_id,
            user_id,
            token_hash: material.token_hash,
            issued_at: material.issued_at,
            expires_at: material.expires_at,
            revoked_at: None,
        }
    }

    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        if self.revoked_at.is_some() {
            TokenState::Revoked
        } else if self.expires_at <= now {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }

    /// Revoke `self` and produce the next token of the same family.
    pub fn rotate(&mut self, material: Replacement) -> RefreshToken {
        self.revoked_at = Some(material.issued_at);
        Self::in_family(self.family_id, self.user_id, material)
    }
}
