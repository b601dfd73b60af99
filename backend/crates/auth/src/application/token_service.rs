//! Token Service
//!
//! Issues access/refresh pairs and performs refresh rotation and logout.
//!
//! Refresh tokens are opaque 256-bit random strings. The client holds the
//! raw value; the store holds only its SHA-256 digest.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::crypto::{hash_token, random_token};

use crate::application::access_token::AccessTokenCodec;
use crate::application::config::AuthConfig;
use crate::domain::entity::refresh_token::{RefreshToken, Replacement, Rotation};
use crate::domain::entity::user::User;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

const REFRESH_TOKEN_BYTES: usize = 32;

/// Credentials handed to the client after login, registration or refresh
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

pub struct TokenService<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    codec: Arc<AccessTokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U, T> TokenService<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        codec: Arc<AccessTokenCodec>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            codec,
            config,
        }
    }

    fn new_refresh_material(&self, now: DateTime<Utc>) -> (String, Replacement) {
        let raw = random_token(REFRESH_TOKEN_BYTES);
        let material = Replacement::new(hash_token(&raw), now, self.config.refresh_ttl());
        (raw, material)
    }

    /// Start a new refresh family for `user` (login, registration).
    pub async fn issue_pair(&self, user: &User) -> AuthResult<TokenPair> {
        let now = Utc::now();
        let access = self.codec.issue(&user.identity(), now)?;

        let (raw, material) = self.new_refresh_material(now);
        let refresh = RefreshToken::start_family(user.user_id, material);
        self.token_repo.insert_refresh_token(&refresh).await?;

        tracing::debug!(
            user_id = %user.user_id,
            family_id = %refresh.family_id,
            "Issued token pair"
        );

        Ok(TokenPair {
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: raw,
            refresh_expires_at: refresh.expires_at,
        })
    }

    /// Exchange a refresh token for a new pair in the same family.
    ///
    /// The presented token is revoked by the same transaction that issues
    /// its successor. Replaying any revoked token revokes the family.
    pub async fn refresh(&self, presented: &str) -> AuthResult<(User, TokenPair)> {
        let now = Utc::now();
        let (raw, material) = self.new_refresh_material(now);

        let successor = match self
            .token_repo
            .rotate_refresh_token(&hash_token(presented), material)
            .await?
        {
            Rotation::Rotated(successor) => successor,
            Rotation::Reused { user_id, family_id } => {
                tracing::warn!(
                    user_id = %user_id,
                    family_id = %family_id,
                    "Revoked refresh token replayed, token family revoked"
                );
                return Err(AuthError::Unauthorized);
            }
            Rotation::Rejected => {
                tracing::debug!("Unknown or expired refresh token presented");
                return Err(AuthError::Unauthorized);
            }
        };

        let user = match self.user_repo.find_user_by_id(&successor.user_id).await? {
            Some(user) if !user.blocked => user,
            _ => {
                self.token_repo
                    .revoke_token_family(successor.family_id)
                    .await?;
                tracing::warn!(
                    user_id = %successor.user_id,
                    "Refresh refused for blocked or missing user"
                );
                return Err(AuthError::Unauthorized);
            }
        };

        let access = self.codec.issue(&user.identity(), now)?;

        tracing::debug!(
            user_id = %user.user_id,
            family_id = %successor.family_id,
            "Rotated refresh token"
        );

        Ok((
            user,
            TokenPair {
                access_token: access.token,
                access_expires_at: access.expires_at,
                refresh_token: raw,
                refresh_expires_at: successor.expires_at,
            },
        ))
    }

    /// Revoke the presented token. Idempotent; unknown tokens are accepted.
    pub async fn logout(&self, presented: &str) -> AuthResult<()> {
        let revoked = self
            .token_repo
            .revoke_refresh_token(&hash_token(presented))
            .await?;
        tracing::debug!(revoked, "Logout");
        Ok(())
    }
}
