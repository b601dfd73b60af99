//! Password Reset Use Case
//!
//! `forgot` issues a single-use reset token; `reset` consumes it. The
//! token is consumed before the new password is even validated, so a
//! rejected password still burns the token.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::crypto::{hash_token, random_token};

use crate::application::config::AuthConfig;
use crate::domain::entity::password_reset::PasswordReset;
use crate::domain::repository::{
    CredentialRepository, PasswordResetRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

const RESET_TOKEN_BYTES: usize = 32;

/// Reset token to deliver to the account owner
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct PasswordResetUseCase<U, C, T, P>
where
    U: UserRepository,
    C: CredentialRepository,
    T: RefreshTokenRepository,
    P: PasswordResetRepository,
{
    user_repo: Arc<U>,
    credential_repo: Arc<C>,
    token_repo: Arc<T>,
    reset_repo: Arc<P>,
    config: Arc<AuthConfig>,
}

impl<U, C, T, P> PasswordResetUseCase<U, C, T, P>
where
    U: UserRepository,
    C: CredentialRepository,
    T: RefreshTokenRepository,
    P: PasswordResetRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        credential_repo: Arc<C>,
        token_repo: Arc<T>,
        reset_repo: Arc<P>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            credential_repo,
            token_repo,
            reset_repo,
            config,
        }
    }

    /// `None` for unknown or blocked accounts; the HTTP layer answers the
    /// same way in both cases.
    pub async fn forgot(&self, email: &str) -> AuthResult<Option<IssuedResetToken>> {
        let email = Email::new(email)?;

        let user = match self.user_repo.find_user_by_email(&email).await? {
            Some(user) if !user.blocked => user,
            _ => {
                tracing::debug!("Password reset requested for unknown or blocked account");
                return Ok(None);
            }
        };

        let now = Utc::now();
        let token = random_token(RESET_TOKEN_BYTES);
        let reset = PasswordReset::new(user.user_id, hash_token(&token), now, self.config.reset_ttl());
        self.reset_repo.replace_password_reset(&reset).await?;

        tracing::info!(user_id = %user.user_id, "Password reset token issued");

        Ok(Some(IssuedResetToken {
            token,
            expires_at: reset.expires_at,
        }))
    }

    pub async fn reset(&self, token: &str, new_password: String) -> AuthResult<()> {
        let reset = self
            .reset_repo
            .consume_password_reset(&hash_token(token))
            .await?
            .ok_or_else(|| {
                tracing::debug!("Unknown password reset token");
                AuthError::Unauthorized
            })?;

        if reset.is_expired(Utc::now()) {
            tracing::debug!(user_id = %reset.user_id, "Expired password reset token");
            return Err(AuthError::Unauthorized);
        }

        let password = RawPassword::new(new_password)?;

        let mut credential = self
            .credential_repo
            .find_credential(&reset.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        credential.change_password(UserPassword::from_raw(&password, self.config.pepper())?);
        self.credential_repo.update_credential(&credential).await?;

        // Sessions opened with the old password end here
        let revoked = self.token_repo.revoke_user_tokens(&reset.user_id).await?;

        tracing::info!(user_id = %reset.user_id, sessions_revoked = revoked, "Password reset");

        Ok(())
    }
}
