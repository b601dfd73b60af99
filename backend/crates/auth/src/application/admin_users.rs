//! Admin User Management
//!
//! Listing and blocking accounts. Blocking revokes every refresh token of
//! the account; its current access token stays valid until it expires.

use std::sync::Arc;

use kernel::id::UserId;
use kernel::pagination::{Page, PageRequest};

use crate::application::config::AuthConfig;
use crate::domain::entity::{credential::Credential, user::User};
use crate::domain::repository::{RefreshTokenRepository, UserFilter, UserRepository};
use crate::domain::value_object::{
    email::Email,
    identity::Identity,
    profile::FullName,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

pub struct AdminUsersUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
}

impl<U, T> AdminUsersUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub fn new(user_repo: Arc<U>, token_repo: Arc<T>) -> Self {
        Self {
            user_repo,
            token_repo,
        }
    }

    pub async fn list(&self, filter: UserFilter, page: PageRequest) -> AuthResult<Page<User>> {
        let (users, total) = self.user_repo.search_users(&filter, page).await?;
        Ok(Page::new(users, page, total))
    }

    pub async fn set_blocked(
        &self,
        actor: &Identity,
        target: &UserId,
        blocked: bool,
    ) -> AuthResult<User> {
        if actor.user_id == *target && blocked {
            return Err(AuthError::CannotBlockSelf);
        }

        let mut user = self
            .user_repo
            .find_user_by_id(target)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.blocked != blocked {
            user.set_blocked(blocked);
            self.user_repo.update_user(&user).await?;
        }

        if blocked {
            let revoked = self.token_repo.revoke_user_tokens(target).await?;
            tracing::warn!(
                admin_id = %actor.user_id,
                user_id = %target,
                sessions_revoked = revoked,
                "User blocked"
            );
        } else {
            tracing::info!(admin_id = %actor.user_id, user_id = %target, "User unblocked");
        }

        Ok(user)
    }
}

/// Create the configured administrator if the email is not registered yet.
/// Returns whether an account was created.
pub async fn bootstrap_admin<U>(
    user_repo: &U,
    config: &AuthConfig,
    email: &str,
    password: String,
) -> AuthResult<bool>
where
    U: UserRepository,
{
    let email = Email::new(email)?;
    if user_repo.email_exists(&email).await? {
        tracing::debug!(email = %email, "Admin account already present");
        return Ok(false);
    }

    let password = RawPassword::new(password)?;
    let user = User::new(email, UserRole::Admin, FullName::new("Administrator")?);
    let credential = Credential::new(
        user.user_id,
        UserPassword::from_raw(&password, config.pepper())?,
    );
    user_repo.create_user(&user, &credential).await?;

    tracing::info!(user_id = %user.user_id, email = %user.email, "Admin account created");
    Ok(true)
}
