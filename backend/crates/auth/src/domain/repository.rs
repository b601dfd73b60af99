//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::UserId;
use kernel::pagination::PageRequest;
use uuid::Uuid;

use crate::domain::entity::{
    credential::Credential,
    password_reset::PasswordReset,
    refresh_token::{RefreshToken, Replacement, Rotation},
    user::User,
};
use crate::domain::value_object::{email::Email, user_role::UserRole};
use crate::error::AuthResult;

/// Admin user listing filter
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub blocked: Option<bool>,
    /// Case-insensitive substring of email or full name
    pub query: Option<String>,
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert the user and its credential in one transaction.
    /// A duplicate email yields `AuthError::EmailTaken`.
    async fn create_user(&self, user: &User, credential: &Credential) -> AuthResult<()>;

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn email_exists(&self, email: &Email) -> AuthResult<bool>;

    async fn update_user(&self, user: &User) -> AuthResult<()>;

    /// Newest first; returns the page and the total match count.
    async fn search_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> AuthResult<(Vec<User>, u64)>;
}

/// Password hash repository trait
#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    async fn find_credential(&self, user_id: &UserId) -> AuthResult<Option<Credential>>;

    async fn update_credential(&self, credential: &Credential) -> AuthResult<()>;
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Check-validity, revoke and issue the successor as one unit of work.
    ///
    /// The presented token row is locked for the duration, so two
    /// concurrent refreshes with the same token cannot both succeed.
    async fn rotate_refresh_token(
        &self,
        presented_hash: &[u8],
        replacement: Replacement,
    ) -> AuthResult<Rotation>;

    /// Returns whether a live token was revoked. Unknown or already
    /// revoked tokens are not an error.
    async fn revoke_refresh_token(&self, token_hash: &[u8]) -> AuthResult<bool>;

    async fn revoke_token_family(&self, family_id: Uuid) -> AuthResult<u64>;

    async fn revoke_user_tokens(&self, user_id: &UserId) -> AuthResult<u64>;
}

/// Password reset repository trait
#[trait_variant::make(PasswordResetRepository: Send)]
pub trait LocalPasswordResetRepository {
    /// Store `reset`, dropping any earlier reset for the same user.
    async fn replace_password_reset(&self, reset: &PasswordReset) -> AuthResult<()>;

    /// Delete and return the reset for `token_hash`, expired or not.
    async fn consume_password_reset(&self, token_hash: &[u8]) -> AuthResult<Option<PasswordReset>>;
}

/// Everything the auth handlers need from one store
pub trait AuthStore:
    UserRepository
    + CredentialRepository
    + RefreshTokenRepository
    + PasswordResetRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + CredentialRepository
        + RefreshTokenRepository
        + PasswordResetRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
