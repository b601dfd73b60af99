//! Login Use Case

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_service::{TokenPair, TokenService};
use crate::domain::entity::user::User;
use crate::domain::repository::{CredentialRepository, RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub tokens: TokenPair,
}

pub struct LoginUseCase<U, C, T>
where
    U: UserRepository,
    C: CredentialRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    credential_repo: Arc<C>,
    tokens: TokenService<U, T>,
    config: Arc<AuthConfig>,
}

impl<U, C, T> LoginUseCase<U, C, T>
where
    U: UserRepository,
    C: CredentialRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        credential_repo: Arc<C>,
        tokens: TokenService<U, T>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            credential_repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        // Malformed email and unknown email look the same to the caller
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let password = RawPassword::for_login(input.password);

        let mut user = self
            .user_repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let credential = self
            .credential_repo
            .find_credential(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credential row missing for user".to_string()))?;

        if !credential.password_hash.verify(&password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        // Only reveal the block after the password matched
        if user.blocked {
            return Err(AuthError::AccountBlocked);
        }

        user.record_login();
        self.user_repo.update_user(&user).await?;

        let tokens = self.tokens.issue_pair(&user).await?;

        tracing::info!(user_id = %user.user_id, role = %user.role, "User logged in");

        Ok(LoginOutput { user, tokens })
    }
}
