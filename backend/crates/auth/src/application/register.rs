//! Register Use Case
//!
//! Creates a student or teacher account and signs it in.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_service::{TokenPair, TokenService};
use crate::domain::entity::{credential::Credential, user::User};
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, profile::FullName, user_password::RawPassword, user_password::UserPassword,
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};
use kernel::error::app_error::AppError;

pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// `student` (default) or `teacher`
    pub role: Option<String>,
}

#[derive(Debug)]
pub struct RegisterOutput {
    pub user: User,
    pub tokens: TokenPair,
}

pub struct RegisterUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    tokens: TokenService<U, T>,
    config: Arc<AuthConfig>,
}

impl<U, T> RegisterUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub fn new(user_repo: Arc<U>, tokens: TokenService<U, T>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let email = Email::new(&input.email)?;
        let full_name = FullName::new(&input.full_name)?;
        let role = parse_registration_role(input.role.as_deref())?;
        let password = RawPassword::new(input.password)?;

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let user = User::new(email, role, full_name);
        let credential = Credential::new(
            user.user_id,
            UserPassword::from_raw(&password, self.config.pepper())?,
        );

        self.user_repo.create_user(&user, &credential).await?;
        let tokens = self.tokens.issue_pair(&user).await?;

        tracing::info!(user_id = %user.user_id, role = %user.role, "User registered");

        Ok(RegisterOutput { user, tokens })
    }
}

fn parse_registration_role(code: Option<&str>) -> AuthResult<UserRole> {
    let Some(code) = code else {
        return Ok(UserRole::Student);
    };

    match UserRole::from_code(&code.trim().to_lowercase()) {
        Some(role) if role.is_self_registrable() => Ok(role),
        _ => Err(AppError::bad_request("Role must be either student or teacher").into()),
    }
}
