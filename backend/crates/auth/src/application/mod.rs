//! Application Layer
//!
//! Use cases and application services.

pub mod access_token;
pub mod admin_users;
pub mod config;
pub mod login;
pub mod password_reset;
pub mod profile;
pub mod register;
pub mod token_service;

// Re-exports
pub use access_token::{AccessToken, AccessTokenCodec, Claims};
pub use admin_users::{AdminUsersUseCase, bootstrap_admin};
pub use config::AuthConfig;
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use password_reset::{IssuedResetToken, PasswordResetUseCase};
pub use profile::{ProfileUpdate, ProfileUseCase};
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use token_service::{TokenPair, TokenService};
