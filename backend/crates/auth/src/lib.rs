//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router, authorization gate
//!
//! ## Features
//! - Registration and login with email + password
//! - Short-lived JWT access tokens, rotating opaque refresh tokens
//! - Password reset with single-use tokens
//! - Profile editing and avatar upload
//! - Admin user listing and blocking
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (optional pepper)
//! - Refresh tokens stored as SHA-256 digests; replaying a rotated token
//!   revokes its whole family
//! - Route access decided by one policy table in the gate middleware

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::access_token::AccessTokenCodec;
pub use application::admin_users::bootstrap_admin;
pub use application::config::AuthConfig;
pub use domain::value_object::{identity::Identity, user_role::UserRole};
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::{access_rules, auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod config {
    pub use crate::application::config::*;
}

pub mod gate {
    pub use crate::presentation::middleware::{AuthGate, CurrentUser, authorize};
    pub use crate::presentation::policy::*;
}

pub mod upload {
    pub use crate::presentation::upload::*;
}
