//! Auth Router

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
};
use platform::storage::{ObjectStorage, Storage};

use crate::application::{AccessTokenCodec, AuthConfig};
use crate::domain::repository::AuthStore;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::policy::{ADMINS, AccessRule};
use crate::presentation::upload::MULTIPART_OVERHEAD;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(
    repo: PgAuthRepository,
    storage: Arc<Storage>,
    config: Arc<AuthConfig>,
    codec: Arc<AccessTokenCodec>,
) -> Router {
    auth_router_generic(repo, storage, config, codec)
}

/// Create a generic Auth router for any repository and storage implementation
pub fn auth_router_generic<R, S>(
    repo: R,
    storage: Arc<S>,
    config: Arc<AuthConfig>,
    codec: Arc<AccessTokenCodec>,
) -> Router
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let avatar_limit = config.avatar_max_bytes + MULTIPART_OVERHEAD;
    let state = AuthAppState {
        repo: Arc::new(repo),
        storage,
        config,
        codec,
    };

    Router::new()
        .route("/auth/register", post(handlers::register::<R, S>))
        .route("/auth/login", post(handlers::login::<R, S>))
        .route("/auth/refresh", post(handlers::refresh::<R, S>))
        .route("/auth/logout", post(handlers::logout::<R, S>))
        .route("/auth/forgot-password", post(handlers::forgot_password::<R, S>))
        .route("/auth/reset-password", post(handlers::reset_password::<R, S>))
        .route(
            "/profile",
            get(handlers::get_profile::<R, S>).patch(handlers::update_profile::<R, S>),
        )
        .route(
            "/profile/avatar",
            post(handlers::upload_avatar::<R, S>).layer(DefaultBodyLimit::max(avatar_limit)),
        )
        .route("/admin/users", get(handlers::list_users::<R, S>))
        .route("/admin/users/{id}/block", post(handlers::block_user::<R, S>))
        .with_state(state)
}

/// Access rules for [`auth_router`], relative to where it is nested.
/// Profile routes are left to the authenticated default.
pub fn access_rules() -> Vec<AccessRule> {
    vec![
        AccessRule::public(Method::POST, "/auth/register"),
        AccessRule::public(Method::POST, "/auth/login"),
        AccessRule::public(Method::POST, "/auth/refresh"),
        AccessRule::public(Method::POST, "/auth/logout"),
        AccessRule::public(Method::POST, "/auth/forgot-password"),
        AccessRule::public(Method::POST, "/auth/reset-password"),
        AccessRule::roles(Method::GET, "/admin/users", ADMINS),
        AccessRule::roles(Method::POST, "/admin/users/{id}/block", ADMINS),
    ]
}
