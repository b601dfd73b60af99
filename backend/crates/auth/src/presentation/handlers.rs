//! HTTP Handlers

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::extract::{Json, Path, Query};
use kernel::id::UserId;
use kernel::pagination::{Page, PageRequest};
use kernel::search::normalize_query;
use platform::storage::ObjectStorage;
use uuid::Uuid;

use crate::application::{
    AccessTokenCodec, AdminUsersUseCase, AuthConfig, LoginInput, LoginUseCase,
    PasswordResetUseCase, ProfileUpdate, ProfileUseCase, RegisterInput, RegisterUseCase,
    TokenService,
};
use crate::domain::repository::{AuthStore, UserFilter};
use crate::error::AuthResult;
use crate::presentation::dto::{
    AdminUserQuery, AuthResponse, BlockUserRequest, ForgotPasswordRequest,
    ForgotPasswordResponse, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest,
    ResetPasswordRequest, UpdateProfileRequest, UserResponse,
};
use crate::presentation::middleware::CurrentUser;
use crate::presentation::upload::read_file_field;

const FORGOT_PASSWORD_MESSAGE: &str =
    "If the account exists, password reset instructions have been issued";

/// Shared state for auth handlers
pub struct AuthAppState<R, S>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    pub repo: Arc<R>,
    pub storage: Arc<S>,
    pub config: Arc<AuthConfig>,
    pub codec: Arc<AccessTokenCodec>,
}

impl<R, S> Clone for AuthAppState<R, S>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            storage: self.storage.clone(),
            config: self.config.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl<R, S> AuthAppState<R, S>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    fn token_service(&self) -> TokenService<R, R> {
        TokenService::new(
            self.repo.clone(),
            self.repo.clone(),
            self.codec.clone(),
            self.config.clone(),
        )
    }
}

// ============================================================================
// Registration / Login / Tokens
// ============================================================================

/// POST /auth/register
pub async fn register<R, S>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.token_service(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            role: req.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(&output.user, output.tokens)),
    ))
}

/// POST /auth/login
pub async fn login<R, S>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<AuthResponse>>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.token_service(),
        state.config.clone(),
    );

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(AuthResponse::new(&output.user, output.tokens)))
}

/// POST /auth/refresh
pub async fn refresh<R, S>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<AuthResponse>>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let (user, tokens) = state.token_service().refresh(&req.refresh_token).await?;
    Ok(Json(AuthResponse::new(&user, tokens)))
}

/// POST /auth/logout
pub async fn logout<R, S>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<LogoutRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    state.token_service().logout(&req.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Password Reset
// ============================================================================

fn password_reset<R, S>(state: &AuthAppState<R, S>) -> PasswordResetUseCase<R, R, R, R>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    PasswordResetUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    )
}

/// POST /auth/forgot-password
pub async fn forgot_password<R, S>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AuthResult<Json<ForgotPasswordResponse>>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let issued = password_reset(&state).forgot(&req.email).await?;

    Ok(Json(ForgotPasswordResponse {
        message: FORGOT_PASSWORD_MESSAGE,
        expires_at: issued.as_ref().map(|t| t.expires_at),
        reset_token: issued.map(|t| t.token),
    }))
}

/// POST /auth/reset-password
pub async fn reset_password<R, S>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    password_reset(&state)
        .reset(&req.token, req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Profile
// ============================================================================

fn profile<R, S>(state: &AuthAppState<R, S>) -> ProfileUseCase<R, S>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    ProfileUseCase::new(
        state.repo.clone(),
        state.storage.clone(),
        state.config.clone(),
    )
}

/// GET /profile
pub async fn get_profile<R, S>(
    State(state): State<AuthAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let user = profile(&state).get(&identity.user_id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PATCH /profile
pub async fn update_profile<R, S>(
    State(state): State<AuthAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let user = profile(&state)
        .update(
            &identity.user_id,
            ProfileUpdate {
                full_name: req.full_name,
                bio: req.bio,
            },
        )
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

/// POST /profile/avatar (multipart `file`)
pub async fn upload_avatar<R, S>(
    State(state): State<AuthAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    mut multipart: Multipart,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let upload = read_file_field(&mut multipart).await?;
    let user = profile(&state)
        .upload_avatar(&identity.user_id, &upload.content_type, upload.bytes)
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /admin/users
pub async fn list_users<R, S>(
    State(state): State<AuthAppState<R, S>>,
    Query(query): Query<AdminUserQuery>,
) -> AuthResult<Json<Page<UserResponse>>>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let filter = UserFilter {
        role: query.role,
        blocked: query.blocked,
        query: normalize_query(query.q),
    };
    let page = PageRequest::new(query.page, query.per_page);

    let users = AdminUsersUseCase::new(state.repo.clone(), state.repo.clone())
        .list(filter, page)
        .await?;

    Ok(Json(users.map(|user| UserResponse::from(&user))))
}

/// POST /admin/users/{id}/block
pub async fn block_user<R, S>(
    State(state): State<AuthAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<BlockUserRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
    S: ObjectStorage + Sync + 'static,
{
    let user = AdminUsersUseCase::new(state.repo.clone(), state.repo.clone())
        .set_blocked(&identity, &UserId::from_uuid(user_id), req.blocked)
        .await?;
    Ok(Json(UserResponse::from(&user)))
}
