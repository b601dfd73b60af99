//! Authorization Gate
//!
//! Router-wide middleware that resolves the bearer token and enforces the
//! [`AccessPolicy`]. The resolved [`Identity`] is stored in request
//! extensions for the [`CurrentUser`] extractor.

use std::sync::Arc;

use axum::extract::{FromRequestParts, MatchedPath, Request, State};
use axum::http::{HeaderMap, header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;

use crate::application::access_token::AccessTokenCodec;
use crate::domain::value_object::identity::Identity;
use crate::error::{AuthError, AuthResult};
use crate::presentation::policy::{Access, AccessPolicy};

/// Middleware state
pub struct AuthGate {
    pub policy: AccessPolicy,
    pub codec: Arc<AccessTokenCodec>,
}

impl AuthGate {
    pub fn new(policy: AccessPolicy, codec: Arc<AccessTokenCodec>) -> Self {
        Self { policy, codec }
    }

    fn resolve(&self, headers: &HeaderMap) -> AuthResult<Option<Identity>> {
        match bearer_token(headers)? {
            Some(token) => self.codec.validate(token).map(Some),
            None => Ok(None),
        }
    }
}

/// `Authorization: Bearer <token>`; any other scheme is rejected.
fn bearer_token(headers: &HeaderMap) -> AuthResult<Option<&str>> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::Unauthorized)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or(AuthError::Unauthorized)
}

/// Gate middleware (`axum::middleware::from_fn_with_state`)
pub async fn authorize(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Unmatched requests fall through to the 404 fallback
    let Some(path) = req.extensions().get::<MatchedPath>().cloned() else {
        return Ok(next.run(req).await);
    };

    let access = gate.policy.lookup(req.method(), path.as_str());
    if access == Access::Public {
        return Ok(next.run(req).await);
    }

    let identity = gate.resolve(req.headers())?;
    if let Err(e) = access.check(identity.as_ref()) {
        tracing::debug!(
            method = %req.method(),
            route = %path.as_str(),
            user_id = ?identity.map(|i| i.user_id.to_string()),
            "Access denied"
        );
        return Err(e);
    }

    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

/// Identity of the caller, set by [`authorize`]
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(CurrentUser)
            .ok_or(AuthError::Unauthorized)
    }
}
