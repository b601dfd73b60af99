//! Access Tokens
//!
//! Short-lived HS256 JWTs carrying the user id and role. Validation is
//! purely cryptographic; no store lookup happens per request, so a block
//! takes effect once the current access token expires.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::value_object::{identity::Identity, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signed access token and its expiry
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates access tokens
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: chrono::Duration,
}

impl AccessTokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(&config.jwt_secret),
            decoding: DecodingKey::from_secret(&config.jwt_secret),
            validation,
            issuer: config.jwt_issuer.clone(),
            ttl: config.access_ttl(),
        }
    }

    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> AuthResult<AccessToken> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: identity.user_id.into_uuid(),
            role: identity.role.code().to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign access token: {e}")))?;

        Ok(AccessToken { token, expires_at })
    }

    /// Every failure is `AuthError::Unauthorized`.
    pub fn validate(&self, token: &str) -> AuthResult<Identity> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;

        let role = UserRole::from_code(&data.claims.role).ok_or_else(|| {
            tracing::debug!(role = %data.claims.role, "Access token carries unknown role");
            AuthError::Unauthorized
        })?;

        Ok(Identity::new(UserId::from_uuid(data.claims.sub), role))
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }
}
