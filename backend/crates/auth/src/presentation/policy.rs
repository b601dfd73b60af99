//! Access Policy
//!
//! One table mapping `(method, route template)` to the access a route
//! requires. Routes missing from the table require authentication.

use std::collections::HashMap;

use axum::http::Method;

use crate::domain::value_object::{identity::Identity, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

pub const STAFF: &[UserRole] = &[UserRole::Teacher, UserRole::Admin];
pub const ADMINS: &[UserRole] = &[UserRole::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No token needed
    Public,
    /// Any valid access token
    Authenticated,
    /// Valid access token with one of the roles
    Roles(&'static [UserRole]),
}

impl Access {
    pub fn requires_identity(&self) -> bool {
        !matches!(self, Access::Public)
    }

    /// `identity` is `None` when no valid token was presented.
    pub fn check(&self, identity: Option<&Identity>) -> AuthResult<()> {
        match (self, identity) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(AuthError::Unauthorized),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::Roles(roles), Some(identity)) if roles.contains(&identity.role) => Ok(()),
            (Access::Roles(_), Some(_)) => Err(AuthError::Forbidden),
        }
    }
}

/// Route template relative to the router it is mounted in
#[derive(Debug, Clone)]
pub struct AccessRule {
    pub method: Method,
    pub path: &'static str,
    pub access: Access,
}

impl AccessRule {
    pub fn new(method: Method, path: &'static str, access: Access) -> Self {
        Self {
            method,
            path,
            access,
        }
    }

    pub fn public(method: Method, path: &'static str) -> Self {
        Self::new(method, path, Access::Public)
    }

    pub fn authenticated(method: Method, path: &'static str) -> Self {
        Self::new(method, path, Access::Authenticated)
    }

    pub fn roles(method: Method, path: &'static str, roles: &'static [UserRole]) -> Self {
        Self::new(method, path, Access::Roles(roles))
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: HashMap<(Method, String), Access>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rules` for routes nested under `prefix` (`""` for none).
    pub fn with_rules(mut self, prefix: &str, rules: impl IntoIterator<Item = AccessRule>) -> Self {
        let prefix = prefix.trim_end_matches('/');
        for rule in rules {
            let path = format!("{prefix}{}", rule.path);
            if self.rules.insert((rule.method.clone(), path.clone()), rule.access).is_some() {
                tracing::warn!(method = %rule.method, path = %path, "Access rule registered twice");
            }
        }
        self
    }

    /// `path` is the matched route template, e.g. `/api/v1/materials/{id}`.
    pub fn lookup(&self, method: &Method, path: &str) -> Access {
        self.rules
            .get(&(method.clone(), path.to_string()))
            .copied()
            .unwrap_or(Access::Authenticated)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::UserId;

    fn policy() -> AccessPolicy {
        AccessPolicy::new()
            .with_rules("", [AccessRule::public(Method::GET, "/health")])
            .with_rules(
                "/api/v1/",
                [
                    AccessRule::public(Method::POST, "/auth/login"),
                    AccessRule::roles(Method::POST, "/materials", STAFF),
                    AccessRule::roles(Method::GET, "/admin/users", ADMINS),
                ],
            )
    }

    #[test]
    fn test_lookup_joins_prefix() {
        let policy = policy();
        assert_eq!(policy.lookup(&Method::GET, "/health"), Access::Public);
        assert_eq!(policy.lookup(&Method::POST, "/api/v1/auth/login"), Access::Public);
        assert_eq!(policy.lookup(&Method::POST, "/api/v1/materials"), Access::Roles(STAFF));
        assert_eq!(policy.len(), 4);
    }

    #[test]
    fn test_unlisted_route_requires_authentication() {
        let policy = policy();
        assert_eq!(policy.lookup(&Method::GET, "/api/v1/profile"), Access::Authenticated);
        // Method is part of the key
        assert_eq!(policy.lookup(&Method::GET, "/api/v1/auth/login"), Access::Authenticated);
    }

    #[test]
    fn test_check() {
        let student = Identity::new(UserId::new(), UserRole::Student);
        let teacher = Identity::new(UserId::new(), UserRole::Teacher);

        assert!(Access::Public.check(None).is_ok());
        assert!(matches!(Access::Authenticated.check(None), Err(AuthError::Unauthorized)));
        assert!(Access::Authenticated.check(Some(&student)).is_ok());
        assert!(Access::Roles(STAFF).check(Some(&teacher)).is_ok());
        assert!(matches!(Access::Roles(STAFF).check(Some(&student)), Err(AuthError::Forbidden)));
        assert!(matches!(Access::Roles(ADMINS).check(None), Err(AuthError::Unauthorized)));
    }
}
