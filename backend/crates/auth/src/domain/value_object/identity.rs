//! Resolved caller identity
//!
//! Produced by access token validation and attached to the request by
//! the authorization gate.

use kernel::id::UserId;

use super::user_role::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Identity {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
