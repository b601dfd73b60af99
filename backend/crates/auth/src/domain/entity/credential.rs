//! Credential Entity

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::user_password::UserPassword;

/// Password hash for one user (`user_credentials` row)
#[derive(Debug, Clone)]
pub struct Credential {
    pub user_id: UserId,
    pub password_hash: UserPassword,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(user_id: UserId, password_hash: UserPassword) -> Self {
        Self {
            user_id,
            password_hash,
            updated_at: Utc::now(),
        }
    }

    pub fn change_password(&mut self, password_hash: UserPassword) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }
}
