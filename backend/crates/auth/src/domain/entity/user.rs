//! User Entity
//!
//! Account and profile data. The password hash lives in
//! [`Credential`](super::credential::Credential).

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{
    email::Email,
    identity::Identity,
    profile::{Bio, FullName},
    user_role::UserRole,
};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique, lower-cased
    pub email: Email,
    pub role: UserRole,
    /// Blocked accounts cannot log in or refresh
    pub blocked: bool,
    pub full_name: FullName,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: Email, role: UserRole, full_name: FullName) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            role,
            blocked: false,
            full_name,
            bio: None,
            avatar_url: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.user_id, self.role)
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
        self.updated_at = Utc::now();
    }

    /// `None` leaves a field unchanged.
    pub fn update_profile(&mut self, full_name: Option<FullName>, bio: Option<Bio>) {
        if let Some(full_name) = full_name {
            self.full_name = full_name;
        }
        if let Some(bio) = bio {
            self.bio = bio.into_inner();
        }
        self.updated_at = Utc::now();
    }

    pub fn set_avatar(&mut self, url: String) {
        self.avatar_url = Some(url);
        self.updated_at = Utc::now();
    }
}
