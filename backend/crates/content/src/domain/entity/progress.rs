//! Progress Records
//!
//! Per (user, material) completion and favorite state. Created on first
//! interaction and never deleted with the material.

use chrono::{DateTime, Utc};
use kernel::id::{MaterialId, UserId};

use super::material::MaterialSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub completed: bool,
    /// First completion; re-marking does not move it
    pub completed_at: Option<DateTime<Utc>>,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(user_id: UserId, material_id: MaterialId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            material_id,
            completed: false,
            completed_at: None,
            favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns false when already complete (nothing changes).
    pub fn mark_complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Flip the favorite flag and return the new value.
    pub fn toggle_favorite(&mut self, now: DateTime<Utc>) -> bool {
        self.favorite = !self.favorite;
        self.updated_at = now;
        self.favorite
    }
}

/// Progress row joined with the material it refers to
#[derive(Debug, Clone)]
pub struct ProgressItem {
    pub record: ProgressRecord,
    pub material: MaterialSummary,
}
