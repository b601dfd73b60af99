//! Subject Entity

use chrono::{DateTime, Utc};
use kernel::id::SubjectId;

use crate::domain::value_object::metadata::SubjectName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub subject_id: SubjectId,
    pub name: SubjectName,
    pub created_at: DateTime<Utc>,
}

impl Subject {
    pub fn new(name: SubjectName) -> Self {
        Self {
            subject_id: SubjectId::new(),
            name,
            created_at: Utc::now(),
        }
    }
}

/// Subject with the number of published materials filed under it
#[derive(Debug, Clone)]
pub struct SubjectSummary {
    pub subject: Subject,
    pub material_count: i64,
}
