//! Block Entity

use chrono::{DateTime, Utc};
use kernel::id::BlockId;

use crate::domain::value_object::block_payload::BlockPayload;

/// One content unit of a material. `position` is owned by the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub block_id: BlockId,
    pub position: i32,
    pub payload: BlockPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Block {
    pub(crate) fn new(position: i32, payload: BlockPayload) -> Self {
        let now = Utc::now();
        Self {
            block_id: BlockId::new(),
            position,
            payload,
            created_at: now,
            updated_at: now,
        }
    }
}
