//! Material Aggregate
//!
//! A material owns its blocks. Block positions are always `0..len` in
//! order; every mutation below re-establishes that before returning, so a
//! saved aggregate never has gaps or duplicates.

use chrono::{DateTime, Utc};
use kernel::id::{BlockId, MaterialId, SubjectId, UserId};
use std::collections::HashSet;

use auth::Identity;

use super::block::Block;
use crate::domain::value_object::{
    block_payload::BlockPayload,
    material_status::MaterialStatus,
    metadata::{Description, Title},
};
use crate::error::{ContentError, ContentResult};

/// Editable material fields
#[derive(Debug, Clone)]
pub struct MaterialMetadata {
    pub title: Title,
    pub description: Description,
    pub subject_id: Option<SubjectId>,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub material_id: MaterialId,
    pub owner_id: UserId,
    pub title: Title,
    pub description: Description,
    pub subject_id: Option<SubjectId>,
    pub status: MaterialStatus,
    /// Optimistic concurrency counter, bumped by every save
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    blocks: Vec<Block>,
}

impl Material {
    pub fn new(owner_id: UserId, metadata: MaterialMetadata) -> Self {
        let now = Utc::now();
        Self {
            material_id: MaterialId::new(),
            owner_id,
            title: metadata.title,
            description: metadata.description,
            subject_id: metadata.subject_id,
            status: MaterialStatus::Draft,
            version: 0,
            created_at: now,
            updated_at: now,
            published_at: None,
            blocks: Vec::new(),
        }
    }

    /// Rebuild from storage; `blocks` may arrive in any order.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        material_id: MaterialId,
        owner_id: UserId,
        title: Title,
        description: Description,
        subject_id: Option<SubjectId>,
        status: MaterialStatus,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        published_at: Option<DateTime<Utc>>,
        mut blocks: Vec<Block>,
    ) -> Self {
        blocks.sort_by_key(|b| b.position);
        let mut material = Self {
            material_id,
            owner_id,
            title,
            description,
            subject_id,
            status,
            version,
            created_at,
            updated_at,
            published_at,
            blocks,
        };
        material.renumber();
        material
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.block_id).collect()
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.owner_id == *user_id
    }

    pub fn ensure_owner(&self, user_id: &UserId) -> ContentResult<()> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(ContentError::NotOwner)
        }
    }

    /// Drafts are visible to their author and to admins only.
    pub fn is_visible_to(&self, viewer: &Identity) -> bool {
        self.status.is_published() || self.is_owned_by(&viewer.user_id) || viewer.is_admin()
    }

    pub fn update_metadata(&mut self, metadata: MaterialMetadata) {
        self.title = metadata.title;
        self.description = metadata.description;
        self.subject_id = metadata.subject_id;
        self.touch();
    }

    /// Append a block at the next position.
    pub fn add_block(&mut self, payload: BlockPayload) -> &Block {
        let position = i32::try_from(self.blocks.len()).unwrap_or(i32::MAX);
        self.blocks.push(Block::new(position, payload));
        self.touch();
        &self.blocks[self.blocks.len() - 1]
    }

    /// Replace the payload; the position does not change.
    pub fn update_block(&mut self, block_id: &BlockId, payload: BlockPayload) -> ContentResult<&Block> {
        let index = self.index_of(block_id)?;
        let now = Utc::now();
        let block = &mut self.blocks[index];
        block.payload = payload;
        block.updated_at = now;
        self.updated_at = now;
        Ok(&self.blocks[index])
    }

    /// Remove the block and close the gap it leaves. A published material
    /// keeps at least one block.
    pub fn delete_block(&mut self, block_id: &BlockId) -> ContentResult<Block> {
        let index = self.index_of(block_id)?;
        if self.status.is_published() && self.blocks.len() == 1 {
            return Err(ContentError::EmptyMaterial);
        }
        let removed = self.blocks.remove(index);
        self.renumber();
        self.touch();
        Ok(removed)
    }

    /// `order` must name every current block exactly once. On error the
    /// aggregate is unchanged.
    pub fn reorder(&mut self, order: &[BlockId]) -> ContentResult<()> {
        if order.len() != self.blocks.len() {
            return Err(ContentError::InvalidOrder);
        }

        let mut seen = HashSet::with_capacity(order.len());
        let mut reordered = Vec::with_capacity(order.len());
        for block_id in order {
            if !seen.insert(*block_id) {
                return Err(ContentError::InvalidOrder);
            }
            let block = self
                .blocks
                .iter()
                .find(|b| b.block_id == *block_id)
                .ok_or(ContentError::InvalidOrder)?;
            reordered.push(block.clone());
        }

        self.blocks = reordered;
        self.renumber();
        self.touch();
        Ok(())
    }

    pub fn publish(&mut self) -> ContentResult<()> {
        if self.status.is_published() {
            return Err(ContentError::AlreadyPublished);
        }
        if self.blocks.is_empty() {
            return Err(ContentError::EmptyMaterial);
        }

        let now = Utc::now();
        self.status = MaterialStatus::Published;
        self.published_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Called after a successful save.
    pub fn mark_saved(&mut self) {
        self.version += 1;
    }

    fn index_of(&self, block_id: &BlockId) -> ContentResult<usize> {
        self.blocks
            .iter()
            .position(|b| b.block_id == *block_id)
            .ok_or(ContentError::BlockNotFound)
    }

    fn renumber(&mut self) {
        let now = Utc::now();
        for (index, block) in self.blocks.iter_mut().enumerate() {
            let position = i32::try_from(index).unwrap_or(i32::MAX);
            if block.position != position {
                block.position = position;
                block.updated_at = now;
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Listing view of a material (no blocks)
#[derive(Debug, Clone)]
pub struct MaterialSummary {
    pub material_id: MaterialId,
    pub owner_id: UserId,
    pub author_name: String,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<SubjectId>,
    pub subject_name: Option<String>,
    pub status: MaterialStatus,
    pub block_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}
