//! Material Authoring Use Case
//!
//! Create and edit materials. Every operation loads the aggregate, checks
//! ownership, mutates it and saves it back under the optimistic version
//! check.

use std::sync::Arc;

use auth::Identity;
use kernel::id::{BlockId, MaterialId, SubjectId};
use uuid::Uuid;

use crate::domain::entity::{
    block::Block,
    material::{Material, MaterialMetadata},
};
use crate::domain::repository::{MaterialRepository, SubjectRepository};
use crate::domain::value_object::{
    block_payload::BlockPayload,
    metadata::{Description, Title},
};
use crate::error::{ContentError, ContentResult};

/// Raw metadata from a create or update request
#[derive(Debug, Clone)]
pub struct MaterialInput {
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<Uuid>,
}

pub struct MaterialAuthoringUseCase<M, S>
where
    M: MaterialRepository,
    S: SubjectRepository,
{
    material_repo: Arc<M>,
    subject_repo: Arc<S>,
}

impl<M, S> MaterialAuthoringUseCase<M, S>
where
    M: MaterialRepository,
    S: SubjectRepository,
{
    pub fn new(material_repo: Arc<M>, subject_repo: Arc<S>) -> Self {
        Self {
            material_repo,
            subject_repo,
        }
    }

    pub async fn create(&self, actor: &Identity, input: MaterialInput) -> ContentResult<Material> {
        let metadata = self.metadata(input).await?;
        let material = Material::new(actor.user_id, metadata);

        self.material_repo.create_material(&material).await?;

        tracing::info!(
            material_id = %material.material_id,
            owner_id = %actor.user_id,
            "Material created"
        );

        Ok(material)
    }

    pub async fn update_metadata(
        &self,
        actor: &Identity,
        material_id: &MaterialId,
        input: MaterialInput,
    ) -> ContentResult<Material> {
        let mut material = self.load_owned(actor, material_id).await?;
        let metadata = self.metadata(input).await?;

        material.update_metadata(metadata);
        self.save(&mut material).await?;

        tracing::info!(material_id = %material_id, "Material metadata updated");

        Ok(material)
    }

    pub async fn add_block(
        &self,
        actor: &Identity,
        material_id: &MaterialId,
        payload: BlockPayload,
    ) -> ContentResult<Block> {
        let mut material = self.load_owned(actor, material_id).await?;
        let payload = payload.validated()?;

        let block = material.add_block(payload).clone();
        self.save(&mut material).await?;

        tracing::info!(
            material_id = %material_id,
            block_id = %block.block_id,
            position = block.position,
            "Block added"
        );

        Ok(block)
    }

    pub async fn update_block(
        &self,
        actor: &Identity,
        material_id: &MaterialId,
        block_id: &BlockId,
        payload: BlockPayload,
    ) -> ContentResult<Block> {
        let mut material = self.load_owned(actor, material_id).await?;
        let payload = payload.validated()?;

        let block = material.update_block(block_id, payload)?.clone();
        self.save(&mut material).await?;

        tracing::info!(material_id = %material_id, block_id = %block_id, "Block updated");

        Ok(block)
    }

    pub async fn delete_block(
        &self,
        actor: &Identity,
        material_id: &MaterialId,
        block_id: &BlockId,
    ) -> ContentResult<()> {
        let mut material = self.load_owned(actor, material_id).await?;

        material.delete_block(block_id)?;
        self.save(&mut material).await?;

        tracing::info!(material_id = %material_id, block_id = %block_id, "Block deleted");

        Ok(())
    }

    /// Nothing is persisted when `order` is rejected.
    pub async fn reorder_blocks(
        &self,
        actor: &Identity,
        material_id: &MaterialId,
        order: &[BlockId],
    ) -> ContentResult<Material> {
        let mut material = self.load_owned(actor, material_id).await?;

        material.reorder(order)?;
        self.save(&mut material).await?;

        tracing::info!(material_id = %material_id, blocks = order.len(), "Blocks reordered");

        Ok(material)
    }

    pub async fn publish(&self, actor: &Identity, material_id: &MaterialId) -> ContentResult<Material> {
        let mut material = self.load_owned(actor, material_id).await?;

        material.publish()?;
        self.save(&mut material).await?;

        tracing::info!(material_id = %material_id, "Material published");

        Ok(material)
    }

    async fn load_owned(&self, actor: &Identity, material_id: &MaterialId) -> ContentResult<Material> {
        let material = self
            .material_repo
            .find_material(material_id)
            .await?
            .ok_or(ContentError::MaterialNotFound)?;
        material.ensure_owner(&actor.user_id)?;
        Ok(material)
    }

    async fn save(&self, material: &mut Material) -> ContentResult<()> {
        self.material_repo.save_material(material).await?;
        material.mark_saved();
        Ok(())
    }

    async fn metadata(&self, input: MaterialInput) -> ContentResult<MaterialMetadata> {
        let title = Title::new(&input.title)?;
        let description = Description::new(input.description.as_deref())?;

        let subject_id = match input.subject_id {
            Some(raw) => {
                let subject_id = SubjectId::from_uuid(raw);
                if !self.subject_repo.subject_exists(&subject_id).await? {
                    return Err(ContentError::SubjectNotFound);
                }
                Some(subject_id)
            }
            None => None,
        };

        Ok(MaterialMetadata {
            title,
            description,
            subject_id,
        })
    }
}
