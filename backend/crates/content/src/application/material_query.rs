//! Material Query Use Case

use std::sync::Arc;

use auth::Identity;
use kernel::id::{MaterialId, UserId};

use crate::domain::entity::material::{Material, MaterialSummary};
use crate::domain::repository::MaterialRepository;
use crate::error::{ContentError, ContentResult};

pub struct MaterialQueryUseCase<M>
where
    M: MaterialRepository,
{
    material_repo: Arc<M>,
}

impl<M> MaterialQueryUseCase<M>
where
    M: MaterialRepository,
{
    pub fn new(material_repo: Arc<M>) -> Self {
        Self { material_repo }
    }

    /// Drafts the viewer may not see are reported as missing.
    pub async fn get(&self, viewer: &Identity, material_id: &MaterialId) -> ContentResult<Material> {
        match self.material_repo.find_material(material_id).await? {
            Some(material) if material.is_visible_to(viewer) => Ok(material),
            _ => Err(ContentError::MaterialNotFound),
        }
    }

    pub async fn list_mine(&self, owner_id: &UserId) -> ContentResult<Vec<MaterialSummary>> {
        self.material_repo.list_materials_by_owner(owner_id).await
    }
}
