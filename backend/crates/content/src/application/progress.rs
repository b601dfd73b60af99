//! Progress Use Case
//!
//! Completion and favorites for the calling user. Only published
//! materials can be marked.

use std::sync::Arc;

use kernel::id::{MaterialId, UserId};

use crate::domain::entity::{
    material::MaterialSummary,
    progress::{ProgressItem, ProgressRecord},
};
use crate::domain::repository::{MaterialRepository, ProgressRepository};
use crate::error::{ContentError, ContentResult};

pub struct ProgressUseCase<M, P>
where
    M: MaterialRepository,
    P: ProgressRepository,
{
    material_repo: Arc<M>,
    progress_repo: Arc<P>,
}

impl<M, P> ProgressUseCase<M, P>
where
    M: MaterialRepository,
    P: ProgressRepository,
{
    pub fn new(material_repo: Arc<M>, progress_repo: Arc<P>) -> Self {
        Self {
            material_repo,
            progress_repo,
        }
    }

    pub async fn mark_complete(
        &self,
        user_id: &UserId,
        material_id: &MaterialId,
    ) -> ContentResult<ProgressRecord> {
        self.ensure_published(material_id).await?;
        let record = self.progress_repo.mark_complete(user_id, material_id).await?;

        tracing::debug!(user_id = %user_id, material_id = %material_id, "Material completed");

        Ok(record)
    }

    pub async fn toggle_favorite(
        &self,
        user_id: &UserId,
        material_id: &MaterialId,
    ) -> ContentResult<bool> {
        self.ensure_published(material_id).await?;
        let favorite = self
            .progress_repo
            .toggle_favorite(user_id, material_id)
            .await?;

        tracing::debug!(user_id = %user_id, material_id = %material_id, favorite, "Favorite toggled");

        Ok(favorite)
    }

    pub async fn progress(&self, user_id: &UserId) -> ContentResult<Vec<ProgressItem>> {
        self.progress_repo.list_progress(user_id).await
    }

    pub async fn favorites(&self, user_id: &UserId) -> ContentResult<Vec<MaterialSummary>> {
        self.progress_repo.list_favorites(user_id).await
    }

    async fn ensure_published(&self, material_id: &MaterialId) -> ContentResult<()> {
        match self.material_repo.find_material_status(material_id).await? {
            Some(status) if status.is_published() => Ok(()),
            _ => Err(ContentError::MaterialNotFound),
        }
    }
}
