//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::{MaterialId, SubjectId, UserId};
use kernel::pagination::PageRequest;
use serde::{Deserialize, Serialize};

use crate::domain::entity::{
    material::{Material, MaterialSummary},
    progress::{ProgressItem, ProgressRecord},
    subject::{Subject, SubjectSummary},
};
use crate::domain::value_object::material_status::MaterialStatus;
use crate::error::ContentResult;

// ============================================================================
// Query types
// ============================================================================

/// Catalog ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSort {
    /// Most recently published first
    #[default]
    Newest,
    Oldest,
    /// Case-insensitive by title
    Title,
}

/// Published material search
#[derive(Debug, Clone, Default)]
pub struct MaterialSearch {
    pub subject_id: Option<SubjectId>,
    /// Case-insensitive substring of the title
    pub query: Option<String>,
    pub teacher_id: Option<UserId>,
    pub sort: CatalogSort,
}

#[derive(Debug, Clone, Default)]
pub struct TeacherSearch {
    /// Case-insensitive substring of the teacher's name
    pub query: Option<String>,
    /// Only teachers with a published material in this subject
    pub subject_id: Option<SubjectId>,
}

/// Public teacher card
#[derive(Debug, Clone)]
pub struct TeacherSummary {
    pub user_id: UserId,
    pub full_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Published materials only
    pub material_count: i64,
}

/// Platform-wide counters for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub students: i64,
    pub teachers: i64,
    pub admins: i64,
    pub blocked_users: i64,
    pub draft_materials: i64,
    pub published_materials: i64,
    pub blocks: i64,
    pub completions: i64,
    pub favorites: i64,
}

// ============================================================================
// Repositories
// ============================================================================

/// Material aggregate repository trait
#[trait_variant::make(MaterialRepository: Send)]
pub trait LocalMaterialRepository {
    async fn create_material(&self, material: &Material) -> ContentResult<()>;

    /// Loads the material with all of its blocks.
    async fn find_material(&self, material_id: &MaterialId) -> ContentResult<Option<Material>>;

    async fn find_material_status(
        &self,
        material_id: &MaterialId,
    ) -> ContentResult<Option<MaterialStatus>>;

    /// Newest first, drafts included.
    async fn list_materials_by_owner(&self, owner_id: &UserId)
    -> ContentResult<Vec<MaterialSummary>>;

    /// Persist metadata, status and the full block list in one unit of
    /// work. The stored version must still equal `material.version`,
    /// otherwise `ContentError::ConcurrentModification`.
    async fn save_material(&self, material: &Material) -> ContentResult<()>;
}

/// Subject repository trait
#[trait_variant::make(SubjectRepository: Send)]
pub trait LocalSubjectRepository {
    /// A duplicate name (case-insensitive) yields `ContentError::SubjectExists`.
    async fn create_subject(&self, subject: &Subject) -> ContentResult<()>;

    /// Alphabetical
    async fn list_subjects(&self) -> ContentResult<Vec<SubjectSummary>>;

    async fn subject_exists(&self, subject_id: &SubjectId) -> ContentResult<bool>;
}

/// Student progress repository trait
#[trait_variant::make(ProgressRepository: Send)]
pub trait LocalProgressRepository {
    /// Create or complete the record. Completing twice keeps the first
    /// `completed_at`.
    async fn mark_complete(
        &self,
        user_id: &UserId,
        material_id: &MaterialId,
    ) -> ContentResult<ProgressRecord>;

    /// Flip the favorite flag atomically and return the new value.
    async fn toggle_favorite(&self, user_id: &UserId, material_id: &MaterialId)
    -> ContentResult<bool>;

    /// Records for published materials, most recently touched first.
    async fn list_progress(&self, user_id: &UserId) -> ContentResult<Vec<ProgressItem>>;

    async fn list_favorites(&self, user_id: &UserId) -> ContentResult<Vec<MaterialSummary>>;
}

/// Public catalog queries
#[trait_variant::make(CatalogRepository: Send)]
pub trait LocalCatalogRepository {
    /// Published materials by unblocked authors; returns the page and the
    /// total match count.
    async fn search_materials(
        &self,
        search: &MaterialSearch,
        page: PageRequest,
    ) -> ContentResult<(Vec<MaterialSummary>, u64)>;

    async fn search_teachers(
        &self,
        search: &TeacherSearch,
        page: PageRequest,
    ) -> ContentResult<(Vec<TeacherSummary>, u64)>;
}

#[trait_variant::make(StatisticsRepository: Send)]
pub trait LocalStatisticsRepository {
    async fn statistics(&self) -> ContentResult<Statistics>;
}

/// Everything the content handlers need from one store
pub trait ContentStore:
    MaterialRepository
    + SubjectRepository
    + ProgressRepository
    + CatalogRepository
    + StatisticsRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> ContentStore for T where
    T: MaterialRepository
        + SubjectRepository
        + ProgressRepository
        + CatalogRepository
        + StatisticsRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
