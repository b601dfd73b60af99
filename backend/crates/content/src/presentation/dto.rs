//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use platform::storage::StoredObject;

use crate::domain::entity::{
    block::Block,
    material::{Material, MaterialSummary},
    progress::{ProgressItem, ProgressRecord},
    subject::{Subject, SubjectSummary},
};
use crate::domain::repository::{CatalogSort, Statistics, TeacherSummary};
use crate::domain::value_object::{block_payload::BlockPayload, material_status::MaterialStatus};

// ============================================================================
// Materials
// ============================================================================

/// Body of `POST /materials` and `PUT /materials/{id}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRequest {
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBlocksRequest {
    pub block_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub id: Uuid,
    pub position: i32,
    /// Inlines `type` and the payload fields
    #[serde(flatten)]
    pub payload: BlockPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Block> for BlockResponse {
    fn from(block: &Block) -> Self {
        Self {
            id: block.block_id.into_uuid(),
            position: block.position,
            payload: block.payload.clone(),
            created_at: block.created_at,
            updated_at: block.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<Uuid>,
    pub status: MaterialStatus,
    pub version: i64,
    pub blocks: Vec<BlockResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&Material> for MaterialResponse {
    fn from(material: &Material) -> Self {
        Self {
            id: material.material_id.into_uuid(),
            owner_id: material.owner_id.into_uuid(),
            title: material.title.as_str().to_string(),
            description: material.description.as_deref().map(str::to_string),
            subject_id: material.subject_id.map(|s| s.into_uuid()),
            status: material.status,
            version: material.version,
            blocks: material.blocks().iter().map(BlockResponse::from).collect(),
            created_at: material.created_at,
            updated_at: material.updated_at,
            published_at: material.published_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSummaryResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub author_name: String,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<Uuid>,
    pub subject_name: Option<String>,
    pub status: MaterialStatus,
    pub block_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<MaterialSummary> for MaterialSummaryResponse {
    fn from(summary: MaterialSummary) -> Self {
        Self {
            id: summary.material_id.into_uuid(),
            owner_id: summary.owner_id.into_uuid(),
            author_name: summary.author_name,
            title: summary.title,
            description: summary.description,
            subject_id: summary.subject_id.map(|s| s.into_uuid()),
            subject_name: summary.subject_name,
            status: summary.status,
            block_count: summary.block_count,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            published_at: summary.published_at,
        }
    }
}

// ============================================================================
// Media
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

impl From<StoredObject> for UploadResponse {
    fn from(object: StoredObject) -> Self {
        Self {
            url: object.url,
            key: object.key,
            content_type: object.content_type,
            size: object.size,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedVideoRequest {
    pub url: String,
}

// ============================================================================
// Catalog
// ============================================================================

/// `GET /catalog/materials` query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMaterialQuery {
    pub subject_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    /// Matches title
    pub q: Option<String>,
    #[serde(default)]
    pub sort: CatalogSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /catalog/teachers` query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherQuery {
    pub subject_id: Option<Uuid>,
    /// Matches the teacher's name
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResponse {
    pub id: Uuid,
    pub name: String,
    /// Published materials filed under the subject
    pub material_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<SubjectSummary> for SubjectResponse {
    fn from(summary: SubjectSummary) -> Self {
        Self {
            material_count: summary.material_count,
            ..SubjectResponse::from(&summary.subject)
        }
    }
}

impl From<&Subject> for SubjectResponse {
    fn from(subject: &Subject) -> Self {
        Self {
            id: subject.subject_id.into_uuid(),
            name: subject.name.as_str().to_string(),
            material_count: 0,
            created_at: subject.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherResponse {
    pub id: Uuid,
    pub full_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub material_count: i64,
}

impl From<TeacherSummary> for TeacherResponse {
    fn from(teacher: TeacherSummary) -> Self {
        Self {
            id: teacher.user_id.into_uuid(),
            full_name: teacher.full_name,
            bio: teacher.bio,
            avatar_url: teacher.avatar_url,
            material_count: teacher.material_count,
        }
    }
}

// ============================================================================
// Student
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub material_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub favorite: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&ProgressRecord> for ProgressResponse {
    fn from(record: &ProgressRecord) -> Self {
        Self {
            material_id: record.material_id.into_uuid(),
            completed: record.completed,
            completed_at: record.completed_at,
            favorite: record.favorite,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressItemResponse {
    #[serde(flatten)]
    pub progress: ProgressResponse,
    pub material: MaterialSummaryResponse,
}

impl From<ProgressItem> for ProgressItemResponse {
    fn from(item: ProgressItem) -> Self {
        Self {
            progress: ProgressResponse::from(&item.record),
            material: item.material.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub material_id: Uuid,
    pub favorite: bool,
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubjectRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub students: i64,
    pub teachers: i64,
    pub admins: i64,
    pub blocked: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialStatistics {
    pub draft: i64,
    pub published: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub users: UserStatistics,
    pub materials: MaterialStatistics,
    pub blocks: i64,
    pub completions: i64,
    pub favorites: i64,
}

impl From<Statistics> for StatisticsResponse {
    fn from(stats: Statistics) -> Self {
        Self {
            users: UserStatistics {
                students: stats.students,
                teachers: stats.teachers,
                admins: stats.admins,
                blocked: stats.blocked_users,
            },
            materials: MaterialStatistics {
                draft: stats.draft_materials,
                published: stats.published_materials,
            },
            blocks: stats.blocks,
            completions: stats.completions,
            favorites: stats.favorites,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_response_inlines_payload() {
        let block = Block {
            block_id: kernel::id::BlockId::new(),
            position: 2,
            payload: BlockPayload::Text {
                content: "Hello".into(),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let body = serde_json::to_value(BlockResponse::from(&block)).unwrap();
        assert_eq!(body["type"], "text");
        assert_eq!(body["content"], "Hello");
        assert_eq!(body["position"], 2);
        assert!(body.get("payload").is_none());
    }

    #[test]
    fn test_catalog_query_defaults() {
        let query: CatalogMaterialQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query.sort, CatalogSort::Newest);

        let query: CatalogMaterialQuery =
            serde_json::from_value(json!({ "sort": "title", "perPage": 5 })).unwrap();
        assert_eq!(query.sort, CatalogSort::Title);
        assert_eq!(query.per_page, Some(5));
    }

    #[test]
    fn test_statistics_shape() {
        let body = serde_json::to_value(StatisticsResponse::from(Statistics {
            students: 3,
            blocked_users: 1,
            published_materials: 2,
            ..Statistics::default()
        }))
        .unwrap();

        assert_eq!(body["users"]["students"], 3);
        assert_eq!(body["users"]["blocked"], 1);
        assert_eq!(body["materials"]["published"], 2);
        assert_eq!(body["favorites"], 0);
    }
}
