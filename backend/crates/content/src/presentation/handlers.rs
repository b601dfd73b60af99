//! HTTP Handlers

use std::sync::Arc;

use auth::gate::CurrentUser;
use auth::upload::read_file_field;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::extract::{Json, Path, Query};
use kernel::id::{BlockId, MaterialId, SubjectId, UserId};
use kernel::pagination::{Page, PageRequest};
use platform::media::MediaKind;
use platform::storage::ObjectStorage;
use uuid::Uuid;

use crate::application::{
    AdminContentUseCase, CatalogUseCase, ContentConfig, MaterialAuthoringUseCase, MaterialInput,
    MaterialQueryUseCase, MediaUseCase, ProgressUseCase, embed_video,
};
use crate::domain::repository::{ContentStore, MaterialSearch, TeacherSearch};
use crate::domain::value_object::{block_payload::BlockPayload, embed::EmbedVideo};
use crate::error::ContentResult;
use crate::presentation::dto::{
    BlockResponse, CatalogMaterialQuery, CreateSubjectRequest, EmbedVideoRequest,
    FavoriteResponse, MaterialRequest, MaterialResponse, MaterialSummaryResponse,
    ProgressItemResponse, ProgressResponse, ReorderBlocksRequest, StatisticsResponse,
    SubjectResponse, TeacherQuery, TeacherResponse, UploadResponse,
};

/// Shared state for content handlers
pub struct ContentAppState<R, S>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    pub repo: Arc<R>,
    pub storage: Arc<S>,
    pub config: Arc<ContentConfig>,
}

impl<R, S> Clone for ContentAppState<R, S>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            storage: self.storage.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, S> ContentAppState<R, S>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    fn authoring(&self) -> MaterialAuthoringUseCase<R, R> {
        MaterialAuthoringUseCase::new(self.repo.clone(), self.repo.clone())
    }

    fn progress(&self) -> ProgressUseCase<R, R> {
        ProgressUseCase::new(self.repo.clone(), self.repo.clone())
    }

    fn catalog(&self) -> CatalogUseCase<R, R> {
        CatalogUseCase::new(self.repo.clone(), self.repo.clone())
    }
}

impl From<MaterialRequest> for MaterialInput {
    fn from(req: MaterialRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            subject_id: req.subject_id,
        }
    }
}

// ============================================================================
// Materials
// ============================================================================

/// POST /materials
pub async fn create_material<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<MaterialRequest>,
) -> ContentResult<impl IntoResponse>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let material = state.authoring().create(&identity, req.into()).await?;
    Ok((StatusCode::CREATED, Json(MaterialResponse::from(&material))))
}

/// GET /materials/my
pub async fn list_my_materials<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
) -> ContentResult<Json<Vec<MaterialSummaryResponse>>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let materials = MaterialQueryUseCase::new(state.repo.clone())
        .list_mine(&identity.user_id)
        .await?;
    Ok(Json(materials.into_iter().map(Into::into).collect()))
}

/// GET /materials/{id}
pub async fn get_material<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path(material_id): Path<Uuid>,
) -> ContentResult<Json<MaterialResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let material = MaterialQueryUseCase::new(state.repo.clone())
        .get(&identity, &MaterialId::from_uuid(material_id))
        .await?;
    Ok(Json(MaterialResponse::from(&material)))
}

/// PUT /materials/{id}
pub async fn update_material<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path(material_id): Path<Uuid>,
    Json(req): Json<MaterialRequest>,
) -> ContentResult<Json<MaterialResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let material = state
        .authoring()
        .update_metadata(&identity, &MaterialId::from_uuid(material_id), req.into())
        .await?;
    Ok(Json(MaterialResponse::from(&material)))
}

/// POST /materials/{id}/publish
pub async fn publish_material<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path(material_id): Path<Uuid>,
) -> ContentResult<Json<MaterialResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let material = state
        .authoring()
        .publish(&identity, &MaterialId::from_uuid(material_id))
        .await?;
    Ok(Json(MaterialResponse::from(&material)))
}

// ============================================================================
// Blocks
// ============================================================================

/// POST /materials/{id}/blocks
pub async fn add_block<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path(material_id): Path<Uuid>,
    Json(payload): Json<BlockPayload>,
) -> ContentResult<impl IntoResponse>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let block = state
        .authoring()
        .add_block(&identity, &MaterialId::from_uuid(material_id), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(BlockResponse::from(&block))))
}

/// PUT /materials/{id}/blocks/{block_id}
pub async fn update_block<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path((material_id, block_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<BlockPayload>,
) -> ContentResult<Json<BlockResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let block = state
        .authoring()
        .update_block(
            &identity,
            &MaterialId::from_uuid(material_id),
            &BlockId::from_uuid(block_id),
            payload,
        )
        .await?;
    Ok(Json(BlockResponse::from(&block)))
}

/// DELETE /materials/{id}/blocks/{block_id}
pub async fn delete_block<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path((material_id, block_id)): Path<(Uuid, Uuid)>,
) -> ContentResult<StatusCode>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    state
        .authoring()
        .delete_block(
            &identity,
            &MaterialId::from_uuid(material_id),
            &BlockId::from_uuid(block_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /materials/{id}/blocks/reorder
pub async fn reorder_blocks<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path(material_id): Path<Uuid>,
    Json(req): Json<ReorderBlocksRequest>,
) -> ContentResult<Json<MaterialResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let order: Vec<BlockId> = req.block_ids.into_iter().map(BlockId::from_uuid).collect();
    let material = state
        .authoring()
        .reorder_blocks(&identity, &MaterialId::from_uuid(material_id), &order)
        .await?;
    Ok(Json(MaterialResponse::from(&material)))
}

// ============================================================================
// Media
// ============================================================================

async fn upload<R, S>(
    state: ContentAppState<R, S>,
    user_id: UserId,
    kind: MediaKind,
    mut multipart: Multipart,
) -> ContentResult<Json<UploadResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let upload = read_file_field(&mut multipart).await?;
    let stored = MediaUseCase::new(state.storage.clone(), state.config.clone())
        .upload(&user_id, kind, &upload.content_type, upload.bytes)
        .await?;
    Ok(Json(stored.into()))
}

/// POST /upload/image (multipart `file`)
pub async fn upload_image<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    multipart: Multipart,
) -> ContentResult<Json<UploadResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    upload(state, identity.user_id, MediaKind::Image, multipart).await
}

/// POST /upload/video (multipart `file`)
pub async fn upload_video<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    multipart: Multipart,
) -> ContentResult<Json<UploadResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    upload(state, identity.user_id, MediaKind::Video, multipart).await
}

/// POST /embed/video
pub async fn embed_video_link(Json(req): Json<EmbedVideoRequest>) -> ContentResult<Json<EmbedVideo>> {
    Ok(Json(embed_video(&req.url)?))
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /catalog/materials
pub async fn catalog_materials<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Query(query): Query<CatalogMaterialQuery>,
) -> ContentResult<Json<Page<MaterialSummaryResponse>>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let search = MaterialSearch {
        subject_id: query.subject_id.map(SubjectId::from_uuid),
        query: query.q,
        teacher_id: query.teacher_id.map(UserId::from_uuid),
        sort: query.sort,
    };
    let page = PageRequest::new(query.page, query.per_page);

    let materials = state.catalog().materials(search, page).await?;
    Ok(Json(materials.map(Into::into)))
}

/// GET /catalog/subjects
pub async fn catalog_subjects<R, S>(
    State(state): State<ContentAppState<R, S>>,
) -> ContentResult<Json<Vec<SubjectResponse>>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let subjects = state.catalog().subjects().await?;
    Ok(Json(subjects.into_iter().map(Into::into).collect()))
}

/// GET /catalog/teachers
pub async fn catalog_teachers<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Query(query): Query<TeacherQuery>,
) -> ContentResult<Json<Page<TeacherResponse>>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let search = TeacherSearch {
        query: query.q,
        subject_id: query.subject_id.map(SubjectId::from_uuid),
    };
    let page = PageRequest::new(query.page, query.per_page);

    let teachers = state.catalog().teachers(search, page).await?;
    Ok(Json(teachers.map(Into::into)))
}

// ============================================================================
// Student
// ============================================================================

/// GET /student/progress
pub async fn list_progress<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
) -> ContentResult<Json<Vec<ProgressItemResponse>>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let items = state.progress().progress(&identity.user_id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// GET /student/favorites
pub async fn list_favorites<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
) -> ContentResult<Json<Vec<MaterialSummaryResponse>>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let materials = state.progress().favorites(&identity.user_id).await?;
    Ok(Json(materials.into_iter().map(Into::into).collect()))
}

/// POST /student/materials/{id}/complete
pub async fn complete_material<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path(material_id): Path<Uuid>,
) -> ContentResult<Json<ProgressResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let record = state
        .progress()
        .mark_complete(&identity.user_id, &MaterialId::from_uuid(material_id))
        .await?;
    Ok(Json(ProgressResponse::from(&record)))
}

/// POST /student/materials/{id}/favorite
pub async fn toggle_favorite<R, S>(
    State(state): State<ContentAppState<R, S>>,
    CurrentUser(identity): CurrentUser,
    Path(material_id): Path<Uuid>,
) -> ContentResult<Json<FavoriteResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let favorite = state
        .progress()
        .toggle_favorite(&identity.user_id, &MaterialId::from_uuid(material_id))
        .await?;
    Ok(Json(FavoriteResponse {
        material_id,
        favorite,
    }))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /admin/statistics
pub async fn statistics<R, S>(
    State(state): State<ContentAppState<R, S>>,
) -> ContentResult<Json<StatisticsResponse>>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let stats = AdminContentUseCase::new(state.repo.clone(), state.repo.clone())
        .statistics()
        .await?;
    Ok(Json(stats.into()))
}

/// POST /admin/subjects
pub async fn create_subject<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Json(req): Json<CreateSubjectRequest>,
) -> ContentResult<impl IntoResponse>
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let subject = AdminContentUseCase::new(state.repo.clone(), state.repo.clone())
        .create_subject(&req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(SubjectResponse::from(&subject))))
}
