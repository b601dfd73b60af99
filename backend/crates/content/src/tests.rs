//! Use-case and router tests for the content crate, backed by in-memory
//! repositories and object storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use auth::{Identity, UserRole};
use bytes::Bytes;
use chrono::Utc;
use kernel::id::{MaterialId, SubjectId, UserId};
use kernel::pagination::PageRequest;
use platform::storage::{ObjectStorage, StorageError, StoredObject};

use crate::domain::entity::{
    material::{Material, MaterialSummary},
    progress::{ProgressItem, ProgressRecord},
    subject::{Subject, SubjectSummary},
};
use crate::domain::repository::{
    CatalogRepository, CatalogSort, MaterialRepository, MaterialSearch, ProgressRepository,
    Statistics, StatisticsRepository, SubjectRepository, TeacherSearch, TeacherSummary,
};
use crate::domain::value_object::material_status::MaterialStatus;
use crate::error::{ContentError, ContentResult};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

// ============================================================================
// In-memory doubles
// ============================================================================

#[derive(Clone)]
struct Account {
    full_name: String,
    role: UserRole,
    blocked: bool,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, Account>,
    materials: HashMap<MaterialId, Material>,
    subjects: Vec<Subject>,
    progress: HashMap<(UserId, MaterialId), ProgressRecord>,
}

impl MemoryState {
    fn summary(&self, material: &Material) -> MaterialSummary {
        MaterialSummary {
            material_id: material.material_id,
            owner_id: material.owner_id,
            author_name: self
                .users
                .get(&material.owner_id)
                .map(|a| a.full_name.clone())
                .unwrap_or_default(),
            title: material.title.as_str().to_string(),
            description: material.description.as_deref().map(str::to_string),
            subject_id: material.subject_id,
            subject_name: material.subject_id.and_then(|id| {
                self.subjects
                    .iter()
                    .find(|s| s.subject_id == id)
                    .map(|s| s.name.as_str().to_string())
            }),
            status: material.status,
            block_count: material.blocks().len() as i64,
            created_at: material.created_at,
            updated_at: material.updated_at,
            published_at: material.published_at,
        }
    }

    fn is_published(&self, material_id: &MaterialId) -> bool {
        self.materials
            .get(material_id)
            .is_some_and(|m| m.status.is_published())
    }

    fn published_by(&self, owner_id: &UserId) -> impl Iterator<Item = &Material> {
        self.materials
            .values()
            .filter(move |m| m.owner_id == *owner_id && m.status.is_published())
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (items, total)
}

#[derive(Clone, Default)]
pub(crate) struct MemoryContentStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryContentStore {
    fn add_user(&self, role: UserRole, full_name: &str) -> Identity {
        let user_id = UserId::new();
        self.state.lock().unwrap().users.insert(
            user_id,
            Account {
                full_name: full_name.to_string(),
                role,
                blocked: false,
            },
        );
        Identity::new(user_id, role)
    }

    fn block_user(&self, user_id: &UserId) {
        if let Some(account) = self.state.lock().unwrap().users.get_mut(user_id) {
            account.blocked = true;
        }
    }

    fn stored(&self, material_id: &MaterialId) -> Material {
        self.state.lock().unwrap().materials[material_id].clone()
    }
}

impl MaterialRepository for MemoryContentStore {
    async fn create_material(&self, material: &Material) -> ContentResult<()> {
        self.state
            .lock()
            .unwrap()
            .materials
            .insert(material.material_id, material.clone());
        Ok(())
    }

    async fn find_material(&self, material_id: &MaterialId) -> ContentResult<Option<Material>> {
        Ok(self.state.lock().unwrap().materials.get(material_id).cloned())
    }

    async fn find_material_status(
        &self,
        material_id: &MaterialId,
    ) -> ContentResult<Option<MaterialStatus>> {
        let state = self.state.lock().unwrap();
        Ok(state.materials.get(material_id).map(|m| m.status))
    }

    async fn list_materials_by_owner(
        &self,
        owner_id: &UserId,
    ) -> ContentResult<Vec<MaterialSummary>> {
        let state = self.state.lock().unwrap();
        let mut owned: Vec<&Material> = state
            .materials
            .values()
            .filter(|m| m.owner_id == *owner_id)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned.into_iter().map(|m| state.summary(m)).collect())
    }

    async fn save_material(&self, material: &Material) -> ContentResult<()> {
        let mut state = self.state.lock().unwrap();
        match state.materials.get(&material.material_id) {
            Some(stored) if stored.version == material.version => {}
            _ => return Err(ContentError::ConcurrentModification),
        }
        let mut saved = material.clone();
        saved.mark_saved();
        state.materials.insert(saved.material_id, saved);
        Ok(())
    }
}

impl SubjectRepository for MemoryContentStore {
    async fn create_subject(&self, subject: &Subject) -> ContentResult<()> {
        let mut state = self.state.lock().unwrap();
        let name = subject.name.as_str().to_lowercase();
        if state
            .subjects
            .iter()
            .any(|s| s.name.as_str().to_lowercase() == name)
        {
            return Err(ContentError::SubjectExists);
        }
        state.subjects.push(subject.clone());
        Ok(())
    }

    async fn list_subjects(&self) -> ContentResult<Vec<SubjectSummary>> {
        let state = self.state.lock().unwrap();
        let mut subjects: Vec<SubjectSummary> = state
            .subjects
            .iter()
            .map(|subject| SubjectSummary {
                subject: subject.clone(),
                material_count: state
                    .materials
                    .values()
                    .filter(|m| m.subject_id == Some(subject.subject_id) && m.status.is_published())
                    .count() as i64,
            })
            .collect();
        subjects.sort_by_key(|s| s.subject.name.as_str().to_lowercase());
        Ok(subjects)
    }

    async fn subject_exists(&self, subject_id: &SubjectId) -> ContentResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.subjects.iter().any(|s| s.subject_id == *subject_id))
    }
}

impl ProgressRepository for MemoryContentStore {
    async fn mark_complete(
        &self,
        user_id: &UserId,
        material_id: &MaterialId,
    ) -> ContentResult<ProgressRecord> {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();
        let record = state
            .progress
            .entry((*user_id, *material_id))
            .or_insert_with(|| ProgressRecord::new(*user_id, *material_id, now));
        record.mark_complete(now);
        Ok(record.clone())
    }

    async fn toggle_favorite(
        &self,
        user_id: &UserId,
        material_id: &MaterialId,
    ) -> ContentResult<bool> {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();
        let record = state
            .progress
            .entry((*user_id, *material_id))
            .or_insert_with(|| ProgressRecord::new(*user_id, *material_id, now));
        Ok(record.toggle_favorite(now))
    }

    async fn list_progress(&self, user_id: &UserId) -> ContentResult<Vec<ProgressItem>> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<ProgressItem> = state
            .progress
            .values()
            .filter(|r| r.user_id == *user_id && state.is_published(&r.material_id))
            .map(|r| ProgressItem {
                record: r.clone(),
                material: state.summary(&state.materials[&r.material_id]),
            })
            .collect();
        items.sort_by(|a, b| b.record.updated_at.cmp(&a.record.updated_at));
        Ok(items)
    }

    async fn list_favorites(&self, user_id: &UserId) -> ContentResult<Vec<MaterialSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .progress
            .values()
            .filter(|r| r.user_id == *user_id && r.favorite && state.is_published(&r.material_id))
            .map(|r| state.summary(&state.materials[&r.material_id]))
            .collect())
    }
}

impl CatalogRepository for MemoryContentStore {
    async fn search_materials(
        &self,
        search: &MaterialSearch,
        page: PageRequest,
    ) -> ContentResult<(Vec<MaterialSummary>, u64)> {
        let state = self.state.lock().unwrap();
        let mut found: Vec<MaterialSummary> = state
            .materials
            .values()
            .filter(|m| m.status.is_published())
            .filter(|m| state.users.get(&m.owner_id).is_some_and(|a| !a.blocked))
            .filter(|m| search.subject_id.is_none_or(|id| m.subject_id == Some(id)))
            .filter(|m| search.teacher_id.is_none_or(|id| m.owner_id == id))
            .filter(|m| {
                search
                    .query
                    .as_deref()
                    .is_none_or(|q| contains(m.title.as_str(), q))
            })
            .map(|m| state.summary(m))
            .collect();

        match search.sort {
            CatalogSort::Newest => found.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
            CatalogSort::Oldest => found.sort_by(|a, b| a.published_at.cmp(&b.published_at)),
            CatalogSort::Title => found.sort_by_key(|m| m.title.to_lowercase()),
        }

        Ok(paginate(found, page))
    }

    async fn search_teachers(
        &self,
        search: &TeacherSearch,
        page: PageRequest,
    ) -> ContentResult<(Vec<TeacherSummary>, u64)> {
        let state = self.state.lock().unwrap();
        let mut found: Vec<TeacherSummary> = state
            .users
            .iter()
            .filter(|(_, a)| a.role == UserRole::Teacher && !a.blocked)
            .filter(|(_, a)| search.query.as_deref().is_none_or(|q| contains(&a.full_name, q)))
            .filter(|(id, _)| {
                search.subject_id.is_none_or(|subject_id| {
                    state
                        .published_by(id)
                        .any(|m| m.subject_id == Some(subject_id))
                })
            })
            .map(|(id, a)| TeacherSummary {
                user_id: *id,
                full_name: a.full_name.clone(),
                bio: None,
                avatar_url: None,
                material_count: state.published_by(id).count() as i64,
            })
            .collect();
        found.sort_by_key(|t| t.full_name.to_lowercase());

        Ok(paginate(found, page))
    }
}

impl StatisticsRepository for MemoryContentStore {
    async fn statistics(&self) -> ContentResult<Statistics> {
        let state = self.state.lock().unwrap();
        let role_count = |role| state.users.values().filter(|a| a.role == role).count() as i64;
        let status_count =
            |status| state.materials.values().filter(|m| m.status == status).count() as i64;

        Ok(Statistics {
            students: role_count(UserRole::Student),
            teachers: role_count(UserRole::Teacher),
            admins: role_count(UserRole::Admin),
            blocked_users: state.users.values().filter(|a| a.blocked).count() as i64,
            draft_materials: status_count(MaterialStatus::Draft),
            published_materials: status_count(MaterialStatus::Published),
            blocks: state.materials.values().map(|m| m.blocks().len() as i64).sum(),
            completions: state.progress.values().filter(|r| r.completed).count() as i64,
            favorites: state.progress.values().filter(|r| r.favorite).count() as i64,
        })
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStorage {
    objects: Arc<Mutex<HashMap<String, (String, Bytes)>>>,
    fail: bool,
}

impl MemoryStorage {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

impl ObjectStorage for MemoryStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        if self.fail {
            return Err(StorageError::Timeout);
        }
        let size = bytes.len();
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(StoredObject {
            key: key.to_string(),
            url: format!("http://storage.test/{key}"),
            content_type: content_type.to_string(),
            size,
        })
    }
}

// ============================================================================
// Use cases
// ============================================================================

#[cfg(test)]
mod use_case_tests {
    use super::*;
    use crate::application::{
        AdminContentUseCase, CatalogUseCase, ContentConfig, MaterialAuthoringUseCase,
        MaterialInput, MaterialQueryUseCase, MediaUseCase, ProgressUseCase,
    };
    use crate::domain::entity::block::Block;
    use crate::domain::value_object::block_payload::BlockPayload;
    use kernel::error::kind::ErrorKind;
    use kernel::id::BlockId;
    use platform::media::MediaKind;

    type Authoring = MaterialAuthoringUseCase<MemoryContentStore, MemoryContentStore>;

    fn authoring(store: &MemoryContentStore) -> Authoring {
        MaterialAuthoringUseCase::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    fn progress(
        store: &MemoryContentStore,
    ) -> ProgressUseCase<MemoryContentStore, MemoryContentStore> {
        ProgressUseCase::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    fn catalog(store: &MemoryContentStore) -> CatalogUseCase<MemoryContentStore, MemoryContentStore> {
        CatalogUseCase::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    fn input(title: &str) -> MaterialInput {
        MaterialInput {
            title: title.to_string(),
            description: None,
            subject_id: None,
        }
    }

    fn text(content: &str) -> BlockPayload {
        BlockPayload::Text {
            content: content.to_string(),
        }
    }

    fn contents(blocks: &[Block]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| match &b.payload {
                BlockPayload::Text { content } => content.clone(),
                other => other.kind().to_string(),
            })
            .collect()
    }

    /// Teacher-owned material with the given text blocks
    async fn material_with(
        store: &MemoryContentStore,
        teacher: &Identity,
        title: &str,
        blocks: &[&str],
    ) -> (MaterialId, Vec<BlockId>) {
        let authoring = authoring(store);
        let material = authoring.create(teacher, input(title)).await.unwrap();
        let mut ids = Vec::new();
        for content in blocks {
            let block = authoring
                .add_block(teacher, &material.material_id, text(content))
                .await
                .unwrap();
            ids.push(block.block_id);
        }
        (material.material_id, ids)
    }

    async fn published(store: &MemoryContentStore, teacher: &Identity, title: &str) -> MaterialId {
        let (material_id, _) = material_with(store, teacher, title, &["intro"]).await;
        authoring(store).publish(teacher, &material_id).await.unwrap();
        material_id
    }

    #[tokio::test]
    async fn test_publish_requires_blocks_and_ownership() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let other = store.add_user(UserRole::Teacher, "Alan Turing");
        let authoring = authoring(&store);

        let material = authoring.create(&teacher, input("Compilers")).await.unwrap();
        assert_eq!(material.status, MaterialStatus::Draft);
        assert!(matches!(
            authoring.publish(&teacher, &material.material_id).await,
            Err(ContentError::EmptyMaterial)
        ));

        let block = authoring
            .add_block(&teacher, &material.material_id, text("Lexing"))
            .await
            .unwrap();
        let published = authoring.publish(&teacher, &material.material_id).await.unwrap();
        assert_eq!(published.status, MaterialStatus::Published);
        assert!(matches!(
            authoring.publish(&teacher, &material.material_id).await,
            Err(ContentError::AlreadyPublished)
        ));

        assert!(matches!(
            authoring
                .update_block(&other, &material.material_id, &block.block_id, text("Parsing"))
                .await,
            Err(ContentError::NotOwner)
        ));
        assert_eq!(contents(store.stored(&material.material_id).blocks()), vec!["Lexing"]);

        // Published materials stay editable by their author
        authoring
            .update_block(&teacher, &material.material_id, &block.block_id, text("Parsing"))
            .await
            .unwrap();
        assert_eq!(contents(store.stored(&material.material_id).blocks()), vec!["Parsing"]);
    }

    #[tokio::test]
    async fn test_reorder_missing_id_changes_nothing() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let (material_id, ids) = material_with(&store, &teacher, "Sorting", &["a", "b", "c"]).await;
        let version = store.stored(&material_id).version;

        let result = authoring(&store)
            .reorder_blocks(&teacher, &material_id, &[ids[2], ids[0]])
            .await;
        assert!(matches!(result, Err(ContentError::InvalidOrder)));

        let stored = store.stored(&material_id);
        assert_eq!(contents(stored.blocks()), vec!["a", "b", "c"]);
        assert_eq!(stored.version, version);
    }

    #[tokio::test]
    async fn test_block_edits_keep_positions_contiguous() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let (material_id, ids) =
            material_with(&store, &teacher, "Trees", &["a", "b", "c", "d"]).await;
        let authoring = authoring(&store);

        authoring
            .delete_block(&teacher, &material_id, &ids[1])
            .await
            .unwrap();
        authoring
            .reorder_blocks(&teacher, &material_id, &[ids[3], ids[0], ids[2]])
            .await
            .unwrap();
        authoring
            .add_block(&teacher, &material_id, text("e"))
            .await
            .unwrap();

        let stored = store.stored(&material_id);
        assert_eq!(contents(stored.blocks()), vec!["d", "a", "c", "e"]);
        let positions: Vec<i32> = stored.blocks().iter().map(|b| b.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);

        assert!(matches!(
            authoring.delete_block(&teacher, &material_id, &ids[1]).await,
            Err(ContentError::BlockNotFound)
        ));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_mutate() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let admin = store.add_user(UserRole::Admin, "Root");
        let (material_id, ids) = material_with(&store, &teacher, "Graphs", &["a", "b"]).await;
        let before = store.stored(&material_id);
        let authoring = authoring(&store);

        let results = [
            authoring
                .update_metadata(&admin, &material_id, input("Hijacked"))
                .await
                .err(),
            authoring.add_block(&admin, &material_id, text("x")).await.err(),
            authoring
                .delete_block(&admin, &material_id, &ids[0])
                .await
                .err(),
            authoring
                .reorder_blocks(&admin, &material_id, &[ids[1], ids[0]])
                .await
                .err(),
            authoring.publish(&admin, &material_id).await.err(),
        ];
        for error in results {
            assert!(matches!(error, Some(ContentError::NotOwner)));
        }

        let after = store.stored(&material_id);
        assert_eq!(after.version, before.version);
        assert_eq!(after.title, before.title);
        assert_eq!(contents(after.blocks()), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_material_and_invalid_payload() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let authoring = authoring(&store);

        assert!(matches!(
            authoring
                .add_block(&teacher, &MaterialId::new(), text("x"))
                .await,
            Err(ContentError::MaterialNotFound)
        ));

        let (material_id, _) = material_with(&store, &teacher, "Media", &[]).await;
        let bad_image = BlockPayload::Image {
            url: "ftp://example.com/a.png".into(),
            caption: None,
            alt: None,
        };
        let err = authoring
            .add_block(&teacher, &material_id, bad_image)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(store.stored(&material_id).blocks().is_empty());

        let embed = BlockPayload::Embed {
            url: "https://youtu.be/dQw4w9WgXcQ".into(),
            caption: Some("  ".into()),
        };
        let block = authoring
            .add_block(&teacher, &material_id, embed)
            .await
            .unwrap();
        assert_eq!(
            block.payload,
            BlockPayload::Embed {
                url: "https://www.youtube.com/embed/dQw4w9WgXcQ".into(),
                caption: None,
            }
        );
    }

    #[tokio::test]
    async fn test_metadata_and_subjects() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let authoring = authoring(&store);

        let unknown = MaterialInput {
            subject_id: Some(uuid::Uuid::new_v4()),
            ..input("Algebra")
        };
        assert!(matches!(
            authoring.create(&teacher, unknown).await,
            Err(ContentError::SubjectNotFound)
        ));

        let blank = authoring.create(&teacher, input("   ")).await.unwrap_err();
        assert_eq!(blank.kind(), ErrorKind::BadRequest);

        let math = AdminContentUseCase::new(Arc::new(store.clone()), Arc::new(store.clone()))
            .create_subject("Mathematics")
            .await
            .unwrap();
        let material = authoring.create(&teacher, input("Algebra")).await.unwrap();
        let updated = authoring
            .update_metadata(
                &teacher,
                &material.material_id,
                MaterialInput {
                    title: "Linear Algebra".into(),
                    description: Some("Vectors and matrices".into()),
                    subject_id: Some(math.subject_id.into_uuid()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title.as_str(), "Linear Algebra");
        assert_eq!(updated.subject_id, Some(math.subject_id));
        assert_eq!(store.stored(&material.material_id).version, updated.version);
    }

    #[tokio::test]
    async fn test_stale_save_conflicts() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let (material_id, _) = material_with(&store, &teacher, "Races", &["a"]).await;

        let mut first = store.find_material(&material_id).await.unwrap().unwrap();
        let mut second = first.clone();

        first.add_block(text("b"));
        store.save_material(&first).await.unwrap();

        second.add_block(text("c"));
        assert!(matches!(
            store.save_material(&second).await,
            Err(ContentError::ConcurrentModification)
        ));
        assert_eq!(contents(store.stored(&material_id).blocks()), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_drafts_hidden_from_other_users() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let student = store.add_user(UserRole::Student, "Ada");
        let admin = store.add_user(UserRole::Admin, "Root");
        let (material_id, _) = material_with(&store, &teacher, "Draft", &["a"]).await;
        let query = MaterialQueryUseCase::new(Arc::new(store.clone()));

        assert!(query.get(&teacher, &material_id).await.is_ok());
        assert!(query.get(&admin, &material_id).await.is_ok());
        assert!(matches!(
            query.get(&student, &material_id).await,
            Err(ContentError::MaterialNotFound)
        ));

        authoring(&store).publish(&teacher, &material_id).await.unwrap();
        let material = query.get(&student, &material_id).await.unwrap();
        assert_eq!(contents(material.blocks()), vec!["a"]);

        let mine = query.list_mine(&teacher.user_id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].author_name, "Grace Hopper");
        assert_eq!(mine[0].block_count, 1);
    }

    #[tokio::test]
    async fn test_progress_requires_published_material() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let student = store.add_user(UserRole::Student, "Ada");
        let (draft_id, _) = material_with(&store, &teacher, "Draft", &["a"]).await;
        let progress = progress(&store);

        assert!(matches!(
            progress.mark_complete(&student.user_id, &draft_id).await,
            Err(ContentError::MaterialNotFound)
        ));
        assert!(matches!(
            progress.toggle_favorite(&student.user_id, &MaterialId::new()).await,
            Err(ContentError::MaterialNotFound)
        ));
        assert!(progress.progress(&student.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_complete_is_idempotent() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let student = store.add_user(UserRole::Student, "Ada");
        let material_id = published(&store, &teacher, "Sets").await;
        let progress = progress(&store);

        let first = progress
            .mark_complete(&student.user_id, &material_id)
            .await
            .unwrap();
        let second = progress
            .mark_complete(&student.user_id, &material_id)
            .await
            .unwrap();
        let third = progress
            .mark_complete(&student.user_id, &material_id)
            .await
            .unwrap();

        assert!(first.completed);
        assert_eq!(first, second);
        assert_eq!(second, third);

        let items = progress.progress(&student.user_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].material.title, "Sets");
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice_restores() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let student = store.add_user(UserRole::Student, "Ada");
        let material_id = published(&store, &teacher, "Logic").await;
        let progress = progress(&store);

        assert!(progress.toggle_favorite(&student.user_id, &material_id).await.unwrap());
        let favorites = progress.favorites(&student.user_id).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].material_id, material_id);

        assert!(!progress.toggle_favorite(&student.user_id, &material_id).await.unwrap());
        assert!(progress.favorites(&student.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_filters() {
        let store = MemoryContentStore::default();
        let grace = store.add_user(UserRole::Teacher, "Grace Hopper");
        let alan = store.add_user(UserRole::Teacher, "Alan Turing");
        let banned = store.add_user(UserRole::Teacher, "Mallory");
        let admin = AdminContentUseCase::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let cs = admin.create_subject("Computer Science").await.unwrap();

        let (draft, _) = material_with(&store, &grace, "Draft notes", &["a"]).await;
        published(&store, &grace, "Compilers").await;
        let with_subject = published(&store, &alan, "computability").await;
        authoring(&store)
            .update_metadata(
                &alan,
                &with_subject,
                MaterialInput {
                    description: Some("Turing machines and halting".into()),
                    subject_id: Some(cs.subject_id.into_uuid()),
                    ..input("Computability")
                },
            )
            .await
            .unwrap();
        published(&store, &banned, "Spam").await;
        store.block_user(&banned.user_id);

        let catalog = catalog(&store);
        let all = catalog
            .materials(
                MaterialSearch {
                    sort: CatalogSort::Title,
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        let titles: Vec<&str> = all.items.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Compilers", "Computability"]);
        assert_eq!(all.total, 2);
        assert!(all.items.iter().all(|m| m.material_id != draft));

        let by_subject = catalog
            .materials(
                MaterialSearch {
                    subject_id: Some(cs.subject_id),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_subject.total, 1);
        assert_eq!(by_subject.items[0].subject_name.as_deref(), Some("Computer Science"));

        let by_text = catalog
            .materials(
                MaterialSearch {
                    query: Some("  COMPIL ".into()),
                    ..Default::default()
                },
                PageRequest::new(Some(1), Some(1)),
            )
            .await
            .unwrap();
        assert_eq!(by_text.total, 1);
        assert_eq!(by_text.total_pages, 1);
        assert_eq!(by_text.items[0].author_name, "Grace Hopper");

        let by_description = catalog
            .materials(
                MaterialSearch {
                    query: Some("halting".into()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_description.total, 0);

        let teachers = catalog
            .teachers(TeacherSearch::default(), PageRequest::default())
            .await
            .unwrap();
        let names: Vec<&str> = teachers.items.iter().map(|t| t.full_name.as_str()).collect();
        assert_eq!(names, vec!["Alan Turing", "Grace Hopper"]);
        assert_eq!(teachers.items[1].material_count, 1);

        let cs_teachers = catalog
            .teachers(
                TeacherSearch {
                    subject_id: Some(cs.subject_id),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(cs_teachers.total, 1);
        assert_eq!(cs_teachers.items[0].user_id, alan.user_id);

        let subjects = catalog.subjects().await.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].material_count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_subject_and_statistics() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let student = store.add_user(UserRole::Student, "Ada");
        store.add_user(UserRole::Admin, "Root");
        let admin = AdminContentUseCase::new(Arc::new(store.clone()), Arc::new(store.clone()));

        admin.create_subject("Physics").await.unwrap();
        assert!(matches!(
            admin.create_subject("physics").await,
            Err(ContentError::SubjectExists)
        ));
        assert_eq!(
            admin.create_subject("").await.unwrap_err().kind(),
            ErrorKind::BadRequest
        );

        material_with(&store, &teacher, "Draft", &["a", "b"]).await;
        let material_id = published(&store, &teacher, "Optics").await;
        progress(&store)
            .mark_complete(&student.user_id, &material_id)
            .await
            .unwrap();

        let stats = admin.statistics().await.unwrap();
        assert_eq!(
            stats,
            Statistics {
                students: 1,
                teachers: 1,
                admins: 1,
                blocked_users: 0,
                draft_materials: 1,
                published_materials: 1,
                blocks: 3,
                completions: 1,
                favorites: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_media_upload() {
        let store = MemoryContentStore::default();
        let teacher = store.add_user(UserRole::Teacher, "Grace Hopper");
        let storage = Arc::new(MemoryStorage::default());
        let media = MediaUseCase::new(storage.clone(), Arc::new(ContentConfig::default()));

        let stored = media
            .upload(
                &teacher.user_id,
                MediaKind::Image,
                "image/png",
                Bytes::from_static(PNG),
            )
            .await
            .unwrap();
        assert!(stored.key.starts_with(&format!("images/{}/", teacher.user_id)));
        assert!(stored.key.ends_with(".png"));
        assert_eq!(stored.size, PNG.len());

        let err = media
            .upload(
                &teacher.user_id,
                MediaKind::Video,
                "image/png",
                Bytes::from_static(PNG),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(storage.keys().len(), 1);
    }

    #[tokio::test]
    async fn test_media_upload_storage_failure() {
        let media = MediaUseCase::new(
            Arc::new(MemoryStorage::failing()),
            Arc::new(ContentConfig::default()),
        );

        let err = media
            .upload(
                &UserId::new(),
                MediaKind::Image,
                "image/png",
                Bytes::from_static(PNG),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Storage(StorageError::Timeout)));
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    }
}

// ============================================================================
// Router
// ============================================================================

#[cfg(test)]
mod router_tests {
    use super::*;
    use crate::application::ContentConfig;
    use crate::presentation::router::{access_rules, content_router_generic};
    use auth::gate::{AccessPolicy, AuthGate, authorize};
    use auth::{AccessTokenCodec, AuthConfig};
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        codec: Arc<AccessTokenCodec>,
        store: MemoryContentStore,
        storage: MemoryStorage,
    }

    impl TestApp {
        fn token(&self, identity: &Identity) -> String {
            self.codec.issue(identity, Utc::now()).unwrap().token
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }
    }

    fn app() -> TestApp {
        let store = MemoryContentStore::default();
        let storage = MemoryStorage::default();
        let codec = Arc::new(AccessTokenCodec::new(&AuthConfig::with_random_secret()));
        let gate = Arc::new(AuthGate::new(
            AccessPolicy::new().with_rules("/api/v1", access_rules()),
            codec.clone(),
        ));

        let router = Router::new()
            .nest(
                "/api/v1",
                content_router_generic(
                    store.clone(),
                    Arc::new(storage.clone()),
                    Arc::new(ContentConfig::default()),
                ),
            )
            .layer(axum::middleware::from_fn_with_state(gate, authorize));

        TestApp {
            router,
            codec,
            store,
            storage,
        }
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn multipart_request(uri: &str, token: &str, content_type: &str, file: &[u8]) -> Request<Body> {
        let boundary = "paideia-test-boundary";
        let mut body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_authoring_flow_over_http() {
        let app = app();
        let teacher = app.store.add_user(UserRole::Teacher, "Grace Hopper");
        let other = app.store.add_user(UserRole::Teacher, "Alan Turing");
        let token = app.token(&teacher);

        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/v1/materials",
                Some(&token),
                json!({ "title": "Compilers" }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "draft");
        let id = body["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/materials/{id}/publish"),
                Some(&token),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, block) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/materials/{id}/blocks"),
                Some(&token),
                json!({ "type": "text", "content": "Lexing" }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(block["position"], 0);
        let block_id = block["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/materials/{id}/publish"),
                Some(&token),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "published");

        let (status, _) = app
            .send(json_request(
                "PUT",
                &format!("/api/v1/materials/{id}/blocks/{block_id}"),
                Some(&app.token(&other)),
                json!({ "type": "text", "content": "Parsing" }),
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/materials/{id}/blocks/reorder"),
                Some(&token),
                json!({ "blockIds": [] }),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = app.send(get(&format!("/api/v1/materials/{id}"), Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blocks"][0]["content"], "Lexing");
    }

    #[tokio::test]
    async fn test_published_material_keeps_its_last_block() {
        let app = app();
        let teacher = app.store.add_user(UserRole::Teacher, "Grace Hopper");
        let token = app.token(&teacher);

        let (_, body) = app
            .send(json_request(
                "POST",
                "/api/v1/materials",
                Some(&token),
                json!({ "title": "Compilers" }),
            ))
            .await;
        let id = body["id"].as_str().unwrap().to_string();
        let (_, block) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/materials/{id}/blocks"),
                Some(&token),
                json!({ "type": "text", "content": "Lexing" }),
            ))
            .await;
        let block_id = block["id"].as_str().unwrap().to_string();
        let (status, _) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/materials/{id}/publish"),
                Some(&token),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send(json_request(
                "DELETE",
                &format!("/api/v1/materials/{id}/blocks/{block_id}"),
                Some(&token),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], 409);

        let (_, body) = app.send(get(&format!("/api/v1/materials/{id}"), Some(&token))).await;
        assert_eq!(body["status"], "published");
        assert_eq!(body["blocks"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_requests_get_problem_responses() {
        let app = app();
        let teacher = app.store.add_user(UserRole::Teacher, "Grace Hopper");
        let token = app.token(&teacher);

        let (status, body) = app
            .send(json_request("POST", "/api/v1/materials", Some(&token), json!({ "nope": 1 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["title"], "Bad Request");
        assert!(!body["detail"].as_str().unwrap().contains("missing field"));

        let (_, created) = app
            .send(json_request(
                "POST",
                "/api/v1/materials",
                Some(&token),
                json!({ "title": "Compilers" }),
            ))
            .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/materials/{id}/blocks/reorder"),
                Some(&token),
                json!({ "blockIds": ["not-a-uuid"] }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body["detail"].as_str().unwrap().contains("UUID"));

        let (status, body) = app.send(get("/api/v1/materials/not-a-uuid", Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid path parameter");

        let (status, body) = app.send(get("/api/v1/catalog/materials?page=abc", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid query parameters");
    }

    #[tokio::test]
    async fn test_gate_applies_content_policy() {
        let app = app();
        let student = app.store.add_user(UserRole::Student, "Ada");
        let token = app.token(&student);

        let (status, _) = app
            .send(json_request(
                "POST",
                "/api/v1/materials",
                Some(&token),
                json!({ "title": "Nope" }),
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.send(get("/api/v1/admin/statistics", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.send(get("/api/v1/student/progress", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app.send(get("/api/v1/student/progress", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = app
            .send(get("/api/v1/catalog/materials?sort=title&perPage=5", None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["perPage"], 5);
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_student_progress_over_http() {
        let app = app();
        let teacher = app.store.add_user(UserRole::Teacher, "Grace Hopper");
        let student = app.store.add_user(UserRole::Student, "Ada");
        let teacher_token = app.token(&teacher);
        let token = app.token(&student);

        let (_, body) = app
            .send(json_request(
                "POST",
                "/api/v1/materials",
                Some(&teacher_token),
                json!({ "title": "Sets" }),
            ))
            .await;
        let id = body["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/student/materials/{id}/complete"),
                Some(&token),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        app.send(json_request(
            "POST",
            &format!("/api/v1/materials/{id}/blocks"),
            Some(&teacher_token),
            json!({ "type": "text", "content": "Union" }),
        ))
        .await;
        app.send(json_request(
            "POST",
            &format!("/api/v1/materials/{id}/publish"),
            Some(&teacher_token),
            json!({}),
        ))
        .await;

        let (status, body) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/student/materials/{id}/favorite"),
                Some(&token),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["favorite"], true);

        let (status, body) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/student/materials/{id}/complete"),
                Some(&token),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completed"], true);

        let (_, body) = app.send(get("/api/v1/student/favorites", Some(&token))).await;
        assert_eq!(body[0]["title"], "Sets");

        let (_, body) = app.send(get("/api/v1/student/progress", Some(&token))).await;
        assert_eq!(body[0]["material"]["blockCount"], 1);
        assert_eq!(body[0]["favorite"], true);
    }

    #[tokio::test]
    async fn test_upload_and_embed() {
        let app = app();
        let teacher = app.store.add_user(UserRole::Teacher, "Grace Hopper");
        let token = app.token(&teacher);

        let (status, body) = app
            .send(multipart_request("/api/v1/upload/image", &token, "image/png", PNG))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contentType"], "image/png");
        assert_eq!(body["size"], PNG.len());
        assert_eq!(app.storage.keys(), vec![body["key"].as_str().unwrap().to_string()]);

        let (status, _) = app
            .send(multipart_request("/api/v1/upload/video", &token, "text/plain", b"hello"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/v1/embed/video",
                Some(&token),
                json!({ "url": "https://vimeo.com/76979871" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["provider"], "vimeo");
        assert_eq!(body["embedUrl"], "https://player.vimeo.com/video/76979871");

        let (status, _) = app
            .send(json_request(
                "POST",
                "/api/v1/embed/video",
                Some(&token),
                json!({ "url": "https://example.com/video" }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Errors
// ============================================================================

#[cfg(test)]
mod error_tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use kernel::error::app_error::AppError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ContentError::MaterialNotFound, StatusCode::NOT_FOUND),
            (ContentError::BlockNotFound, StatusCode::NOT_FOUND),
            (ContentError::SubjectNotFound, StatusCode::NOT_FOUND),
            (ContentError::NotOwner, StatusCode::FORBIDDEN),
            (ContentError::AlreadyPublished, StatusCode::CONFLICT),
            (ContentError::EmptyMaterial, StatusCode::CONFLICT),
            (ContentError::InvalidOrder, StatusCode::CONFLICT),
            (ContentError::SubjectExists, StatusCode::CONFLICT),
            (ContentError::ConcurrentModification, StatusCode::CONFLICT),
            (ContentError::Validation(AppError::bad_request("x")), StatusCode::BAD_REQUEST),
            (ContentError::Storage(StorageError::Rejected(500)), StatusCode::INTERNAL_SERVER_ERROR),
            (ContentError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
