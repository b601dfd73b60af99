//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use kernel::id::{BlockId, MaterialId, SubjectId, UserId};
use kernel::pagination::PageRequest;
use kernel::search::contains_pattern;
use platform::task::run_to_completion;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::{
    block::Block,
    material::{Material, MaterialSummary},
    progress::{ProgressItem, ProgressRecord},
    subject::{Subject, SubjectSummary},
};
use crate::domain::repository::{
    CatalogRepository, CatalogSort, MaterialRepository, MaterialSearch, ProgressRepository,
    Statistics, StatisticsRepository, SubjectRepository, TeacherSearch, TeacherSummary,
};
use crate::domain::value_object::{
    block_payload::BlockPayload,
    material_status::MaterialStatus,
    metadata::{Description, SubjectName, Title},
};
use crate::error::{ContentError, ContentResult};

const MATERIAL_COLUMNS: &str = r#"
    material_id,
    owner_id,
    title,
    description,
    subject_id,
    status,
    version,
    created_at,
    updated_at,
    published_at
"#;

const BLOCK_COLUMNS: &str = r#"
    block_id,
    position,
    payload,
    created_at,
    updated_at
"#;

/// Listing columns; `m` = materials, `u` = author, `s` = subject
const SUMMARY_SELECT: &str = r#"
    SELECT
        m.material_id,
        m.owner_id,
        u.full_name AS author_name,
        m.title,
        m.description,
        m.subject_id,
        s.name AS subject_name,
        m.status,
        (SELECT COUNT(*) FROM material_blocks b WHERE b.material_id = m.material_id) AS block_count,
        m.created_at,
        m.updated_at,
        m.published_at
    FROM materials m
    JOIN users u ON u.user_id = m.owner_id
    LEFT JOIN subjects s ON s.subject_id = m.subject_id
"#;

/// PostgreSQL-backed content repository
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Material Repository Implementation
// ============================================================================

/// One unit of work: version-checked material update, removal of dropped
/// blocks and upsert of the remaining ones. Position uniqueness is
/// deferred to commit, so swapped positions do not collide midway.
async fn save_material_in_transaction(pool: PgPool, material: Material) -> ContentResult<()> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE materials
        SET title = $3,
            description = $4,
            subject_id = $5,
            status = $6,
            updated_at = $7,
            published_at = $8,
            version = version + 1
        WHERE material_id = $1 AND version = $2
        "#,
    )
    .bind(material.material_id.into_uuid())
    .bind(material.version)
    .bind(material.title.as_str())
    .bind(material.description.as_deref())
    .bind(material.subject_id.map(SubjectId::into_uuid))
    .bind(material.status.code())
    .bind(material.updated_at)
    .bind(material.published_at)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(ContentError::ConcurrentModification);
    }

    let block_ids: Vec<Uuid> = material
        .blocks()
        .iter()
        .map(|b| b.block_id.into_uuid())
        .collect();

    sqlx::query("DELETE FROM material_blocks WHERE material_id = $1 AND NOT (block_id = ANY($2))")
        .bind(material.material_id.into_uuid())
        .bind(&block_ids)
        .execute(&mut *tx)
        .await?;

    for block in material.blocks() {
        sqlx::query(
            r#"
            INSERT INTO material_blocks (
                block_id,
                material_id,
                position,
                block_type,
                payload,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (block_id) DO UPDATE
            SET position = EXCLUDED.position,
                block_type = EXCLUDED.block_type,
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(block.block_id.into_uuid())
        .bind(material.material_id.into_uuid())
        .bind(block.position)
        .bind(block.payload.kind())
        .bind(Json(&block.payload))
        .bind(block.created_at)
        .bind(block.updated_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

impl MaterialRepository for PgContentRepository {
    async fn create_material(&self, material: &Material) -> ContentResult<()> {
        sqlx::query(
            r#"
            INSERT INTO materials (
                material_id,
                owner_id,
                title,
                description,
                subject_id,
                status,
                version,
                created_at,
                updated_at,
                published_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(material.material_id.into_uuid())
        .bind(material.owner_id.into_uuid())
        .bind(material.title.as_str())
        .bind(material.description.as_deref())
        .bind(material.subject_id.map(SubjectId::into_uuid))
        .bind(material.status.code())
        .bind(material.version)
        .bind(material.created_at)
        .bind(material.updated_at)
        .bind(material.published_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_material(&self, material_id: &MaterialId) -> ContentResult<Option<Material>> {
        let Some(row) = sqlx::query_as::<_, MaterialRow>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE material_id = $1"
        ))
        .bind(material_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let blocks = sqlx::query_as::<_, BlockRow>(&format!(
            "SELECT {BLOCK_COLUMNS} FROM material_blocks WHERE material_id = $1 ORDER BY position"
        ))
        .bind(material_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        row.into_material(blocks.into_iter().map(BlockRow::into_block).collect())
            .map(Some)
    }

    async fn find_material_status(
        &self,
        material_id: &MaterialId,
    ) -> ContentResult<Option<MaterialStatus>> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM materials WHERE material_id = $1")
                .bind(material_id.into_uuid())
                .fetch_optional(&self.pool)
                .await?;

        status.map(|s| parse_status(&s)).transpose()
    }

    async fn list_materials_by_owner(
        &self,
        owner_id: &UserId,
    ) -> ContentResult<Vec<MaterialSummary>> {
        let rows = sqlx::query_as::<_, MaterialSummaryRow>(&format!(
            "{SUMMARY_SELECT} WHERE m.owner_id = $1 ORDER BY m.created_at DESC, m.material_id"
        ))
        .bind(owner_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(MaterialSummaryRow::into_summary)
            .collect()
    }

    async fn save_material(&self, material: &Material) -> ContentResult<()> {
        run_to_completion(save_material_in_transaction(
            self.pool.clone(),
            material.clone(),
        ))
        .await?
    }
}

// ============================================================================
// Subject Repository Implementation
// ============================================================================

impl SubjectRepository for PgContentRepository {
    async fn create_subject(&self, subject: &Subject) -> ContentResult<()> {
        sqlx::query("INSERT INTO subjects (subject_id, name, created_at) VALUES ($1, $2, $3)")
            .bind(subject.subject_id.into_uuid())
            .bind(subject.name.as_str())
            .bind(subject.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ContentError::SubjectExists
                } else {
                    ContentError::Database(e)
                }
            })?;

        Ok(())
    }

    async fn list_subjects(&self) -> ContentResult<Vec<SubjectSummary>> {
        let rows = sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT
                s.subject_id,
                s.name,
                s.created_at,
                (
                    SELECT COUNT(*)
                    FROM materials m
                    WHERE m.subject_id = s.subject_id AND m.status = 'published'
                ) AS material_count
            FROM subjects s
            ORDER BY LOWER(s.name)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SubjectRow::into_summary).collect())
    }

    async fn subject_exists(&self, subject_id: &SubjectId) -> ContentResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM subjects WHERE subject_id = $1)")
                .bind(subject_id.into_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

// ============================================================================
// Progress Repository Implementation
// ============================================================================

impl ProgressRepository for PgContentRepository {
    async fn mark_complete(
        &self,
        user_id: &UserId,
        material_id: &MaterialId,
    ) -> ContentResult<ProgressRecord> {
        // The WHERE clause turns a repeat into a no-op
        sqlx::query(
            r#"
            INSERT INTO material_progress (
                user_id,
                material_id,
                completed,
                completed_at,
                favorite,
                created_at,
                updated_at
            ) VALUES ($1, $2, TRUE, $3, FALSE, $3, $3)
            ON CONFLICT (user_id, material_id) DO UPDATE
            SET completed = TRUE,
                completed_at = EXCLUDED.completed_at,
                updated_at = EXCLUDED.updated_at
            WHERE material_progress.completed = FALSE
            "#,
        )
        .bind(user_id.into_uuid())
        .bind(material_id.into_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT user_id, material_id, completed, completed_at, favorite, created_at, updated_at
            FROM material_progress
            WHERE user_id = $1 AND material_id = $2
            "#,
        )
        .bind(user_id.into_uuid())
        .bind(material_id.into_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_record())
    }

    async fn toggle_favorite(
        &self,
        user_id: &UserId,
        material_id: &MaterialId,
    ) -> ContentResult<bool> {
        let favorite: bool = sqlx::query_scalar(
            r#"
            INSERT INTO material_progress (
                user_id,
                material_id,
                completed,
                completed_at,
                favorite,
                created_at,
                updated_at
            ) VALUES ($1, $2, FALSE, NULL, TRUE, $3, $3)
            ON CONFLICT (user_id, material_id) DO UPDATE
            SET favorite = NOT material_progress.favorite,
                updated_at = EXCLUDED.updated_at
            RETURNING favorite
            "#,
        )
        .bind(user_id.into_uuid())
        .bind(material_id.into_uuid())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(favorite)
    }

    async fn list_progress(&self, user_id: &UserId) -> ContentResult<Vec<ProgressItem>> {
        let rows = sqlx::query_as::<_, ProgressItemRow>(&format!(
            r#"
            WITH summary AS ({SUMMARY_SELECT})
            SELECT
                summary.*,
                p.user_id AS progress_user_id,
                p.completed AS progress_completed,
                p.completed_at AS progress_completed_at,
                p.favorite AS progress_favorite,
                p.created_at AS progress_created_at,
                p.updated_at AS progress_updated_at
            FROM material_progress p
            JOIN summary ON summary.material_id = p.material_id
            WHERE p.user_id = $1 AND summary.status = 'published'
            ORDER BY p.updated_at DESC, p.material_id
            "#
        ))
        .bind(user_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProgressItemRow::into_item).collect()
    }

    async fn list_favorites(&self, user_id: &UserId) -> ContentResult<Vec<MaterialSummary>> {
        let rows = sqlx::query_as::<_, MaterialSummaryRow>(&format!(
            r#"
            {SUMMARY_SELECT}
            JOIN material_progress p ON p.material_id = m.material_id
            WHERE p.user_id = $1 AND p.favorite AND m.status = 'published'
            ORDER BY p.updated_at DESC, m.material_id
            "#
        ))
        .bind(user_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(MaterialSummaryRow::into_summary)
            .collect()
    }
}

// ============================================================================
// Catalog Repository Implementation
// ============================================================================

/// Expects `m` and `u` to be in scope.
fn push_material_filter(builder: &mut QueryBuilder<'_, Postgres>, search: &MaterialSearch) {
    builder.push(" WHERE m.status = 'published' AND u.blocked = FALSE");
    if let Some(subject_id) = search.subject_id {
        builder
            .push(" AND m.subject_id = ")
            .push_bind(subject_id.into_uuid());
    }
    if let Some(teacher_id) = search.teacher_id {
        builder
            .push(" AND m.owner_id = ")
            .push_bind(teacher_id.into_uuid());
    }
    if let Some(query) = &search.query {
        builder
            .push(" AND m.title ILIKE ")
            .push_bind(contains_pattern(query));
    }
}

fn push_teacher_filter(builder: &mut QueryBuilder<'_, Postgres>, search: &TeacherSearch) {
    builder.push(" WHERE u.role = 'teacher' AND u.blocked = FALSE");
    if let Some(query) = &search.query {
        builder
            .push(" AND u.full_name ILIKE ")
            .push_bind(contains_pattern(query));
    }
    if let Some(subject_id) = search.subject_id {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM materials m \
                 WHERE m.owner_id = u.user_id AND m.status = 'published' AND m.subject_id = ",
            )
            .push_bind(subject_id.into_uuid())
            .push(")");
    }
}

fn catalog_order(sort: CatalogSort) -> &'static str {
    match sort {
        CatalogSort::Newest => " ORDER BY m.published_at DESC, m.material_id",
        CatalogSort::Oldest => " ORDER BY m.published_at ASC, m.material_id",
        CatalogSort::Title => " ORDER BY LOWER(m.title) ASC, m.material_id",
    }
}

impl CatalogRepository for PgContentRepository {
    async fn search_materials(
        &self,
        search: &MaterialSearch,
        page: PageRequest,
    ) -> ContentResult<(Vec<MaterialSummary>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM materials m JOIN users u ON u.user_id = m.owner_id",
        );
        push_material_filter(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_material_filter(&mut select, search);
        select
            .push(catalog_order(search.sort))
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<MaterialSummaryRow>()
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(MaterialSummaryRow::into_summary)
            .collect::<ContentResult<Vec<_>>>()?;

        Ok((items, u64::try_from(total).unwrap_or(0)))
    }

    async fn search_teachers(
        &self,
        search: &TeacherSearch,
        page: PageRequest,
    ) -> ContentResult<(Vec<TeacherSummary>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        push_teacher_filter(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                u.user_id,
                u.full_name,
                u.bio,
                u.avatar_url,
                (
                    SELECT COUNT(*)
                    FROM materials pm
                    WHERE pm.owner_id = u.user_id AND pm.status = 'published'
                ) AS material_count
            FROM users u
            "#,
        );
        push_teacher_filter(&mut select, search);
        select
            .push(" ORDER BY LOWER(u.full_name), u.user_id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<TeacherRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(TeacherRow::into_summary).collect(),
            u64::try_from(total).unwrap_or(0),
        ))
    }
}

// ============================================================================
// Statistics Repository Implementation
// ============================================================================

impl StatisticsRepository for PgContentRepository {
    async fn statistics(&self) -> ContentResult<Statistics> {
        let row = sqlx::query_as::<_, StatisticsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE role = 'student') AS students,
                (SELECT COUNT(*) FROM users WHERE role = 'teacher') AS teachers,
                (SELECT COUNT(*) FROM users WHERE role = 'admin') AS admins,
                (SELECT COUNT(*) FROM users WHERE blocked) AS blocked_users,
                (SELECT COUNT(*) FROM materials WHERE status = 'draft') AS draft_materials,
                (SELECT COUNT(*) FROM materials WHERE status = 'published') AS published_materials,
                (SELECT COUNT(*) FROM material_blocks) AS blocks,
                (SELECT COUNT(*) FROM material_progress WHERE completed) AS completions,
                (SELECT COUNT(*) FROM material_progress WHERE favorite) AS favorites
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_statistics())
    }
}

// ============================================================================
// Row Types
// ============================================================================

fn parse_status(code: &str) -> ContentResult<MaterialStatus> {
    MaterialStatus::from_code(code)
        .ok_or_else(|| ContentError::Internal(format!("Invalid material status: {code}")))
}

#[derive(sqlx::FromRow)]
struct MaterialRow {
    material_id: Uuid,
    owner_id: Uuid,
    title: String,
    description: Option<String>,
    subject_id: Option<Uuid>,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl MaterialRow {
    fn into_material(self, blocks: Vec<Block>) -> ContentResult<Material> {
        Ok(Material::restore(
            MaterialId::from_uuid(self.material_id),
            UserId::from_uuid(self.owner_id),
            Title::from_db(self.title),
            Description::from_db(self.description),
            self.subject_id.map(SubjectId::from_uuid),
            parse_status(&self.status)?,
            self.version,
            self.created_at,
            self.updated_at,
            self.published_at,
            blocks,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct BlockRow {
    block_id: Uuid,
    position: i32,
    payload: Json<BlockPayload>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BlockRow {
    fn into_block(self) -> Block {
        Block {
            block_id: BlockId::from_uuid(self.block_id),
            position: self.position,
            payload: self.payload.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MaterialSummaryRow {
    material_id: Uuid,
    owner_id: Uuid,
    author_name: String,
    title: String,
    description: Option<String>,
    subject_id: Option<Uuid>,
    subject_name: Option<String>,
    status: String,
    block_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl MaterialSummaryRow {
    fn into_summary(self) -> ContentResult<MaterialSummary> {
        Ok(MaterialSummary {
            material_id: MaterialId::from_uuid(self.material_id),
            owner_id: UserId::from_uuid(self.owner_id),
            author_name: self.author_name,
            title: self.title,
            description: self.description,
            subject_id: self.subject_id.map(SubjectId::from_uuid),
            subject_name: self.subject_name,
            status: parse_status(&self.status)?,
            block_count: self.block_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            published_at: self.published_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    user_id: Uuid,
    material_id: Uuid,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    favorite: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProgressRow {
    fn into_record(self) -> ProgressRecord {
        ProgressRecord {
            user_id: UserId::from_uuid(self.user_id),
            material_id: MaterialId::from_uuid(self.material_id),
            completed: self.completed,
            completed_at: self.completed_at,
            favorite: self.favorite,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProgressItemRow {
    #[sqlx(flatten)]
    summary: MaterialSummaryRow,
    progress_user_id: Uuid,
    progress_completed: bool,
    progress_completed_at: Option<DateTime<Utc>>,
    progress_favorite: bool,
    progress_created_at: DateTime<Utc>,
    progress_updated_at: DateTime<Utc>,
}

impl ProgressItemRow {
    fn into_item(self) -> ContentResult<ProgressItem> {
        let record = ProgressRecord {
            user_id: UserId::from_uuid(self.progress_user_id),
            material_id: MaterialId::from_uuid(self.summary.material_id),
            completed: self.progress_completed,
            completed_at: self.progress_completed_at,
            favorite: self.progress_favorite,
            created_at: self.progress_created_at,
            updated_at: self.progress_updated_at,
        };
        Ok(ProgressItem {
            record,
            material: self.summary.into_summary()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubjectRow {
    subject_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    material_count: i64,
}

impl SubjectRow {
    fn into_summary(self) -> SubjectSummary {
        SubjectSummary {
            subject: Subject {
                subject_id: SubjectId::from_uuid(self.subject_id),
                name: SubjectName::from_db(self.name),
                created_at: self.created_at,
            },
            material_count: self.material_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TeacherRow {
    user_id: Uuid,
    full_name: String,
    bio: Option<String>,
    avatar_url: Option<String>,
    material_count: i64,
}

impl TeacherRow {
    fn into_summary(self) -> TeacherSummary {
        TeacherSummary {
            user_id: UserId::from_uuid(self.user_id),
            full_name: self.full_name,
            bio: self.bio,
            avatar_url: self.avatar_url,
            material_count: self.material_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatisticsRow {
    students: i64,
    teachers: i64,
    admins: i64,
    blocked_users: i64,
    draft_materials: i64,
    published_materials: i64,
    blocks: i64,
    completions: i64,
    favorites: i64,
}

impl StatisticsRow {
    fn into_statistics(self) -> Statistics {
        Statistics {
            students: self.students,
            teachers: self.teachers,
            admins: self.admins,
            blocked_users: self.blocked_users,
            draft_materials: self.draft_materials,
            published_materials: self.published_materials,
            blocks: self.blocks,
            completions: self.completions,
            favorites: self.favorites,
        }
    }
}
