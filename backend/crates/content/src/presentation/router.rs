//! Content Router

use std::sync::Arc;

use auth::gate::{ADMINS, AccessRule, STAFF};
use auth::upload::MULTIPART_OVERHEAD;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post, put},
};
use platform::storage::{ObjectStorage, Storage};

use crate::application::ContentConfig;
use crate::domain::repository::ContentStore;
use crate::infra::postgres::PgContentRepository;
use crate::presentation::handlers::{self, ContentAppState};

/// Create the Content router with PostgreSQL repository
pub fn content_router(
    repo: PgContentRepository,
    storage: Arc<Storage>,
    config: Arc<ContentConfig>,
) -> Router {
    content_router_generic(repo, storage, config)
}

/// Create a generic Content router for any repository and storage implementation
pub fn content_router_generic<R, S>(repo: R, storage: Arc<S>, config: Arc<ContentConfig>) -> Router
where
    R: ContentStore,
    S: ObjectStorage + Sync + 'static,
{
    let image_limit = config.image_max_bytes + MULTIPART_OVERHEAD;
    let video_limit = config.video_max_bytes + MULTIPART_OVERHEAD;
    let state = ContentAppState {
        repo: Arc::new(repo),
        storage,
        config,
    };

    Router::new()
        // Materials
        .route("/materials", post(handlers::create_material::<R, S>))
        .route("/materials/my", get(handlers::list_my_materials::<R, S>))
        .route(
            "/materials/{id}",
            get(handlers::get_material::<R, S>).put(handlers::update_material::<R, S>),
        )
        .route("/materials/{id}/publish", post(handlers::publish_material::<R, S>))
        .route("/materials/{id}/blocks", post(handlers::add_block::<R, S>))
        .route(
            "/materials/{id}/blocks/reorder",
            post(handlers::reorder_blocks::<R, S>),
        )
        .route(
            "/materials/{id}/blocks/{block_id}",
            put(handlers::update_block::<R, S>).delete(handlers::delete_block::<R, S>),
        )
        // Media
        .route(
            "/upload/image",
            post(handlers::upload_image::<R, S>).layer(DefaultBodyLimit::max(image_limit)),
        )
        .route(
            "/upload/video",
            post(handlers::upload_video::<R, S>).layer(DefaultBodyLimit::max(video_limit)),
        )
        .route("/embed/video", post(handlers::embed_video_link))
        // Catalog
        .route("/catalog/materials", get(handlers::catalog_materials::<R, S>))
        .route("/catalog/subjects", get(handlers::catalog_subjects::<R, S>))
        .route("/catalog/teachers", get(handlers::catalog_teachers::<R, S>))
        // Student
        .route("/student/progress", get(handlers::list_progress::<R, S>))
        .route("/student/favorites", get(handlers::list_favorites::<R, S>))
        .route(
            "/student/materials/{id}/complete",
            post(handlers::complete_material::<R, S>),
        )
        .route(
            "/student/materials/{id}/favorite",
            post(handlers::toggle_favorite::<R, S>),
        )
        // Admin
        .route("/admin/statistics", get(handlers::statistics::<R, S>))
        .route("/admin/subjects", post(handlers::create_subject::<R, S>))
        .with_state(state)
}

/// Access rules for [`content_router`], relative to where it is nested.
/// Material reads and student routes are left to the authenticated default.
pub fn access_rules() -> Vec<AccessRule> {
    vec![
        AccessRule::roles(Method::POST, "/materials", STAFF),
        AccessRule::roles(Method::GET, "/materials/my", STAFF),
        AccessRule::roles(Method::PUT, "/materials/{id}", STAFF),
        AccessRule::roles(Method::POST, "/materials/{id}/publish", STAFF),
        AccessRule::roles(Method::POST, "/materials/{id}/blocks", STAFF),
        AccessRule::roles(Method::POST, "/materials/{id}/blocks/reorder", STAFF),
        AccessRule::roles(Method::PUT, "/materials/{id}/blocks/{block_id}", STAFF),
        AccessRule::roles(Method::DELETE, "/materials/{id}/blocks/{block_id}", STAFF),
        AccessRule::roles(Method::POST, "/upload/image", STAFF),
        AccessRule::roles(Method::POST, "/upload/video", STAFF),
        AccessRule::roles(Method::POST, "/embed/video", STAFF),
        AccessRule::public(Method::GET, "/catalog/materials"),
        AccessRule::public(Method::GET, "/catalog/subjects"),
        AccessRule::public(Method::GET, "/catalog/teachers"),
        AccessRule::roles(Method::GET, "/admin/statistics", ADMINS),
        AccessRule::roles(Method::POST, "/admin/subjects", ADMINS),
    ]
}
