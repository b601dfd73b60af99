//! Application Layer
//!
//! Use cases and application configuration.

pub mod admin;
pub mod catalog;
pub mod config;
pub mod material_authoring;
pub mod material_query;
pub mod media;
pub mod progress;

// Re-exports
pub use admin::AdminContentUseCase;
pub use catalog::CatalogUseCase;
pub use config::ContentConfig;
pub use material_authoring::{MaterialAuthoringUseCase, MaterialInput};
pub use material_query::MaterialQueryUseCase;
pub use media::{MediaUseCase, embed_video};
pub use progress::ProgressUseCase;
