//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    block::Block,
    material::{Material, MaterialMetadata, MaterialSummary},
    progress::{ProgressItem, ProgressRecord},
    subject::{Subject, SubjectSummary},
};
pub use repository::{
    CatalogRepository, CatalogSort, ContentStore, MaterialRepository, MaterialSearch,
    ProgressRepository, Statistics, StatisticsRepository, SubjectRepository, TeacherSearch,
    TeacherSummary,
};
