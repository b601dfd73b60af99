//! Content Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Material aggregate, progress records, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Teacher-authored materials made of ordered blocks (text, image,
//!   video, embedded player) with a one-way draft to published lifecycle
//! - Student completion tracking and favorites
//! - Public catalog of published materials, subjects and teachers
//! - Media upload to object storage
//! - Admin statistics and subject management
//!
//! Role checks are declared in [`access_rules`] and enforced by the auth
//! gate; ownership is checked by the authoring use cases.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::ContentConfig;
pub use error::{ContentError, ContentResult};
pub use infra::postgres::PgContentRepository;
pub use presentation::router::{access_rules, content_router, content_router_generic};
