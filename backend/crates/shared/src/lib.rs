//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary shared by
//! the `auth` and `content` crates:
//! - Common error types and result aliases
//! - Typed ID wrappers
//! - Request extractors that reject with a problem response
//! - Pagination primitives used by every list endpoint
//! - Search text helpers for `ILIKE` filters
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
#[cfg(feature = "axum")]
pub mod extract;
pub mod id;
pub mod pagination;
pub mod search;
