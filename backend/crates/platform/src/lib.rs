//! Platform
//!
//! Infrastructure primitives shared by the domain crates:
//! - `crypto` - random tokens and token hashing
//! - `media` - upload type and size checks
//! - `password` - Argon2id password hashing with policy checks
//! - `storage` - object storage (HTTP backend with local fallback)
//! - `task` - run a unit of work detached from the request future

pub mod crypto;
pub mod media;
pub mod password;
pub mod storage;
pub mod task;
