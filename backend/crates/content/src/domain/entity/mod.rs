//! Entities

pub mod block;
pub mod material;
pub mod progress;
pub mod subject;
