//! Value Objects

pub mod block_payload;
pub mod embed;
pub mod material_status;
pub mod metadata;
