//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, access policy and the authorization gate.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod router;
pub mod upload;

pub use handlers::AuthAppState;
pub use middleware::{AuthGate, CurrentUser, authorize};
pub use policy::{Access, AccessPolicy, AccessRule};
pub use router::{access_rules, auth_router, auth_router_generic};
