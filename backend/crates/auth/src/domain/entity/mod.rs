//! Entity Module

pub mod credential;
pub mod password_reset;
pub mod refresh_token;
pub mod user;
