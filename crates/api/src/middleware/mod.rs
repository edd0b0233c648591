//! Request middleware and extractors.

pub mod auth;

pub use auth::{AuthUser, Caller, auth_middleware};
