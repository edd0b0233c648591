//! Role-based access control for Rimba.
//!
//! Every authorization decision is a function of an explicit
//! [`AccessContext`] (user, role, god-mode grant). There is no ambient
//! session.
//!
//! # Modules
//!
//! - `role` - The closed set of roles
//! - `permission` - The closed set of permission keys
//! - `matrix` - Role → permission table and pure predicates
//! - `context` - Profiles and access contexts
//! - `oracle` - Cached, fail-closed resolution of callers
//! - `error` - Access-specific error types

pub mod context;
pub mod error;
pub mod matrix;
pub mod oracle;
pub mod permission;
pub mod role;

#[cfg(test)]
mod matrix_props;

pub use context::{AccessContext, Profile};
pub use error::AccessError;
pub use matrix::{EnhancedPermissions, GOD_MODE_KEY, PermissionMatrix};
pub use oracle::{PermissionOracle, ProfileDirectory, StaticDirectory};
pub use permission::Permission;
pub use role::Role;
