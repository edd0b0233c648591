//! Core policy logic for Rimba.
//!
//! This crate contains pure policy logic with ZERO web or database dependencies.
//! Every authorization decision takes an explicit [`access::AccessContext`].
//!
//! # Modules
//!
//! - `access` - Roles, permissions, god mode and the permission oracle
//! - `spending` - Spending limits and calendar-period aggregation
//! - `workflow` - Approval workflow matching and approval requests
//! - `payee` - Bank account whitelist and the cashless payee check
//! - `policy` - Combined transaction policy outcome
//! - `console` - Read-only guard for the god-mode SQL console
//! - `audit` - Audit trail types and destructive-action confirmation

pub mod access;
pub mod audit;
pub mod console;
pub mod payee;
pub mod policy;
pub mod spending;
pub mod workflow;
