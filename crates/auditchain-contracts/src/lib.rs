//! # auditchain-contracts
//!
//! Shared types for the auditchain tamper-evident audit log.
//!
//! Every crate in the workspace imports from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod entry;
pub mod error;
pub mod export;
pub mod query;
pub mod report;
