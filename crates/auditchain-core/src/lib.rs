//! # auditchain-core
//!
//! The tamper-evident audit log runtime.
//!
//! This crate provides:
//! - The collaborator traits (`EntryStore`, `Digester`, `Clock`, `ArtifactSink`)
//! - Canonical entry encoding and checksum computation
//! - The `AuditChainStore` that appends, verifies, searches, aggregates, and
//!   prunes the chain
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auditchain_core::{AuditChainStore, traits::SystemClock};
//! use auditchain_store::{InMemoryEntryStore, Sha256Digester};
//!
//! let chain = AuditChainStore::new(
//!     Arc::new(InMemoryEntryStore::new()),
//!     Arc::new(Sha256Digester),
//!     Arc::new(SystemClock),
//!     AuditSettings::default(),
//! );
//! let entry = chain.append(draft)?;
//! assert!(chain.verify_integrity(None, None)?.is_valid);
//! ```

pub mod canonical;
pub mod chain_store;
pub mod query;
pub mod stats;
pub mod traits;

pub use chain_store::AuditChainStore;
