//! # auditchain-store
//!
//! Reference collaborators for the hash-chained audit log.
//!
//! ## Overview
//!
//! - [`InMemoryEntryStore`]: indexed, append-only entry store with a
//!   chain-tail cell, compare-and-append inserts, and a prune ledger
//! - [`Sha256Digester`]: SHA-256 entry checksums
//! - [`ManualClock`]: a settable clock for aged fixtures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auditchain_store::{InMemoryEntryStore, Sha256Digester};
//! use auditchain_core::{AuditChainStore, traits::SystemClock};
//!
//! let chain = AuditChainStore::new(
//!     Arc::new(InMemoryEntryStore::new()),
//!     Arc::new(Sha256Digester),
//!     Arc::new(SystemClock),
//!     AuditSettings::default(),
//! );
//! chain.append(draft)?;
//! assert!(chain.verify_integrity(None, None)?.is_valid);
//! ```

pub mod clock;
pub mod digest;
pub mod memory;

pub use clock::ManualClock;
pub use digest::Sha256Digester;
pub use memory::InMemoryEntryStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
