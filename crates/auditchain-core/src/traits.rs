//! Collaborator traits for the audit chain.
//!
//! These four traits are the boundary between the chain logic and the world:
//!
//! - `EntryStore`  : persistence (insert, indexed lookups, bulk delete)
//! - `Digester`    : the checksum function
//! - `Clock`       : the source of "now"
//! - `ArtifactSink`: where export bytes go
//!
//! `AuditChainStore` wires them together. Only it computes checksums or
//! decides which entries may be deleted.

use chrono::{DateTime, Utc};

use auditchain_contracts::{
    entry::AuditEntry,
    error::AuditResult,
    export::ArtifactRef,
    query::{ScanOrder, TimeWindow},
    report::{ChainTail, PruneRecord},
};

/// Ordered, append-only collection of audit entries.
///
/// Entries are kept in append order, which is also non-decreasing timestamp
/// order. Implementations must not reorder or rewrite stored entries.
pub trait EntryStore: Send + Sync {
    /// The newest link of the chain, or `None` before the first insert.
    ///
    /// Deleting the entry named by the tail must not move the tail.
    fn tail(&self) -> AuditResult<Option<ChainTail>>;

    /// Append `entry` if and only if the current tail checksum equals
    /// `expected_tail` (`None` meaning "the chain is empty").
    ///
    /// Returns `AuditError::ChainRaceDetected` when the tail has moved, and
    /// `AuditError::StoreUnavailable` when the write cannot be accepted.
    fn insert(&self, entry: AuditEntry, expected_tail: Option<&str>) -> AuditResult<()>;

    /// Visit the entries whose timestamp lies in `window`, in `order`.
    ///
    /// The visitor returns `false` to stop the scan early.
    fn scan(
        &self,
        window: TimeWindow,
        order: ScanOrder,
        visit: &mut dyn FnMut(&AuditEntry) -> bool,
    ) -> AuditResult<()>;

    /// All entries for one entity, in append order.
    fn by_entity(&self, entity_type: &str, entity_id: &str) -> AuditResult<Vec<AuditEntry>>;

    /// All entries written by one actor, in append order.
    fn by_user(&self, user_id: &str) -> AuditResult<Vec<AuditEntry>>;

    /// Remove the entries with the given `id`s. Returns how many existed.
    fn delete_by_ids(&self, ids: &[String]) -> AuditResult<usize>;

    /// Append rows to the prune ledger.
    fn record_prunes(&self, records: &[PruneRecord]) -> AuditResult<()>;

    /// Every prune ledger row, oldest first.
    fn prune_records(&self) -> AuditResult<Vec<PruneRecord>>;

    /// Number of stored entries.
    fn len(&self) -> AuditResult<usize>;
}

/// A deterministic, collision-resistant digest rendered as lowercase hex.
pub trait Digester: Send + Sync {
    /// Short algorithm name recorded alongside exports (e.g. `"sha256"`).
    fn algorithm(&self) -> &'static str;

    fn digest(&self, bytes: &[u8]) -> String;
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Storage for generated export artifacts.
pub trait ArtifactSink: Send + Sync {
    /// Store `bytes` and return a reference that resolves until `expires_at`.
    fn store(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> AuditResult<ArtifactRef>;

    /// Retrieve a stored artifact.
    ///
    /// Returns `AuditError::ArtifactUnavailable` for unknown references and
    /// for artifacts whose expiry is at or before `now`.
    fn fetch(&self, uri: &str, now: DateTime<Utc>) -> AuditResult<Vec<u8>>;
}
