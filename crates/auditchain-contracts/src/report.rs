//! Verification reports, prune ledger records, and aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The newest link of the chain as tracked by the store.
///
/// The tail survives deletion of the entry it names, so the next append
/// still links to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTail {
    pub log_id: String,
    pub checksum: String,
    pub timestamp: DateTime<Utc>,
}

/// Ledger row written for every entry removed by retention cleanup.
///
/// Lets verification tell a deliberate prune apart from a malicious delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneRecord {
    pub pruned_log_id: String,
    pub pruned_checksum: String,
    pub pruned_previous_checksum: Option<String>,
    pub pruned_at: DateTime<Utc>,
}

/// Result of `AuditChainStore::verify_integrity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// True iff no entry was tampered and no link was broken.
    pub is_valid: bool,
    pub total_logs: usize,
    /// Entries that passed both the checksum and the link check.
    pub verified_logs: usize,
    /// `log_id`s whose stored checksum differs from the recomputed one.
    pub tampered_log_ids: Vec<String>,
    /// `log_id`s whose `previous_checksum` does not reach the preceding
    /// entry, even through recorded prunes.
    pub broken_chain_log_ids: Vec<String>,
    /// `log_id`s whose link crosses entries removed by retention cleanup.
    pub pruned_gap_log_ids: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub verified_at: DateTime<Utc>,
}

/// A key and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyCount {
    pub key: String,
    pub count: usize,
}

/// Aggregate counts over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_entries: usize,
    pub security_events: usize,
    pub critical_operations: usize,
    pub compliance_relevant: usize,
    pub failed_operations: usize,
    pub distinct_users: usize,
    pub top_users: Vec<FrequencyCount>,
    pub top_entity_types: Vec<FrequencyCount>,
    pub top_event_types: Vec<FrequencyCount>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// True when the working-set cap stopped aggregation early.
    pub truncated: bool,
}
