//! Scenario 1: Tamper Detection
//!
//! A business day of events is recorded, then the backing storage is
//! compromised behind the chain's back:
//!   1. The discounted sales order total is rewritten in place
//!   2. A failed medical-record access is flipped to look harmless
//!   3. The salary change entry is deleted without a prune record
//!
//! Each step is followed by a full verification showing what the chain
//! catches.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::warn;

use auditchain_config::AuditSettings;
use auditchain_contracts::{
    entry::{AuditEntry, EventStatus},
    error::{AuditError, AuditResult},
    query::{ScanOrder, TimeWindow},
    report::{ChainTail, PruneRecord},
};
use auditchain_core::traits::EntryStore;
use auditchain_store::InMemoryEntryStore;

use super::{print_integrity, reference_chain};
use crate::mock_data::{business_day, record_all};

type Edit = Box<dyn Fn(&mut AuditEntry) + Send + Sync>;

// ── Compromised storage ───────────────────────────────────────────────────────

/// Wraps the in-memory store and rewrites entries as they are read back,
/// the way an attacker with database access would see them persisted.
pub struct CompromisedStorage {
    inner: InMemoryEntryStore,
    edits: Mutex<HashMap<String, Edit>>,
}

impl CompromisedStorage {
    pub fn new(inner: InMemoryEntryStore) -> Self {
        Self {
            inner,
            edits: Mutex::new(HashMap::new()),
        }
    }

    /// Rewrite the stored entry `log_id` on every future read.
    pub fn overwrite(&self, log_id: &str, edit: Edit) -> AuditResult<()> {
        self.lock()?.insert(log_id.to_string(), edit);
        warn!(log_id, "stored audit entry overwritten out of band");
        Ok(())
    }

    /// Delete entries directly, bypassing retention and the prune ledger.
    pub fn drop_rows(&self, ids: &[String]) -> AuditResult<usize> {
        self.inner.delete_by_ids(ids)
    }

    fn lock(&self) -> AuditResult<std::sync::MutexGuard<'_, HashMap<String, Edit>>> {
        self.edits.lock().map_err(|e| AuditError::StoreUnavailable {
            reason: format!("edit table lock poisoned: {}", e),
        })
    }

    fn apply(&self, edits: &HashMap<String, Edit>, entry: &AuditEntry) -> AuditEntry {
        let mut entry = entry.clone();
        if let Some(edit) = edits.get(&entry.log_id) {
            edit(&mut entry);
        }
        entry
    }

    fn apply_all(&self, entries: Vec<AuditEntry>) -> AuditResult<Vec<AuditEntry>> {
        let edits = self.lock()?;
        Ok(entries.iter().map(|e| self.apply(&edits, e)).collect())
    }
}

impl EntryStore for CompromisedStorage {
    fn tail(&self) -> AuditResult<Option<ChainTail>> {
        self.inner.tail()
    }

    fn insert(&self, entry: AuditEntry, expected_tail: Option<&str>) -> AuditResult<()> {
        self.inner.insert(entry, expected_tail)
    }

    fn scan(
        &self,
        window: TimeWindow,
        order: ScanOrder,
        visit: &mut dyn FnMut(&AuditEntry) -> bool,
    ) -> AuditResult<()> {
        let edits = self.lock()?;
        self.inner.scan(window, order, &mut |entry| {
            if edits.contains_key(&entry.log_id) {
                visit(&self.apply(&edits, entry))
            } else {
                visit(entry)
            }
        })
    }

    fn by_entity(&self, entity_type: &str, entity_id: &str) -> AuditResult<Vec<AuditEntry>> {
        self.apply_all(self.inner.by_entity(entity_type, entity_id)?)
    }

    fn by_user(&self, user_id: &str) -> AuditResult<Vec<AuditEntry>> {
        self.apply_all(self.inner.by_user(user_id)?)
    }

    fn delete_by_ids(&self, ids: &[String]) -> AuditResult<usize> {
        self.inner.delete_by_ids(ids)
    }

    fn record_prunes(&self, records: &[PruneRecord]) -> AuditResult<()> {
        self.inner.record_prunes(records)
    }

    fn prune_records(&self) -> AuditResult<Vec<PruneRecord>> {
        self.inner.prune_records()
    }

    fn len(&self) -> AuditResult<usize> {
        self.inner.len()
    }
}

// ── Scenario runner ───────────────────────────────────────────────────────────

fn find<'a>(entries: &'a [AuditEntry], entity_id: &str, action_prefix: &str) -> AuditResult<&'a AuditEntry> {
    entries
        .iter()
        .find(|e| e.entity_id == entity_id && e.action.starts_with(action_prefix))
        .ok_or_else(|| AuditError::InvalidFilter {
            reason: format!("mock data has no '{}' entry for {}", action_prefix, entity_id),
        })
}

/// Run Scenario 1: Tamper Detection.
pub fn run_scenario(settings: &AuditSettings) -> AuditResult<()> {
    println!("=== Scenario 1: Tamper Detection ===");
    println!();

    let storage = Arc::new(CompromisedStorage::new(InMemoryEntryStore::new()));
    let (chain, clock) = reference_chain(settings, storage.clone(), Utc::now());

    let recorded = record_all(&chain, &clock, business_day(), Duration::minutes(7))?;
    println!("  Recorded {} business events.", recorded.len());
    print_integrity("Baseline:", &chain.verify_integrity(None, None)?);
    println!();

    // ── 1. Rewrite the discount ───────────────────────────────────────────────

    let discount = find(&recorded, "SO-2026-0815", "Applied")?;
    println!("  [1] Rewriting the order total on {}", discount.log_id);
    storage.overwrite(
        &discount.log_id,
        Box::new(|e: &mut AuditEntry| {
            e.after_data = Some(json!({ "total": "184.00" }));
        }),
    )?;
    print_integrity("After total rewrite:", &chain.verify_integrity(None, None)?);
    println!();

    // ── 2. Whitewash a denied access ──────────────────────────────────────────

    let denied = find(&recorded, "MR-00311", "Attempted")?;
    println!("  [2] Flipping {} from failure to success", denied.log_id);
    storage.overwrite(
        &denied.log_id,
        Box::new(|e: &mut AuditEntry| {
            e.status = EventStatus::Success;
            e.is_security_event = false;
        }),
    )?;
    print_integrity("After status flip:", &chain.verify_integrity(None, None)?);
    println!();

    // ── 3. Delete an entry without a prune record ─────────────────────────────

    let salary = find(&recorded, "EMP-0451", "Changed")?;
    println!("  [3] Deleting {} directly from storage", salary.log_id);
    storage.drop_rows(&[salary.id.clone()])?;
    let report = chain.verify_integrity(None, None)?;
    print_integrity("After direct delete:", &report);
    println!();

    println!(
        "  Detected: {} tampered, {} broken link(s).",
        report.tampered_log_ids.len(),
        report.broken_chain_log_ids.len()
    );
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}
