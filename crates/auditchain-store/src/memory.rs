//! In-memory implementation of `EntryStore`.
//!
//! `InMemoryEntryStore` is the reference persistence collaborator. Entries
//! live in a `BTreeMap` keyed by insertion sequence, with secondary indexes
//! for time ranges, entities, and actors. Everything sits behind one
//! `RwLock`, so reads run concurrently and inserts/deletes are exclusive.
//!
//! Scans hold the read lock while the visitor runs; visitors must not call
//! back into the store.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    ops::Bound,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use auditchain_contracts::{
    entry::AuditEntry,
    error::{AuditError, AuditResult},
    query::{ScanOrder, TimeWindow},
    report::{ChainTail, PruneRecord},
};
use auditchain_core::traits::EntryStore;

/// Placeholder used in race errors when one side is the empty chain.
const GENESIS: &str = "<genesis>";

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct InMemoryState {
    /// Entries keyed by insertion sequence.
    pub(crate) entries: BTreeMap<u64, AuditEntry>,

    /// The sequence the next insert receives.
    pub(crate) next_seq: u64,

    /// Last appended link. Not moved by deletes.
    pub(crate) tail: Option<ChainTail>,

    pub(crate) by_id: HashMap<String, u64>,
    pub(crate) by_time: BTreeSet<(DateTime<Utc>, u64)>,
    pub(crate) by_entity: HashMap<(String, String), BTreeSet<u64>>,
    pub(crate) by_user: HashMap<String, BTreeSet<u64>>,

    pub(crate) prunes: Vec<PruneRecord>,
}

impl InMemoryState {
    fn collect(&self, seqs: Option<&BTreeSet<u64>>) -> Vec<AuditEntry> {
        seqs.into_iter()
            .flatten()
            .filter_map(|seq| self.entries.get(seq).cloned())
            .collect()
    }
}

// ── Public store ──────────────────────────────────────────────────────────────

/// An indexed, in-process entry store with a chain-tail cell and a prune
/// ledger.
///
/// Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryEntryStore {
    pub(crate) state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AuditResult<RwLockReadGuard<'_, InMemoryState>> {
        self.state.read().map_err(|e| AuditError::StoreUnavailable {
            reason: format!("entry store lock poisoned: {}", e),
        })
    }

    fn write(&self) -> AuditResult<RwLockWriteGuard<'_, InMemoryState>> {
        self.state.write().map_err(|e| AuditError::StoreUnavailable {
            reason: format!("entry store lock poisoned: {}", e),
        })
    }
}

// ── EntryStore impl ───────────────────────────────────────────────────────────

impl EntryStore for InMemoryEntryStore {
    fn tail(&self) -> AuditResult<Option<ChainTail>> {
        Ok(self.read()?.tail.clone())
    }

    /// Compare-and-append against the tail cell.
    fn insert(&self, entry: AuditEntry, expected_tail: Option<&str>) -> AuditResult<()> {
        let mut state = self.write()?;

        let current = state.tail.as_ref().map(|t| t.checksum.as_str());
        if current != expected_tail {
            let found = current.unwrap_or(GENESIS).to_string();
            warn!(
                log_id = %entry.log_id,
                expected = expected_tail.unwrap_or(GENESIS),
                found = %found,
                "rejected insert against stale chain tail"
            );
            return Err(AuditError::ChainRaceDetected {
                expected: expected_tail.unwrap_or(GENESIS).to_string(),
                found,
            });
        }
        if state.by_id.contains_key(&entry.id) {
            return Err(AuditError::StoreUnavailable {
                reason: format!("entry id '{}' already stored", entry.id),
            });
        }

        let seq = state.next_seq;
        state.next_seq += 1;

        state.by_id.insert(entry.id.clone(), seq);
        state.by_time.insert((entry.timestamp, seq));
        state
            .by_entity
            .entry((entry.entity_type.clone(), entry.entity_id.clone()))
            .or_default()
            .insert(seq);
        state
            .by_user
            .entry(entry.user_id.clone())
            .or_default()
            .insert(seq);
        state.tail = Some(ChainTail {
            log_id: entry.log_id.clone(),
            checksum: entry.checksum.clone(),
            timestamp: entry.timestamp,
        });
        state.entries.insert(seq, entry);

        Ok(())
    }

    fn scan(
        &self,
        window: TimeWindow,
        order: ScanOrder,
        visit: &mut dyn FnMut(&AuditEntry) -> bool,
    ) -> AuditResult<()> {
        let state = self.read()?;
        if let (Some(s), Some(e)) = (window.start, window.end) {
            if s > e {
                return Ok(());
            }
        }

        let lo = window
            .start
            .map_or(Bound::Unbounded, |s| Bound::Included((s, u64::MIN)));
        let hi = window
            .end
            .map_or(Bound::Unbounded, |e| Bound::Included((e, u64::MAX)));
        let range = state.by_time.range((lo, hi));

        let mut step = |seq: &u64| match state.entries.get(seq) {
            Some(entry) => visit(entry),
            None => true,
        };
        match order {
            ScanOrder::ChainOrder => {
                for (_, seq) in range {
                    if !step(seq) {
                        break;
                    }
                }
            }
            ScanOrder::NewestFirst => {
                for (_, seq) in range.rev() {
                    if !step(seq) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn by_entity(&self, entity_type: &str, entity_id: &str) -> AuditResult<Vec<AuditEntry>> {
        let state = self.read()?;
        let key = (entity_type.to_string(), entity_id.to_string());
        Ok(state.collect(state.by_entity.get(&key)))
    }

    fn by_user(&self, user_id: &str) -> AuditResult<Vec<AuditEntry>> {
        let state = self.read()?;
        Ok(state.collect(state.by_user.get(user_id)))
    }

    fn delete_by_ids(&self, ids: &[String]) -> AuditResult<usize> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let seqs: HashSet<u64> = ids
            .iter()
            .filter_map(|id| state.by_id.get(id).copied())
            .collect();
        if seqs.is_empty() {
            return Ok(0);
        }

        for seq in &seqs {
            if let Some(entry) = state.entries.remove(seq) {
                state.by_id.remove(&entry.id);
                let entity_key = (entry.entity_type, entry.entity_id);
                if let Some(set) = state.by_entity.get_mut(&entity_key) {
                    set.remove(seq);
                    if set.is_empty() {
                        state.by_entity.remove(&entity_key);
                    }
                }
                if let Some(set) = state.by_user.get_mut(&entry.user_id) {
                    set.remove(seq);
                    if set.is_empty() {
                        state.by_user.remove(&entry.user_id);
                    }
                }
            }
        }
        state.by_time.retain(|(_, seq)| !seqs.contains(seq));

        debug!(deleted = seqs.len(), remaining = state.entries.len(), "entries deleted");
        Ok(seqs.len())
    }

    fn record_prunes(&self, records: &[PruneRecord]) -> AuditResult<()> {
        self.write()?.prunes.extend_from_slice(records);
        Ok(())
    }

    fn prune_records(&self) -> AuditResult<Vec<PruneRecord>> {
        Ok(self.read()?.prunes.clone())
    }

    fn len(&self) -> AuditResult<usize> {
        Ok(self.read()?.entries.len())
    }
}
