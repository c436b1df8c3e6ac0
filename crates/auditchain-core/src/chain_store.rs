//! The audit chain store: the single writer and reader of the hash chain.
//!
//! `AuditChainStore` enforces the chain model on top of an `EntryStore`:
//!
//!   lock → read tail → build entry → checksum → conditional insert → unlock
//!
//! The writer lock serializes appends and retention cleanup in-process; the
//! store's conditional insert catches writers outside this process. Either
//! way two entries can never claim the same predecessor.

use std::{collections::HashMap, sync::Arc, sync::Mutex, sync::MutexGuard};

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use tracing::{debug, info, warn};
use uuid::Uuid;

use auditchain_config::AuditSettings;
use auditchain_contracts::{
    entry::{AuditEntry, AuditEntryDraft},
    error::{AuditError, AuditResult},
    query::{ScanOrder, SearchFilter, SearchPage},
    report::{AuditStatistics, ChainTail, IntegrityReport, PruneRecord},
};

use crate::{
    canonical::compute_checksum,
    query::{validate_window, EntryMatcher},
    stats::StatisticsAccumulator,
    traits::{Clock, Digester, EntryStore},
};

/// How a stored `previous_checksum` relates to the entry loaded before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Intact,
    /// The gap is fully explained by the prune ledger.
    PrunedGap,
    Broken,
}

/// Hash-chained audit log over pluggable persistence, digest, and clock.
///
/// Cheap to share: wrap in an `Arc` and call from any thread.
pub struct AuditChainStore {
    store: Arc<dyn EntryStore>,
    digester: Arc<dyn Digester>,
    clock: Arc<dyn Clock>,
    settings: AuditSettings,
    writer: Mutex<()>,
}

impl AuditChainStore {
    pub fn new(
        store: Arc<dyn EntryStore>,
        digester: Arc<dyn Digester>,
        clock: Arc<dyn Clock>,
        settings: AuditSettings,
    ) -> Self {
        Self {
            store,
            digester,
            clock,
            settings,
            writer: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    pub fn digester(&self) -> &dyn Digester {
        self.digester.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The newest link of the chain, as tracked by the store.
    pub fn chain_tail(&self) -> AuditResult<Option<ChainTail>> {
        self.store.tail()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> AuditResult<usize> {
        self.store.len()
    }

    pub fn is_empty(&self) -> AuditResult<bool> {
        Ok(self.store.len()? == 0)
    }

    /// Every retention prune recorded so far, oldest first.
    pub fn prune_ledger(&self) -> AuditResult<Vec<PruneRecord>> {
        self.store.prune_records()
    }

    fn lock_writer(&self) -> AuditResult<MutexGuard<'_, ()>> {
        self.writer.lock().map_err(|e| AuditError::StoreUnavailable {
            reason: format!("audit writer lock poisoned: {}", e),
        })
    }

    // ── Append ────────────────────────────────────────────────────────────────

    /// Append one entry to the chain and return it as persisted.
    ///
    /// The new entry links to the current chain tail. Its `timestamp` is the
    /// clock's `now`, raised to the tail's timestamp if the clock is behind,
    /// so timestamp order never contradicts chain order.
    ///
    /// # Errors
    ///
    /// - `StoreUnavailable` if the store rejects the write. Not retried.
    /// - `ChainRaceDetected` if another writer moved the tail between the
    ///   read and the conditional insert. Retry the whole append, or use
    ///   [`AuditChainStore::append_with_retry`].
    pub fn append(&self, draft: AuditEntryDraft) -> AuditResult<AuditEntry> {
        let _guard = self.lock_writer()?;

        let tail = self.store.tail()?;
        let now = self.clock.now();
        let timestamp = match &tail {
            Some(t) if t.timestamp > now => t.timestamp,
            _ => now,
        };
        let previous_checksum = tail.as_ref().map(|t| t.checksum.clone());

        let mut entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            log_id: generate_log_id(timestamp),
            timestamp,
            created_at: now,
            event_type: draft.event_type,
            entity_type: draft.entity_type,
            entity_id: draft.entity_id,
            user_id: draft.user_id,
            username: draft.username,
            user_role: draft.user_role,
            ip_address: draft.ip_address,
            user_agent: draft.user_agent,
            session_id: draft.session_id,
            action: draft.action,
            before_data: draft.before_data,
            after_data: draft.after_data,
            changes: draft.changes,
            is_security_event: draft.is_security_event,
            is_critical_operation: draft.is_critical_operation,
            compliance_relevant: draft.compliance_relevant,
            status: draft.status,
            checksum: String::new(),
            previous_checksum,
            retention_period: draft
                .retention_period
                .unwrap_or(self.settings.retention.default_entry_retention_days),
        };
        entry.checksum = compute_checksum(self.digester.as_ref(), &entry)?;

        let expected_tail = tail.as_ref().map(|t| t.checksum.as_str());
        self.store.insert(entry.clone(), expected_tail)?;

        info!(
            log_id = %entry.log_id,
            event_type = %entry.event_type,
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            checksum = %entry.checksum,
            "audit entry appended"
        );

        Ok(entry)
    }

    /// [`AuditChainStore::append`], retried on `ChainRaceDetected` up to
    /// `append.max_attempts` times. Every other error is returned at once.
    pub fn append_with_retry(&self, draft: AuditEntryDraft) -> AuditResult<AuditEntry> {
        let attempts = self.settings.append.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.append(draft.clone()) {
                Err(AuditError::ChainRaceDetected { expected, found }) if attempt < attempts => {
                    warn!(
                        attempt,
                        expected = %expected,
                        found = %found,
                        "chain tail moved during append, retrying"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    // ── Verification ──────────────────────────────────────────────────────────

    /// Recompute every checksum and check every link inside the window.
    ///
    /// An entry whose stored checksum differs from the recomputed one is
    /// tampered. An entry whose `previous_checksum` is not the stored
    /// checksum of the entry loaded before it has a broken link, unless the
    /// prune ledger accounts for every missing entry in between.
    ///
    /// With an open start the first entry must begin the chain (directly or
    /// through recorded prunes). With a start bound the first entry's link
    /// points outside the window and is not checked.
    ///
    /// Tampering is a result, not an error: only store failures are `Err`.
    pub fn verify_integrity(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AuditResult<IntegrityReport> {
        let window = validate_window(start, end)?;

        let pruned: HashMap<String, Option<String>> = self
            .store
            .prune_records()?
            .into_iter()
            .map(|r| (r.pruned_checksum, r.pruned_previous_checksum))
            .collect();

        let mut total = 0usize;
        let mut verified = 0usize;
        let mut tampered = Vec::new();
        let mut broken = Vec::new();
        let mut gaps = Vec::new();
        let mut prev_checksum: Option<String> = None;
        let mut scan_error: Option<AuditError> = None;

        self.store.scan(window, ScanOrder::ChainOrder, &mut |entry| {
            let recomputed = match compute_checksum(self.digester.as_ref(), entry) {
                Ok(c) => c,
                Err(e) => {
                    scan_error = Some(e);
                    return false;
                }
            };

            let link = if total == 0 {
                if window.start.is_none() {
                    resolve_link(entry.previous_checksum.as_deref(), None, &pruned)
                } else {
                    Link::Intact
                }
            } else {
                resolve_link(entry.previous_checksum.as_deref(), prev_checksum.as_deref(), &pruned)
            };
            total += 1;

            let is_tampered = recomputed != entry.checksum;
            if is_tampered {
                warn!(log_id = %entry.log_id, "audit entry checksum mismatch");
                tampered.push(entry.log_id.clone());
            }
            match link {
                Link::Intact => {}
                Link::PrunedGap => gaps.push(entry.log_id.clone()),
                Link::Broken => {
                    warn!(
                        log_id = %entry.log_id,
                        previous_checksum = ?entry.previous_checksum,
                        "audit chain link broken"
                    );
                    broken.push(entry.log_id.clone());
                }
            }
            if !is_tampered && link != Link::Broken {
                verified += 1;
            }

            prev_checksum = Some(entry.checksum.clone());
            true
        })?;

        if let Some(e) = scan_error {
            return Err(e);
        }

        let is_valid = tampered.is_empty() && broken.is_empty();
        info!(
            is_valid,
            total_logs = total,
            tampered = tampered.len(),
            broken = broken.len(),
            pruned_gaps = gaps.len(),
            "audit chain verified"
        );

        Ok(IntegrityReport {
            is_valid,
            total_logs: total,
            verified_logs: verified,
            tampered_log_ids: tampered,
            broken_chain_log_ids: broken,
            pruned_gap_log_ids: gaps,
            start_time: window.start,
            end_time: window.end,
            verified_at: self.clock.now(),
        })
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Filtered, paginated search, newest first.
    ///
    /// `limit` defaults to `search.default_limit` and is clamped to
    /// `search.max_limit`. `total` counts every match before pagination.
    pub fn search(&self, filter: &SearchFilter) -> AuditResult<SearchPage> {
        let limit = filter
            .limit
            .unwrap_or(self.settings.search.default_limit)
            .min(self.settings.search.max_limit);
        self.search_bounded(filter, limit)
    }

    /// Search returning at most `cap` entries, bypassing the interactive
    /// page limits. Used by export.
    pub fn search_bounded(&self, filter: &SearchFilter, cap: usize) -> AuditResult<SearchPage> {
        let matcher = EntryMatcher::new(filter)?;
        let limit = filter.limit.unwrap_or(cap).min(cap);

        let mut entries = Vec::new();
        let mut total = 0usize;
        self.store
            .scan(matcher.window(), ScanOrder::NewestFirst, &mut |entry| {
                if matcher.matches(entry) {
                    if total >= filter.offset && entries.len() < limit {
                        entries.push(entry.clone());
                    }
                    total += 1;
                }
                true
            })?;

        debug!(
            total,
            returned = entries.len(),
            offset = filter.offset,
            limit,
            "audit search"
        );
        Ok(SearchPage { entries, total })
    }

    /// Every entry for one entity, newest first.
    pub fn entity_history(&self, entity_type: &str, entity_id: &str) -> AuditResult<Vec<AuditEntry>> {
        let mut entries = self.store.by_entity(entity_type, entity_id)?;
        entries.reverse();
        Ok(entries)
    }

    /// Every entry written by one actor, optionally time-bounded, newest
    /// first.
    pub fn user_history(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AuditResult<Vec<AuditEntry>> {
        let window = validate_window(start, end)?;
        let mut entries: Vec<AuditEntry> = self
            .store
            .by_user(user_id)?
            .into_iter()
            .filter(|e| window.contains(e.timestamp))
            .collect();
        entries.reverse();
        Ok(entries)
    }

    /// Aggregate counts over the window, capped at `statistics.max_records`
    /// entries (newest first).
    pub fn statistics(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AuditResult<AuditStatistics> {
        let window = validate_window(start, end)?;
        let cap = self.settings.statistics.max_records;

        let mut acc = StatisticsAccumulator::new();
        let mut truncated = false;
        self.store.scan(window, ScanOrder::NewestFirst, &mut |entry| {
            if acc.count() >= cap {
                truncated = true;
                return false;
            }
            acc.add(entry);
            true
        })?;

        if truncated {
            warn!(cap, "audit statistics truncated at working-set cap");
        }
        Ok(acc.finish(window, self.settings.statistics.top_n, truncated))
    }

    // ── Retention ─────────────────────────────────────────────────────────────

    /// Delete entries older than `retention_days` that are not compliance
    /// relevant. Returns how many were deleted.
    ///
    /// Each deleted entry is recorded in the prune ledger before it is
    /// removed, so `verify_integrity` reports the resulting gaps as pruned
    /// rather than broken. Runs under the writer lock.
    pub fn cleanup_expired(&self, retention_days: i64) -> AuditResult<usize> {
        if retention_days <= 0 {
            return Err(AuditError::InvalidRetentionPeriod {
                days: retention_days,
            });
        }
        let period = Duration::try_days(retention_days).ok_or(AuditError::InvalidRetentionPeriod {
            days: retention_days,
        })?;

        let _guard = self.lock_writer()?;

        let now = self.clock.now();
        let Some(cutoff) = now.checked_sub_signed(period) else {
            return Ok(0);
        };

        let mut ids = Vec::new();
        let mut records = Vec::new();
        let window = validate_window(None, Some(cutoff))?;
        self.store.scan(window, ScanOrder::ChainOrder, &mut |entry| {
            if entry.timestamp < cutoff && !entry.compliance_relevant {
                ids.push(entry.id.clone());
                records.push(PruneRecord {
                    pruned_log_id: entry.log_id.clone(),
                    pruned_checksum: entry.checksum.clone(),
                    pruned_previous_checksum: entry.previous_checksum.clone(),
                    pruned_at: now,
                });
            }
            true
        })?;

        if ids.is_empty() {
            debug!(retention_days, "no audit entries past retention");
            return Ok(0);
        }

        self.store.record_prunes(&records)?;
        let deleted = self.store.delete_by_ids(&ids)?;

        info!(
            retention_days,
            cutoff = %cutoff.to_rfc3339(),
            deleted,
            "expired audit entries pruned"
        );
        Ok(deleted)
    }
}

/// `AUD-<yyyyMMddHHmmssSSS>-<6 random upper-case alphanumerics>`.
fn generate_log_id(timestamp: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("AUD-{}-{}", timestamp.format("%Y%m%d%H%M%S%3f"), suffix)
}

/// Classify the link from an entry (`actual` = its `previous_checksum`) to
/// the entry loaded before it (`expected` = that entry's checksum, `None`
/// for the beginning of the chain).
fn resolve_link(
    actual: Option<&str>,
    expected: Option<&str>,
    pruned: &HashMap<String, Option<String>>,
) -> Link {
    if actual == expected {
        return Link::Intact;
    }
    let mut cursor = actual;
    let mut hops = 0usize;
    while let Some(checksum) = cursor {
        let Some(previous) = pruned.get(checksum) else {
            break;
        };
        cursor = previous.as_deref();
        hops += 1;
        if cursor == expected {
            return Link::PrunedGap;
        }
        if hops > pruned.len() {
            break;
        }
    }
    Link::Broken
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

    use chrono::TimeZone;
    use serde_json::json;

    use auditchain_contracts::{
        entry::{EventStatus, EventType},
        query::TimeWindow,
    };

    use super::*;

    // ── Mocks ─────────────────────────────────────────────────────────────────

    /// FNV-1a 64, rendered as hex. Content-sensitive, which is all the
    /// orchestration tests need.
    struct MockDigester;

    impl Digester for MockDigester {
        fn algorithm(&self) -> &'static str {
            "fnv1a64"
        }
        fn digest(&self, bytes: &[u8]) -> String {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for b in bytes {
                hash ^= u64::from(*b);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            format!("{:016x}", hash)
        }
    }

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn at(t: DateTime<Utc>) -> Self {
            Self(Mutex::new(t))
        }
        fn set(&self, t: DateTime<Utc>) {
            *self.0.lock().unwrap() = t;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    #[derive(Default)]
    struct MockStore {
        entries: Mutex<Vec<AuditEntry>>,
        tail: Mutex<Option<ChainTail>>,
        prunes: Mutex<Vec<PruneRecord>>,
        races_to_inject: AtomicU32,
        unavailable: AtomicBool,
        scans: AtomicUsize,
    }

    impl EntryStore for MockStore {
        fn tail(&self) -> AuditResult<Option<ChainTail>> {
            Ok(self.tail.lock().unwrap().clone())
        }

        fn insert(&self, entry: AuditEntry, expected_tail: Option<&str>) -> AuditResult<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(AuditError::StoreUnavailable {
                    reason: "mock outage".to_string(),
                });
            }
            if self.races_to_inject.load(Ordering::SeqCst) > 0 {
                self.races_to_inject.fetch_sub(1, Ordering::SeqCst);
                return Err(AuditError::ChainRaceDetected {
                    expected: expected_tail.unwrap_or("<genesis>").to_string(),
                    found: "concurrent-writer".to_string(),
                });
            }
            let mut tail = self.tail.lock().unwrap();
            assert_eq!(tail.as_ref().map(|t| t.checksum.as_str()), expected_tail);
            *tail = Some(ChainTail {
                log_id: entry.log_id.clone(),
                checksum: entry.checksum.clone(),
                timestamp: entry.timestamp,
            });
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn scan(
            &self,
            window: TimeWindow,
            order: ScanOrder,
            visit: &mut dyn FnMut(&AuditEntry) -> bool,
        ) -> AuditResult<()> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            let entries = self.entries.lock().unwrap().clone();
            let in_window = entries.iter().filter(|e| window.contains(e.timestamp));
            let ordered: Vec<&AuditEntry> = match order {
                ScanOrder::ChainOrder => in_window.collect(),
                ScanOrder::NewestFirst => in_window.rev().collect(),
            };
            for entry in ordered {
                if !visit(entry) {
                    break;
                }
            }
            Ok(())
        }

        fn by_entity(&self, entity_type: &str, entity_id: &str) -> AuditResult<Vec<AuditEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
                .cloned()
                .collect())
        }

        fn by_user(&self, user_id: &str) -> AuditResult<Vec<AuditEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect())
        }

        fn delete_by_ids(&self, ids: &[String]) -> AuditResult<usize> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| !ids.contains(&e.id));
            Ok(before - entries.len())
        }

        fn record_prunes(&self, records: &[PruneRecord]) -> AuditResult<()> {
            self.prunes.lock().unwrap().extend_from_slice(records);
            Ok(())
        }

        fn prune_records(&self) -> AuditResult<Vec<PruneRecord>> {
            Ok(self.prunes.lock().unwrap().clone())
        }

        fn len(&self) -> AuditResult<usize> {
            Ok(self.entries.lock().unwrap().len())
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    fn make_chain(store: Arc<MockStore>, clock: Arc<FixedClock>) -> AuditChainStore {
        AuditChainStore::new(store, Arc::new(MockDigester), clock, AuditSettings::default())
    }

    fn draft(entity: &str, action: &str) -> AuditEntryDraft {
        AuditEntryDraft::new(EventType::Update, "invoice", entity, "user-1", action)
    }

    // ── Append ────────────────────────────────────────────────────────────────

    #[test]
    fn test_first_entry_has_no_predecessor() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(store, Arc::new(FixedClock::at(t0())));

        let entry = chain.append(draft("INV-1", "Created invoice")).unwrap();
        assert!(entry.previous_checksum.is_none());
        assert!(!entry.checksum.is_empty());
        assert!(entry.log_id.starts_with("AUD-20260601090000000-"));
        assert_eq!(entry.log_id.len(), "AUD-20260601090000000-".len() + 6);
    }

    #[test]
    fn test_append_links_to_tail() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));

        let a = chain.append(draft("INV-1", "a")).unwrap();
        let b = chain.append(draft("INV-1", "b")).unwrap();
        let c = chain.append(draft("INV-2", "c")).unwrap();

        assert_eq!(b.previous_checksum.as_deref(), Some(a.checksum.as_str()));
        assert_eq!(c.previous_checksum.as_deref(), Some(b.checksum.as_str()));
        assert_ne!(a.checksum, b.checksum);
        assert_eq!(chain.chain_tail().unwrap().unwrap().checksum, c.checksum);
    }

    #[test]
    fn test_checksum_matches_recomputation() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(store, Arc::new(FixedClock::at(t0())));

        let entry = chain
            .append(draft("INV-1", "x").with_after(json!({ "total": 120, "currency": "EUR" })))
            .unwrap();
        assert_eq!(compute_checksum(&MockDigester, &entry).unwrap(), entry.checksum);
    }

    #[test]
    fn test_timestamp_never_goes_backwards() {
        let store = Arc::new(MockStore::default());
        let clock = Arc::new(FixedClock::at(t0()));
        let chain = make_chain(store, Arc::clone(&clock));

        let first = chain.append(draft("INV-1", "a")).unwrap();
        clock.set(t0() - Duration::minutes(5));
        let second = chain.append(draft("INV-1", "b")).unwrap();

        assert_eq!(second.timestamp, first.timestamp, "skewed clock is clamped to the tail");
        assert_eq!(second.created_at, t0() - Duration::minutes(5));
    }

    #[test]
    fn test_default_retention_applied() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(store, Arc::new(FixedClock::at(t0())));

        let defaulted = chain.append(draft("INV-1", "a")).unwrap();
        let explicit = chain.append(draft("INV-1", "b").with_retention_period(30)).unwrap();
        assert_eq!(defaulted.retention_period, 2555);
        assert_eq!(explicit.retention_period, 30);
    }

    #[test]
    fn test_store_unavailable_is_not_retried() {
        let store = Arc::new(MockStore::default());
        store.unavailable.store(true, Ordering::SeqCst);
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));

        let err = chain.append_with_retry(draft("INV-1", "a")).unwrap_err();
        assert!(matches!(err, AuditError::StoreUnavailable { .. }));
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_chain_race_surfaces_from_plain_append() {
        let store = Arc::new(MockStore::default());
        store.races_to_inject.store(1, Ordering::SeqCst);
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));

        let err = chain.append(draft("INV-1", "a")).unwrap_err();
        assert!(matches!(err, AuditError::ChainRaceDetected { .. }));
    }

    #[test]
    fn test_append_with_retry_recovers_from_race() {
        let store = Arc::new(MockStore::default());
        store.races_to_inject.store(2, Ordering::SeqCst);
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));

        let entry = chain.append_with_retry(draft("INV-1", "a")).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(chain.chain_tail().unwrap().unwrap().log_id, entry.log_id);
    }

    #[test]
    fn test_append_with_retry_gives_up_after_max_attempts() {
        let store = Arc::new(MockStore::default());
        store.races_to_inject.store(3, Ordering::SeqCst);
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));

        let err = chain.append_with_retry(draft("INV-1", "a")).unwrap_err();
        assert!(matches!(err, AuditError::ChainRaceDetected { .. }));
        assert_eq!(store.len().unwrap(), 0);
    }

    // ── Verification ──────────────────────────────────────────────────────────

    #[test]
    fn test_verify_empty_chain_is_valid() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(store, Arc::new(FixedClock::at(t0())));

        let report = chain.verify_integrity(None, None).unwrap();
        assert!(report.is_valid);
        assert_eq!(report.total_logs, 0);
        assert_eq!(report.verified_logs, 0);
    }

    #[test]
    fn test_verify_detects_forged_predecessor() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));
        chain.append(draft("INV-1", "a")).unwrap();
        let b = chain.append(draft("INV-1", "b")).unwrap();

        // Relink b to a made-up predecessor and re-seal it so only the link is wrong.
        {
            let mut entries = store.entries.lock().unwrap();
            entries[1].previous_checksum = Some("feedfacefeedface".to_string());
            entries[1].checksum = compute_checksum(&MockDigester, &entries[1]).unwrap();
        }

        let report = chain.verify_integrity(None, None).unwrap();
        assert!(!report.is_valid);
        assert!(report.tampered_log_ids.is_empty());
        assert_eq!(report.broken_chain_log_ids, vec![b.log_id]);
        assert_eq!(report.verified_logs, 1);
    }

    #[test]
    fn test_verify_whole_history_rejects_orphan_first_entry() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));
        let a = chain.append(draft("INV-1", "a")).unwrap();
        chain.append(draft("INV-1", "b")).unwrap();

        // Removing the genesis entry without a prune record leaves b dangling.
        store.delete_by_ids(&[a.id]).unwrap();

        let report = chain.verify_integrity(None, None).unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.broken_chain_log_ids.len(), 1);
    }

    #[test]
    fn test_verify_rejects_inverted_window() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));

        let err = chain.verify_integrity(Some(t0()), Some(t0() - Duration::days(1))).unwrap_err();
        assert!(matches!(err, AuditError::InvalidFilter { .. }));
        assert_eq!(store.scans.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_resolve_link_walks_consecutive_prunes() {
        let mut pruned = HashMap::new();
        pruned.insert("c2".to_string(), Some("c1".to_string()));
        pruned.insert("c1".to_string(), Some("c0".to_string()));

        assert_eq!(resolve_link(Some("c2"), Some("c0"), &pruned), Link::PrunedGap);
        assert_eq!(resolve_link(Some("c2"), Some("c9"), &pruned), Link::Broken);
        assert_eq!(resolve_link(Some("c0"), Some("c0"), &pruned), Link::Intact);
        assert_eq!(resolve_link(Some("zz"), None, &pruned), Link::Broken);
    }

    #[test]
    fn test_resolve_link_reaches_genesis() {
        let mut pruned = HashMap::new();
        pruned.insert("c0".to_string(), None);
        assert_eq!(resolve_link(Some("c0"), None, &pruned), Link::PrunedGap);
    }

    // ── Search ────────────────────────────────────────────────────────────────

    #[test]
    fn test_search_rejects_inverted_window_before_touching_store() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));

        let filter = SearchFilter::between(t0(), t0() - Duration::hours(1));
        let err = chain.search(&filter).unwrap_err();
        assert!(matches!(err, AuditError::InvalidFilter { .. }));
        assert_eq!(store.scans.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_search_rejects_zero_limit() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(store, Arc::new(FixedClock::at(t0())));

        let filter = SearchFilter {
            limit: Some(0),
            ..SearchFilter::default()
        };
        assert!(matches!(chain.search(&filter), Err(AuditError::InvalidFilter { .. })));
    }

    #[test]
    fn test_search_paginates_newest_first() {
        let store = Arc::new(MockStore::default());
        let clock = Arc::new(FixedClock::at(t0()));
        let chain = make_chain(store, Arc::clone(&clock));

        let mut log_ids = Vec::new();
        for i in 0..5 {
            clock.set(t0() + Duration::minutes(i));
            log_ids.push(chain.append(draft("INV-1", &format!("step {i}"))).unwrap().log_id);
        }

        let page = chain
            .search(&SearchFilter {
                offset: 1,
                limit: Some(2),
                ..SearchFilter::default()
            })
            .unwrap();
        assert_eq!(page.total, 5);
        let got: Vec<&str> = page.entries.iter().map(|e| e.log_id.as_str()).collect();
        assert_eq!(got, vec![log_ids[3].as_str(), log_ids[2].as_str()]);
    }

    #[test]
    fn test_search_limit_clamped_to_max() {
        let store = Arc::new(MockStore::default());
        let mut settings = AuditSettings::default();
        settings.search.max_limit = 2;
        settings.search.default_limit = 2;
        let chain = AuditChainStore::new(
            store,
            Arc::new(MockDigester),
            Arc::new(FixedClock::at(t0())),
            settings,
        );
        for i in 0..4 {
            chain.append(draft("INV-1", &format!("{i}"))).unwrap();
        }

        let page = chain
            .search(&SearchFilter {
                limit: Some(50),
                ..SearchFilter::default()
            })
            .unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.total, 4);
    }

    #[test]
    fn test_search_text_is_case_insensitive() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(store, Arc::new(FixedClock::at(t0())));
        chain.append(draft("INV-1", "Voided Invoice")).unwrap();
        chain
            .append(AuditEntryDraft::new(EventType::Access, "patient", "P-77", "nurse-2", "Opened chart").with_actor("Marta", "nurse"))
            .unwrap();

        let by_action = chain
            .search(&SearchFilter {
                search_text: Some("voided".to_string()),
                ..SearchFilter::default()
            })
            .unwrap();
        assert_eq!(by_action.total, 1);

        let by_username = chain
            .search(&SearchFilter {
                search_text: Some("MARTA".to_string()),
                ..SearchFilter::default()
            })
            .unwrap();
        assert_eq!(by_username.total, 1);
        assert_eq!(by_username.entries[0].entity_id, "P-77");

        let blank = chain
            .search(&SearchFilter {
                search_text: Some("   ".to_string()),
                ..SearchFilter::default()
            })
            .unwrap();
        assert_eq!(blank.total, 2, "blank text filter is ignored");
    }

    // ── Histories ─────────────────────────────────────────────────────────────

    #[test]
    fn test_entity_and_user_history_newest_first() {
        let store = Arc::new(MockStore::default());
        let clock = Arc::new(FixedClock::at(t0()));
        let chain = make_chain(store, Arc::clone(&clock));

        let a = chain.append(draft("INV-1", "created")).unwrap();
        clock.set(t0() + Duration::hours(1));
        chain.append(draft("INV-2", "created")).unwrap();
        clock.set(t0() + Duration::hours(2));
        let c = chain.append(draft("INV-1", "paid")).unwrap();

        let history = chain.entity_history("invoice", "INV-1").unwrap();
        let ids: Vec<&str> = history.iter().map(|e| e.log_id.as_str()).collect();
        assert_eq!(ids, vec![c.log_id.as_str(), a.log_id.as_str()]);

        let bounded = chain
            .user_history("user-1", Some(t0() + Duration::minutes(30)), None)
            .unwrap();
        assert_eq!(bounded.len(), 2);
        assert_eq!(bounded[0].log_id, c.log_id);
        assert!(chain.user_history("nobody", None, None).unwrap().is_empty());
    }

    // ── Statistics ────────────────────────────────────────────────────────────

    #[test]
    fn test_statistics_counts_and_ranks() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(store, Arc::new(FixedClock::at(t0())));

        chain.append(draft("INV-1", "a").security_event()).unwrap();
        chain.append(draft("INV-2", "b").with_status(EventStatus::Failure)).unwrap();
        chain
            .append(AuditEntryDraft::new(EventType::Delete, "product", "SKU-1", "user-2", "c").critical_operation().compliance_relevant())
            .unwrap();

        let stats = chain.statistics(None, None).unwrap();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.security_events, 1);
        assert_eq!(stats.failed_operations, 1);
        assert_eq!(stats.critical_operations, 1);
        assert_eq!(stats.compliance_relevant, 1);
        assert_eq!(stats.distinct_users, 2);
        assert_eq!(stats.top_users[0].key, "user-1");
        assert_eq!(stats.top_users[0].count, 2);
        assert_eq!(stats.top_entity_types[0].key, "invoice");
        assert_eq!(stats.top_event_types[0].key, "UPDATE");
        assert!(!stats.truncated);
    }

    #[test]
    fn test_statistics_stops_at_cap() {
        let store = Arc::new(MockStore::default());
        let mut settings = AuditSettings::default();
        settings.statistics.max_records = 2;
        let chain = AuditChainStore::new(
            store,
            Arc::new(MockDigester),
            Arc::new(FixedClock::at(t0())),
            settings,
        );
        for i in 0..3 {
            chain.append(draft("INV-1", &format!("{i}"))).unwrap();
        }

        let stats = chain.statistics(None, None).unwrap();
        assert_eq!(stats.total_entries, 2);
        assert!(stats.truncated);
    }

    // ── Retention ─────────────────────────────────────────────────────────────

    #[test]
    fn test_cleanup_rejects_non_positive_retention() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));
        chain.append(draft("INV-1", "a")).unwrap();

        for days in [0, -1, -365] {
            let err = chain.cleanup_expired(days).unwrap_err();
            assert!(matches!(err, AuditError::InvalidRetentionPeriod { .. }));
        }
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_cleanup_records_prunes_before_deleting() {
        let store = Arc::new(MockStore::default());
        let clock = Arc::new(FixedClock::at(t0() - Duration::days(200)));
        let chain = make_chain(Arc::clone(&store), Arc::clone(&clock));

        let old = chain.append(draft("INV-1", "old")).unwrap();
        clock.set(t0());
        chain.append(draft("INV-1", "new")).unwrap();

        assert_eq!(chain.cleanup_expired(90).unwrap(), 1);
        let ledger = chain.prune_ledger().unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].pruned_log_id, old.log_id);
        assert_eq!(ledger[0].pruned_checksum, old.checksum);
        assert_eq!(ledger[0].pruned_previous_checksum, None);
        assert_eq!(ledger[0].pruned_at, t0());
    }

    #[test]
    fn test_cleanup_with_nothing_expired_writes_no_ledger_rows() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));
        chain.append(draft("INV-1", "fresh")).unwrap();

        assert_eq!(chain.cleanup_expired(30).unwrap(), 0);
        assert!(chain.prune_ledger().unwrap().is_empty());
    }

    #[test]
    fn test_cleanup_with_huge_retention_deletes_nothing() {
        let store = Arc::new(MockStore::default());
        let chain = make_chain(Arc::clone(&store), Arc::new(FixedClock::at(t0())));
        chain.append(draft("INV-1", "a")).unwrap();

        match chain.cleanup_expired(i64::MAX) {
            Ok(n) => assert_eq!(n, 0),
            Err(e) => assert!(matches!(e, AuditError::InvalidRetentionPeriod { .. })),
        }
        assert_eq!(store.len().unwrap(), 1);
    }
}
