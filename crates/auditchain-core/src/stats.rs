//! Aggregate counters over a set of entries.

use std::collections::HashMap;

use auditchain_contracts::{
    entry::{AuditEntry, EventStatus},
    query::TimeWindow,
    report::{AuditStatistics, FrequencyCount},
};

/// Accumulates `AuditStatistics` one entry at a time.
#[derive(Debug, Default)]
pub struct StatisticsAccumulator {
    total: usize,
    security: usize,
    critical: usize,
    compliance: usize,
    failed: usize,
    users: HashMap<String, usize>,
    entity_types: HashMap<String, usize>,
    event_types: HashMap<String, usize>,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: &AuditEntry) {
        self.total += 1;
        self.security += usize::from(entry.is_security_event);
        self.critical += usize::from(entry.is_critical_operation);
        self.compliance += usize::from(entry.compliance_relevant);
        self.failed += usize::from(entry.status == EventStatus::Failure);
        *self.users.entry(entry.user_id.clone()).or_default() += 1;
        *self.entity_types.entry(entry.entity_type.clone()).or_default() += 1;
        *self
            .event_types
            .entry(entry.event_type.as_str().to_string())
            .or_default() += 1;
    }

    pub fn count(&self) -> usize {
        self.total
    }

    pub fn finish(self, window: TimeWindow, top_n: usize, truncated: bool) -> AuditStatistics {
        AuditStatistics {
            total_entries: self.total,
            security_events: self.security,
            critical_operations: self.critical,
            compliance_relevant: self.compliance,
            failed_operations: self.failed,
            distinct_users: self.users.len(),
            top_users: top(self.users, top_n),
            top_entity_types: top(self.entity_types, top_n),
            top_event_types: top(self.event_types, top_n),
            start_time: window.start,
            end_time: window.end,
            truncated,
        }
    }
}

/// Highest counts first; ties broken by key so output is stable.
fn top(counts: HashMap<String, usize>, n: usize) -> Vec<FrequencyCount> {
    let mut ranked: Vec<FrequencyCount> = counts
        .into_iter()
        .map(|(key, count)| FrequencyCount { key, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(n);
    ranked
}
