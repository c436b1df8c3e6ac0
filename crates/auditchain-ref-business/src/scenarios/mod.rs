//! Business-application reference scenarios.
//!
//! Each scenario wires the real auditchain components (chain store, SHA-256
//! digester, in-memory store, exporter) to mock ERP events and narrates one
//! property of the audit log.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use auditchain_config::AuditSettings;
use auditchain_contracts::report::IntegrityReport;
use auditchain_core::{traits::EntryStore, AuditChainStore};
use auditchain_store::{ManualClock, Sha256Digester};

pub mod activity_report;
pub mod compliance_export;
pub mod retention_cleanup;
pub mod tamper_detection;

/// A chain over `store` whose clock starts at `start` and only moves when a
/// scenario advances it.
pub(crate) fn reference_chain(
    settings: &AuditSettings,
    store: Arc<dyn EntryStore>,
    start: DateTime<Utc>,
) -> (Arc<AuditChainStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let chain = Arc::new(AuditChainStore::new(
        store,
        Arc::new(Sha256Digester),
        clock.clone(),
        settings.clone(),
    ));
    (chain, clock)
}

pub(crate) fn print_integrity(label: &str, report: &IntegrityReport) {
    println!(
        "  {:<24}{} ({}/{} verified)",
        label,
        if report.is_valid { "VALID" } else { "INVALID" },
        report.verified_logs,
        report.total_logs
    );
    for id in &report.tampered_log_ids {
        println!("      tampered:     {}", id);
    }
    for id in &report.broken_chain_log_ids {
        println!("      broken link:  {}", id);
    }
    for id in &report.pruned_gap_log_ids {
        println!("      pruned gap:   {}", id);
    }
}
