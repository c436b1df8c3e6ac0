//! Scenario 4: Activity Report
//!
//! The questions an operations manager asks of the audit log after a busy
//! day: what happened to one sales order, what one HR user did, which
//! security events failed, and the aggregate picture.

use std::sync::Arc;

use chrono::{Duration, Utc};

use auditchain_config::AuditSettings;
use auditchain_contracts::{
    entry::{AuditEntry, EventStatus},
    error::AuditResult,
    query::SearchFilter,
    report::FrequencyCount,
};
use auditchain_store::InMemoryEntryStore;

use super::reference_chain;
use crate::mock_data::{business_day, record_all};

fn print_entries(entries: &[AuditEntry]) {
    for e in entries {
        println!(
            "    {}  {:<8} {:<16} {:<10} {}",
            e.timestamp.format("%H:%M:%S"),
            e.event_type.as_str(),
            e.entity_type,
            e.username,
            e.action
        );
    }
}

fn print_top(label: &str, counts: &[FrequencyCount]) {
    let joined: Vec<String> = counts.iter().map(|c| format!("{} ({})", c.key, c.count)).collect();
    println!("  {:<20}{}", label, joined.join(", "));
}

/// Run Scenario 4: Activity Report.
pub fn run_scenario(settings: &AuditSettings) -> AuditResult<()> {
    println!("=== Scenario 4: Activity Report ===");
    println!();

    let start = Utc::now();
    let (chain, clock) = reference_chain(settings, Arc::new(InMemoryEntryStore::new()), start);
    let recorded = record_all(&chain, &clock, business_day(), Duration::minutes(11))?;
    println!("  Recorded {} business events.", recorded.len());
    println!();

    println!("  History of sales order SO-2026-0815 (newest first):");
    print_entries(&chain.entity_history("sales_order", "SO-2026-0815")?);
    println!();

    println!("  Activity of j.smith during the first two hours:");
    print_entries(&chain.user_history("u-jsmith", Some(start), Some(start + Duration::hours(2)))?);
    println!();

    let failed = chain.search(&SearchFilter {
        is_security_event: Some(true),
        status: Some(EventStatus::Failure),
        ..SearchFilter::default()
    })?;
    println!("  Failed security events: {}", failed.total);
    print_entries(&failed.entries);
    println!();

    let text = chain.search(&SearchFilter {
        search_text: Some("salary".to_string()),
        ..SearchFilter::default()
    })?;
    println!("  Free-text search 'salary': {} match(es)", text.total);
    print_entries(&text.entries);
    println!();

    let stats = chain.statistics(None, None)?;
    println!("  Statistics");
    println!("  {:<20}{}", "Total entries:", stats.total_entries);
    println!("  {:<20}{}", "Security events:", stats.security_events);
    println!("  {:<20}{}", "Critical ops:", stats.critical_operations);
    println!("  {:<20}{}", "Compliance:", stats.compliance_relevant);
    println!("  {:<20}{}", "Failed:", stats.failed_operations);
    println!("  {:<20}{}", "Distinct users:", stats.distinct_users);
    print_top("Top users:", &stats.top_users);
    print_top("Top entity types:", &stats.top_entity_types);
    print_top("Top event types:", &stats.top_event_types);
    println!();
    println!("  Scenario 4 complete.");
    println!();

    Ok(())
}
