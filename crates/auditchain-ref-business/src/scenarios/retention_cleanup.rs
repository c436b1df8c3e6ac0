//! Scenario 2: Retention Cleanup
//!
//! Fourteen months of events are recorded, one business day per month.
//! Cleanup with a one-year period then prunes the old routine entries while
//! every compliance-relevant entry survives, and the chain still verifies
//! because each prune is on the ledger.

use std::sync::Arc;

use chrono::{Duration, Utc};

use auditchain_config::AuditSettings;
use auditchain_contracts::error::AuditResult;
use auditchain_store::InMemoryEntryStore;

use super::{print_integrity, reference_chain};
use crate::mock_data::{business_day, record_all};

const MONTHS: i64 = 14;
const RETENTION_DAYS: i64 = 365;

/// Run Scenario 2: Retention Cleanup.
pub fn run_scenario(settings: &AuditSettings) -> AuditResult<()> {
    println!("=== Scenario 2: Retention Cleanup ===");
    println!();

    let start = Utc::now() - Duration::days(30 * MONTHS);
    let (chain, clock) = reference_chain(settings, Arc::new(InMemoryEntryStore::new()), start);

    let mut recorded = Vec::new();
    for month in 0..MONTHS {
        clock.set(start + Duration::days(30 * month));
        recorded.extend(record_all(&chain, &clock, business_day(), Duration::minutes(5))?);
    }
    clock.set(Utc::now());

    let compliance = recorded.iter().filter(|e| e.compliance_relevant).count();
    println!("  Recorded {} entries over {} months.", recorded.len(), MONTHS);
    println!("  Compliance-relevant: {}", compliance);
    print_integrity("Before cleanup:", &chain.verify_integrity(None, None)?);
    println!();

    let deleted = chain.cleanup_expired(RETENTION_DAYS)?;
    println!("  cleanup_expired({}) deleted {} entries.", RETENTION_DAYS, deleted);
    println!("  Prune ledger rows:   {}", chain.prune_ledger()?.len());
    println!("  Entries remaining:   {}", chain.len()?);

    let report = chain.verify_integrity(None, None)?;
    print_integrity("After cleanup:", &report);
    println!();

    // The next append still links to the last recorded link.
    let next = record_all(
        &chain,
        &clock,
        business_day().into_iter().take(1).collect(),
        Duration::seconds(1),
    )?;
    if let Some(entry) = next.first() {
        println!(
            "  New entry {} links to {}",
            entry.log_id,
            entry.previous_checksum.as_deref().unwrap_or("-")
        );
    }
    print_integrity("After next append:", &chain.verify_integrity(None, None)?);
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}
