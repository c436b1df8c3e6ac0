//! Scenario 3: Compliance Export
//!
//! An external auditor requests every compliance-relevant entry of the
//! business day. The export is rendered in the chosen format, stored with a
//! time-to-live, fetched back, and then refused once it has expired.

use std::sync::Arc;

use chrono::{Duration, Utc};

use auditchain_config::AuditSettings;
use auditchain_contracts::{
    error::{AuditError, AuditResult},
    export::{ExportFormat, ExportRequest},
    query::SearchFilter,
};
use auditchain_core::traits::ArtifactSink;
use auditchain_export::{Exporter, InMemoryArtifactSink};
use auditchain_store::InMemoryEntryStore;

use super::reference_chain;
use crate::mock_data::{business_day, record_all};

/// Lines of the artifact echoed to the console.
const PREVIEW_LINES: usize = 12;

/// Run Scenario 3: Compliance Export in `format`.
pub fn run_scenario(settings: &AuditSettings, format: ExportFormat) -> AuditResult<()> {
    println!("=== Scenario 3: Compliance Export ({}) ===", format);
    println!();

    let (chain, clock) = reference_chain(settings, Arc::new(InMemoryEntryStore::new()), Utc::now());
    let recorded = record_all(&chain, &clock, business_day(), Duration::minutes(3))?;
    println!("  Recorded {} business events.", recorded.len());

    let sink = Arc::new(InMemoryArtifactSink::new());
    let exporter = Exporter::new(chain.clone(), sink.clone());

    let request = ExportRequest {
        requested_by: "external-auditor@kpmg.example".to_string(),
        purpose: "Annual SOX compliance review".to_string(),
        filter: SearchFilter {
            compliance_relevant: Some(true),
            ..SearchFilter::default()
        },
        format,
    };
    let record = exporter.export(&request)?;

    println!("  Export id:        {}", record.id);
    println!("  Requested by:     {}", record.requested_by);
    println!("  Purpose:          {}", record.purpose);
    println!(
        "  Records:          {} of {} matching{}",
        record.record_count,
        record.total_matching,
        if record.truncated { " (truncated)" } else { "" }
    );
    println!("  Artifact:         {} ({} bytes)", record.artifact.uri, record.artifact.size_bytes);
    println!("  Checksum:         {}", record.checksum);
    println!("  Expires at:       {}", record.expires_at.to_rfc3339());
    println!();

    let bytes = sink.fetch(&record.artifact.uri, chain.now())?;
    println!("  Preview:");
    for line in String::from_utf8_lossy(&bytes).lines().take(PREVIEW_LINES) {
        println!("    {}", line);
    }
    println!("    ...");
    println!();

    clock.set(record.expires_at);
    match sink.fetch(&record.artifact.uri, chain.now()) {
        Err(AuditError::ArtifactUnavailable { .. }) => {
            println!("  Fetch after expiry: refused (ArtifactUnavailable)");
        }
        Err(e) => return Err(e),
        Ok(_) => {
            return Err(AuditError::ExportFailed {
                reason: "expired artifact was still served".to_string(),
            })
        }
    }
    let purged = sink.purge_expired(chain.now())?;
    println!("  Purged {} expired artifact(s).", purged);
    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(())
}
