//! The export operation.
//!
//! `Exporter::export` runs a capped search, renders the page in the
//! requested format, hands the bytes to the artifact sink, and returns the
//! `ExportRecord` describing what was produced.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use auditchain_contracts::{
    error::{AuditError, AuditResult},
    export::{ExportFormat, ExportRecord, ExportRequest},
};
use auditchain_core::{traits::ArtifactSink, AuditChainStore};

use crate::formats::{render_csv, render_json, render_report, render_xml, ReportContext};

pub struct Exporter {
    chain: Arc<AuditChainStore>,
    sink: Arc<dyn ArtifactSink>,
}

impl Exporter {
    pub fn new(chain: Arc<AuditChainStore>, sink: Arc<dyn ArtifactSink>) -> Self {
        Self { chain, sink }
    }

    /// Export the entries matching `request.filter`, newest first.
    ///
    /// At most `export.max_records` entries are written; `truncated` is set
    /// when more matched. An invalid filter fails with `InvalidFilter`
    /// before the store is read.
    pub fn export(&self, request: &ExportRequest) -> AuditResult<ExportRecord> {
        let settings = self.chain.settings();
        let page = self
            .chain
            .search_bounded(&request.filter, settings.export.max_records)?;
        let generated_at = self.chain.now();
        let window = request.filter.window();

        let bytes = match request.format {
            ExportFormat::Json => render_json(&page.entries)?,
            ExportFormat::Csv => render_csv(&page.entries)?,
            ExportFormat::Xml => render_xml(&page.entries, generated_at)?,
            ExportFormat::Report => render_report(
                &page.entries,
                &ReportContext {
                    requested_by: &request.requested_by,
                    purpose: &request.purpose,
                    window,
                    generated_at,
                    top_n: settings.statistics.top_n,
                    digester: self.chain.digester(),
                },
            )?,
        };

        let ttl_hours = settings.export.artifact_ttl_hours;
        let expires_at = Duration::try_hours(i64::from(ttl_hours))
            .and_then(|ttl| generated_at.checked_add_signed(ttl))
            .ok_or_else(|| AuditError::ExportFailed {
                reason: format!("artifact ttl of {ttl_hours} hours is out of range"),
            })?;
        let checksum = self.chain.digester().digest(&bytes);
        let name = format!(
            "audit-export-{}.{}",
            generated_at.format("%Y%m%dT%H%M%SZ"),
            request.format.file_extension()
        );
        let artifact = self
            .sink
            .store(&name, request.format.content_type(), bytes, expires_at)?;

        let record_count = page.entries.len();
        let truncated = page.total.saturating_sub(request.filter.offset) > record_count;
        if truncated {
            warn!(
                total = page.total,
                exported = record_count,
                cap = settings.export.max_records,
                "audit export truncated at record cap"
            );
        }

        let record = ExportRecord {
            id: Uuid::new_v4().to_string(),
            requested_by: request.requested_by.clone(),
            purpose: request.purpose.clone(),
            start_time: window.start,
            end_time: window.end,
            record_count,
            total_matching: page.total,
            truncated,
            format: request.format,
            artifact,
            checksum,
            generated_at,
            expires_at,
        };

        info!(
            export_id = %record.id,
            requested_by = %record.requested_by,
            format = %record.format,
            record_count,
            uri = %record.artifact.uri,
            "audit export generated"
        );
        Ok(record)
    }
}
