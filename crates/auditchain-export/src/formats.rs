//! Renderers for each `ExportFormat`.
//!
//! All formats carry the same field set, in `AuditEntry` declaration order.
//! Structured values (`before_data`, `after_data`, `changes`) are embedded as
//! compact JSON in the CSV and XML renderings.
//!
//! Free text is escaped for the target format: CSV fields holding a comma,
//! quote, CR, or LF are quoted with inner quotes doubled (RFC 4180); XML
//! text and attributes escape `& < > " '`.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use auditchain_contracts::{
    entry::AuditEntry,
    error::AuditResult,
    query::TimeWindow,
    report::AuditStatistics,
};
use auditchain_core::{canonical::compute_checksum, stats::StatisticsAccumulator, traits::Digester};

/// Column order shared by the CSV header and the XML element order.
pub const FIELDS: [&str; 24] = [
    "id",
    "log_id",
    "timestamp",
    "created_at",
    "event_type",
    "entity_type",
    "entity_id",
    "user_id",
    "username",
    "user_role",
    "ip_address",
    "user_agent",
    "session_id",
    "action",
    "before_data",
    "after_data",
    "changes",
    "is_security_event",
    "is_critical_operation",
    "compliance_relevant",
    "status",
    "checksum",
    "previous_checksum",
    "retention_period",
];

fn ts(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn json_text(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_default()
}

/// Flatten one entry into strings, in `FIELDS` order.
fn field_values(entry: &AuditEntry) -> AuditResult<[String; 24]> {
    let changes = match &entry.changes {
        Some(c) => serde_json::to_string(c)?,
        None => String::new(),
    };
    Ok([
        entry.id.clone(),
        entry.log_id.clone(),
        ts(&entry.timestamp),
        ts(&entry.created_at),
        entry.event_type.to_string(),
        entry.entity_type.clone(),
        entry.entity_id.clone(),
        entry.user_id.clone(),
        entry.username.clone(),
        entry.user_role.clone(),
        entry.ip_address.clone().unwrap_or_default(),
        entry.user_agent.clone().unwrap_or_default(),
        entry.session_id.clone().unwrap_or_default(),
        entry.action.clone(),
        json_text(entry.before_data.as_ref()),
        json_text(entry.after_data.as_ref()),
        changes,
        entry.is_security_event.to_string(),
        entry.is_critical_operation.to_string(),
        entry.compliance_relevant.to_string(),
        entry.status.to_string(),
        entry.checksum.clone(),
        entry.previous_checksum.clone().unwrap_or_default(),
        entry.retention_period.to_string(),
    ])
}

// ── JSON ──────────────────────────────────────────────────────────────────────

pub fn render_json(entries: &[AuditEntry]) -> AuditResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(entries)?)
}

// ── CSV ───────────────────────────────────────────────────────────────────────

/// Quote `field` if it contains a delimiter, quote, or line break.
pub fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn render_csv(entries: &[AuditEntry]) -> AuditResult<Vec<u8>> {
    let mut out = FIELDS.join(",");
    out.push_str("\r\n");
    for entry in entries {
        let row: Vec<String> = field_values(entry)?.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    Ok(out.into_bytes())
}

// ── XML ───────────────────────────────────────────────────────────────────────

pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

pub fn render_xml(entries: &[AuditEntry], generated_at: DateTime<Utc>) -> AuditResult<Vec<u8>> {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "<auditLog generatedAt=\"{}\" count=\"{}\">",
        xml_escape(&ts(&generated_at)),
        entries.len()
    );
    for entry in entries {
        out.push_str("  <entry>\n");
        for (name, value) in FIELDS.iter().zip(field_values(entry)?.iter()) {
            if value.is_empty() {
                let _ = writeln!(out, "    <{name}/>");
            } else {
                let _ = writeln!(out, "    <{name}>{}</{name}>", xml_escape(value));
            }
        }
        out.push_str("  </entry>\n");
    }
    out.push_str("</auditLog>\n");
    Ok(out.into_bytes())
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Who asked for a report and over which window.
pub struct ReportContext<'a> {
    pub requested_by: &'a str,
    pub purpose: &'a str,
    pub window: TimeWindow,
    pub generated_at: DateTime<Utc>,
    pub top_n: usize,
    pub digester: &'a dyn Digester,
}

#[derive(Serialize)]
struct ReportIntegrity {
    algorithm: &'static str,
    checked: usize,
    checksum_failures: Vec<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    title: &'static str,
    requested_by: &'a str,
    purpose: &'a str,
    generated_at: DateTime<Utc>,
    summary: AuditStatistics,
    integrity: ReportIntegrity,
    entries: &'a [AuditEntry],
}

/// JSON report: statistics and per-entry checksum results over the exported
/// set, followed by the entries themselves.
pub fn render_report(entries: &[AuditEntry], ctx: &ReportContext<'_>) -> AuditResult<Vec<u8>> {
    let mut acc = StatisticsAccumulator::new();
    let mut checksum_failures = Vec::new();
    for entry in entries {
        acc.add(entry);
        if compute_checksum(ctx.digester, entry)? != entry.checksum {
            checksum_failures.push(entry.log_id.clone());
        }
    }

    let report = Report {
        title: "Audit Trail Report",
        requested_by: ctx.requested_by,
        purpose: ctx.purpose,
        generated_at: ctx.generated_at,
        summary: acc.finish(ctx.window, ctx.top_n, false),
        integrity: ReportIntegrity {
            algorithm: ctx.digester.algorithm(),
            checked: entries.len(),
            checksum_failures,
        },
        entries,
    };
    Ok(serde_json::to_vec_pretty(&report)?)
}
