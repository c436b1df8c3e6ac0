//! # auditchain-export
//!
//! Compliance exports of the audit log.
//!
//! An [`Exporter`] searches the chain with the request's filter, renders
//! the matching entries as JSON, CSV, XML, or a summary report, and stores
//! the bytes in an [`ArtifactSink`](auditchain_core::traits::ArtifactSink)
//! with an expiry. [`InMemoryArtifactSink`] is the in-process sink.

pub mod exporter;
pub mod formats;
pub mod sink;

pub use exporter::Exporter;
pub use sink::InMemoryArtifactSink;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::{json, Value};

    use auditchain_config::AuditSettings;
    use auditchain_contracts::{
        entry::{AuditEntry, AuditEntryDraft, EventType},
        error::AuditError,
        export::{ExportFormat, ExportRequest},
        query::SearchFilter,
    };
    use auditchain_core::{traits::ArtifactSink, AuditChainStore};
    use auditchain_store::{InMemoryEntryStore, ManualClock, Sha256Digester};

    use super::{formats::csv_escape, formats::xml_escape, Exporter, InMemoryArtifactSink};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()
    }

    struct Fixture {
        chain: Arc<AuditChainStore>,
        sink: Arc<InMemoryArtifactSink>,
        clock: Arc<ManualClock>,
        exporter: Exporter,
    }

    fn fixture(settings: AuditSettings) -> Fixture {
        let clock = Arc::new(ManualClock::new(t0()));
        let chain = Arc::new(AuditChainStore::new(
            Arc::new(InMemoryEntryStore::new()),
            Arc::new(Sha256Digester),
            clock.clone(),
            settings,
        ));
        let sink = Arc::new(InMemoryArtifactSink::new());
        let exporter = Exporter::new(chain.clone(), sink.clone());
        Fixture {
            chain,
            sink,
            clock,
            exporter,
        }
    }

    fn seed(f: &Fixture, n: usize) {
        for i in 0..n {
            f.chain
                .append(
                    AuditEntryDraft::new(
                        EventType::Update,
                        "inventory_item",
                        format!("SKU-{i:03}"),
                        "u-stock",
                        format!("adjusted stock level #{i}"),
                    )
                    .with_after(json!({ "quantity": i }))
                    .compliance_relevant(),
                )
                .unwrap();
            f.clock.advance(Duration::minutes(1));
        }
    }

    fn request(format: ExportFormat) -> ExportRequest {
        ExportRequest {
            requested_by: "auditor@example.com".to_string(),
            purpose: "quarterly review".to_string(),
            filter: SearchFilter::default(),
            format,
        }
    }

    fn fetch(f: &Fixture, uri: &str) -> Vec<u8> {
        f.sink.fetch(uri, f.chain.now()).unwrap()
    }

    /// Minimal RFC 4180 reader for checking rendered CSV.
    fn parse_csv(text: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut quoted = false;
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if quoted {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => quoted = false,
                    other => field.push(other),
                }
                continue;
            }
            match c {
                '"' => quoted = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                other => field.push(other),
            }
        }
        rows
    }

    // ── JSON ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_json_export_round_trips_entries_newest_first() {
        let f = fixture(AuditSettings::default());
        seed(&f, 3);

        let record = f.exporter.export(&request(ExportFormat::Json)).unwrap();
        assert_eq!(record.record_count, 3);
        assert_eq!(record.total_matching, 3);
        assert!(!record.truncated);
        assert_eq!(record.artifact.content_type, "application/json");
        assert!(record.artifact.uri.ends_with(".json"));

        let entries: Vec<AuditEntry> = serde_json::from_slice(&fetch(&f, &record.artifact.uri)).unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["SKU-002", "SKU-001", "SKU-000"]);
    }

    #[test]
    fn test_record_checksum_covers_artifact_bytes() {
        let f = fixture(AuditSettings::default());
        seed(&f, 2);
        let record = f.exporter.export(&request(ExportFormat::Csv)).unwrap();
        let bytes = fetch(&f, &record.artifact.uri);
        assert_eq!(record.checksum, f.chain.digester().digest(&bytes));
        assert_eq!(record.artifact.size_bytes, bytes.len());
    }

    // ── CSV ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_csv_escape_quotes_only_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_csv_export_survives_hostile_free_text() {
        let f = fixture(AuditSettings::default());
        let action = "renamed \"Widget, large\"\r\nto Gadget";
        let username = "O'Brien, \"Pat\"\nsales";
        f.chain
            .append(
                AuditEntryDraft::new(EventType::Update, "product", "P-1", "u-1", action)
                    .with_actor(username, "sales_rep"),
            )
            .unwrap();

        let record = f.exporter.export(&request(ExportFormat::Csv)).unwrap();
        let text = String::from_utf8(fetch(&f, &record.artifact.uri)).unwrap();
        let rows = parse_csv(&text);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 24);
        assert_eq!(rows[1].len(), 24);
        let col = rows[0].iter().position(|h| h == "action").unwrap();
        assert_eq!(rows[1][col], action);
        let col = rows[0].iter().position(|h| h == "username").unwrap();
        assert_eq!(rows[1][col], username);
    }

    // ── XML ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_xml_escape_covers_markup_characters() {
        assert_eq!(
            xml_escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_xml_export_escapes_entry_text() {
        let f = fixture(AuditSettings::default());
        f.chain
            .append(
                AuditEntryDraft::new(
                    EventType::Access,
                    "record",
                    "R<1>",
                    "u-1",
                    "viewed <script>alert(1)</script> & left",
                )
                .with_actor("<b>Tom</b> & \"Jerry's\"", "clerk"),
            )
            .unwrap();

        let record = f.exporter.export(&request(ExportFormat::Xml)).unwrap();
        let text = String::from_utf8(fetch(&f, &record.artifact.uri)).unwrap();
        assert!(text.contains("<auditLog generatedAt="));
        assert!(text.contains("count=\"1\""));
        assert!(text.contains("<entity_id>R&lt;1&gt;</entity_id>"));
        assert!(text.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; left"));
        assert!(!text.contains("<script>"));
        assert!(text.contains(
            "<username>&lt;b&gt;Tom&lt;/b&gt; &amp; &quot;Jerry&apos;s&quot;</username>"
        ));
        assert!(text.contains("<ip_address/>"));
    }

    // ── Report ────────────────────────────────────────────────────────────────

    #[test]
    fn test_report_summarizes_and_checks_exported_entries() {
        let f = fixture(AuditSettings::default());
        seed(&f, 4);
        f.chain
            .append(
                AuditEntryDraft::new(EventType::Login, "session", "S-1", "u-admin", "login")
                    .security_event(),
            )
            .unwrap();

        let record = f.exporter.export(&request(ExportFormat::Report)).unwrap();
        let report: Value = serde_json::from_slice(&fetch(&f, &record.artifact.uri)).unwrap();

        assert_eq!(report["requested_by"], "auditor@example.com");
        assert_eq!(report["purpose"], "quarterly review");
        assert_eq!(report["summary"]["total_entries"], 5);
        assert_eq!(report["summary"]["security_events"], 1);
        assert_eq!(report["summary"]["distinct_users"], 2);
        assert_eq!(report["integrity"]["algorithm"], "sha256");
        assert_eq!(report["integrity"]["checked"], 5);
        assert_eq!(report["integrity"]["checksum_failures"], json!([]));
        assert_eq!(report["entries"].as_array().unwrap().len(), 5);
    }

    // ── Caps and validation ───────────────────────────────────────────────────

    #[test]
    fn test_export_is_capped_and_flags_truncation() {
        let mut settings = AuditSettings::default();
        settings.export.max_records = 3;
        let f = fixture(settings);
        seed(&f, 5);

        let record = f.exporter.export(&request(ExportFormat::Json)).unwrap();
        assert_eq!(record.record_count, 3);
        assert_eq!(record.total_matching, 5);
        assert!(record.truncated);
    }

    #[test]
    fn test_export_applies_the_filter_window() {
        let f = fixture(AuditSettings::default());
        seed(&f, 5);

        let mut req = request(ExportFormat::Json);
        req.filter = SearchFilter::between(t0() + Duration::minutes(1), t0() + Duration::minutes(3));
        let record = f.exporter.export(&req).unwrap();

        assert_eq!(record.record_count, 3);
        assert_eq!(record.start_time, req.filter.start_time);
        assert_eq!(record.end_time, req.filter.end_time);
    }

    #[test]
    fn test_inverted_window_is_rejected_before_anything_is_stored() {
        let f = fixture(AuditSettings::default());
        seed(&f, 2);

        let mut req = request(ExportFormat::Csv);
        req.filter = SearchFilter::between(t0() + Duration::hours(1), t0());
        let err = f.exporter.export(&req).unwrap_err();
        assert!(matches!(err, AuditError::InvalidFilter { .. }));
        assert_eq!(f.sink.purge_expired(t0() + Duration::days(365)).unwrap(), 0);
    }

    // ── Artifact expiry ───────────────────────────────────────────────────────

    #[test]
    fn test_artifact_expires_after_configured_ttl() {
        let f = fixture(AuditSettings::default());
        seed(&f, 1);
        let record = f.exporter.export(&request(ExportFormat::Json)).unwrap();
        assert_eq!(record.expires_at, record.generated_at + Duration::hours(24));

        let before = record.expires_at - Duration::seconds(1);
        assert!(f.sink.fetch(&record.artifact.uri, before).is_ok());

        let err = f.sink.fetch(&record.artifact.uri, record.expires_at).unwrap_err();
        assert!(matches!(err, AuditError::ArtifactUnavailable { .. }));
    }

    #[test]
    fn test_out_of_range_ttl_fails_export_without_storing() {
        let settings = AuditSettings::from_toml_str("[export]\nartifact_ttl_hours = 4000000000\n").unwrap();
        let f = fixture(settings);
        seed(&f, 1);

        let err = f.exporter.export(&request(ExportFormat::Json)).unwrap_err();
        assert!(
            matches!(err, AuditError::ExportFailed { ref reason } if reason.contains("4000000000")),
            "unexpected error: {err}"
        );
        assert_eq!(f.sink.purge_expired(DateTime::<Utc>::MAX_UTC).unwrap(), 0);
    }

    #[test]
    fn test_unknown_artifact_is_unavailable() {
        let sink = InMemoryArtifactSink::new();
        let err = sink.fetch("mem://exports/nope/x.json", t0()).unwrap_err();
        assert!(matches!(err, AuditError::ArtifactUnavailable { reference } if reference.ends_with("x.json")));
    }

    #[test]
    fn test_purge_drops_only_expired_artifacts() {
        let sink = InMemoryArtifactSink::new();
        let keep = sink
            .store("a.json", "application/json", b"[]".to_vec(), t0() + Duration::hours(2))
            .unwrap();
        sink.store("b.json", "application/json", b"[]".to_vec(), t0() + Duration::hours(1))
            .unwrap();

        assert_eq!(sink.purge_expired(t0() + Duration::hours(1)).unwrap(), 1);
        assert!(sink.fetch(&keep.uri, t0()).is_ok());
    }
}
