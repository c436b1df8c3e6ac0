//! Export requests and the metadata recorded for each generated artifact.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::AuditError, query::SearchFilter};

/// Serialization format of an export artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// JSON array of entry records.
    Json,
    /// RFC 4180 delimited text with a header row.
    Csv,
    /// `<auditLog>` markup tree.
    Xml,
    /// JSON report: summary block plus entries.
    Report,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Report => "report",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::Report => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::Report => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xml => "application/xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            "report" | "pdf" => Ok(ExportFormat::Report),
            other => Err(AuditError::ExportFailed {
                reason: format!("unknown export format '{other}'"),
            }),
        }
    }
}

/// What to export, for whom, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub requested_by: String,
    pub purpose: String,
    pub filter: SearchFilter,
    pub format: ExportFormat,
}

/// Handle returned by an artifact sink for stored export bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub uri: String,
    pub content_type: String,
    pub size_bytes: usize,
}

/// Metadata recorded for one generated export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: String,
    pub requested_by: String,
    pub purpose: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Entries written to the artifact.
    pub record_count: usize,
    /// Entries that matched before the export cap was applied.
    pub total_matching: usize,
    pub truncated: bool,
    pub format: ExportFormat,
    pub artifact: ArtifactRef,
    /// Hex digest of the artifact bytes.
    pub checksum: String,
    pub generated_at: DateTime<Utc>,
    /// The artifact must not be served after this instant.
    pub expires_at: DateTime<Utc>,
}
