//! Settings schema.
//!
//! `AuditSettings` is deserialized from TOML. Every section and every field
//! has a default, so an empty document yields `AuditSettings::default()`.
//!
//! Example:
//! ```toml
//! [search]
//! default_limit = 50
//!
//! [export]
//! artifact_ttl_hours = 4
//! ```

use serde::{Deserialize, Serialize};

/// Paging limits applied by `Search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Page size used when a filter does not set `limit`.
    pub default_limit: usize,
    /// Requested limits above this are clamped.
    pub max_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Most entries a single export may contain.
    pub max_records: usize,
    /// Lifetime of a generated artifact.
    pub artifact_ttl_hours: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            max_records: 10_000,
            artifact_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsSettings {
    /// Most entries aggregated per call.
    pub max_records: usize,
    /// Length of each top-N list.
    pub top_n: usize,
}

impl Default for StatisticsSettings {
    fn default() -> Self {
        Self {
            max_records: 50_000,
            top_n: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    /// `retention_period` stamped on entries whose draft leaves it unset.
    pub default_entry_retention_days: u32,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        // Seven years.
        Self {
            default_entry_retention_days: 2555,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppendSettings {
    /// Attempts made by `append_with_retry` before surfacing a chain race.
    pub max_attempts: u32,
}

impl Default for AppendSettings {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// The top-level structure deserialized from a settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    pub search: SearchSettings,
    pub export: ExportSettings,
    pub statistics: StatisticsSettings,
    pub retention: RetentionSettings,
    pub append: AppendSettings,
}
