//! Loading and validating `AuditSettings`.

use std::path::Path;

use tracing::debug;

use auditchain_contracts::error::{AuditError, AuditResult};

use crate::settings::AuditSettings;

impl AuditSettings {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `AuditError::ConfigError` if the TOML is malformed, does not
    /// match the schema, or fails [`AuditSettings::validate`].
    pub fn from_toml_str(s: &str) -> AuditResult<Self> {
        let settings: AuditSettings = toml::from_str(s).map_err(|e| AuditError::ConfigError {
            reason: format!("failed to parse settings TOML: {}", e),
        })?;
        settings.validate()?;
        debug!(
            default_limit = settings.search.default_limit,
            export_cap = settings.export.max_records,
            "audit settings loaded"
        );
        Ok(settings)
    }

    /// Read the file at `path` and parse it as TOML settings.
    pub fn from_file(path: &Path) -> AuditResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AuditError::ConfigError {
            reason: format!("failed to read settings file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject zero limits and a default page larger than the maximum page.
    pub fn validate(&self) -> AuditResult<()> {
        let positive = [
            ("search.default_limit", self.search.default_limit as u64),
            ("search.max_limit", self.search.max_limit as u64),
            ("export.max_records", self.export.max_records as u64),
            ("export.artifact_ttl_hours", u64::from(self.export.artifact_ttl_hours)),
            ("statistics.max_records", self.statistics.max_records as u64),
            ("statistics.top_n", self.statistics.top_n as u64),
            (
                "retention.default_entry_retention_days",
                u64::from(self.retention.default_entry_retention_days),
            ),
            ("append.max_attempts", u64::from(self.append.max_attempts)),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(AuditError::ConfigError {
                reason: format!("'{}' must be greater than zero", name),
            });
        }

        if self.search.default_limit > self.search.max_limit {
            return Err(AuditError::ConfigError {
                reason: format!(
                    "search.default_limit ({}) exceeds search.max_limit ({})",
                    self.search.default_limit, self.search.max_limit
                ),
            });
        }
        Ok(())
    }
}
