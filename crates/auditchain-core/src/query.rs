//! Filter validation and matching.

use chrono::{DateTime, Utc};

use auditchain_contracts::{
    entry::AuditEntry,
    error::{AuditError, AuditResult},
    query::{SearchFilter, TimeWindow},
};

/// Reject a window whose start lies after its end.
pub fn validate_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> AuditResult<TimeWindow> {
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(AuditError::InvalidFilter {
                reason: format!("start time {} is after end time {}", s.to_rfc3339(), e.to_rfc3339()),
            });
        }
    }
    Ok(TimeWindow::new(start, end))
}

/// A validated `SearchFilter` ready to test entries against.
pub struct EntryMatcher<'f> {
    filter: &'f SearchFilter,
    window: TimeWindow,
    needle: Option<String>,
}

impl<'f> EntryMatcher<'f> {
    pub fn new(filter: &'f SearchFilter) -> AuditResult<Self> {
        let window = validate_window(filter.start_time, filter.end_time)?;
        if filter.limit == Some(0) {
            return Err(AuditError::InvalidFilter {
                reason: "limit must be greater than zero".to_string(),
            });
        }
        let needle = filter
            .search_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        Ok(Self {
            filter,
            window,
            needle,
        })
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        let f = self.filter;

        if !self.window.contains(entry.timestamp) {
            return false;
        }
        if !f.entity_types.is_empty() && !f.entity_types.iter().any(|t| *t == entry.entity_type) {
            return false;
        }
        if !f.user_ids.is_empty() && !f.user_ids.iter().any(|u| *u == entry.user_id) {
            return false;
        }
        if !f.event_types.is_empty() && !f.event_types.contains(&entry.event_type) {
            return false;
        }
        if f.entity_id.as_deref().is_some_and(|id| id != entry.entity_id) {
            return false;
        }
        if f.is_security_event.is_some_and(|v| v != entry.is_security_event) {
            return false;
        }
        if f.is_critical_operation.is_some_and(|v| v != entry.is_critical_operation) {
            return false;
        }
        if f.compliance_relevant.is_some_and(|v| v != entry.compliance_relevant) {
            return false;
        }
        if f.status.is_some_and(|s| s != entry.status) {
            return false;
        }

        match &self.needle {
            None => true,
            Some(needle) => [
                entry.action.as_str(),
                entry.entity_type.as_str(),
                entry.username.as_str(),
                entry.entity_id.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(needle.as_str())),
        }
    }
}
