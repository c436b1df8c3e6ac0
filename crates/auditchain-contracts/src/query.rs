//! Search filters, time windows, and result pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{AuditEntry, EventStatus, EventType};

/// Inclusive time bounds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// The unbounded window covering the whole chain.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// Order in which `EntryStore::scan` visits entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    /// Append order, oldest first.
    ChainOrder,
    /// Reverse append order.
    NewestFirst,
}

/// Search criteria. All set fields are AND-combined; list fields match when
/// empty or when the entry's value is a member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entity_types: Vec<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub event_types: Vec<EventType>,
    pub entity_id: Option<String>,
    pub is_security_event: Option<bool>,
    pub is_critical_operation: Option<bool>,
    pub compliance_relevant: Option<bool>,
    pub status: Option<EventStatus>,
    /// Case-insensitive substring over action, entity type, username, and
    /// entity id.
    pub search_text: Option<String>,
    #[serde(default)]
    pub offset: usize,
    /// `None` uses the configured default limit.
    pub limit: Option<usize>,
}

impl SearchFilter {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(start),
            end_time: Some(end),
            ..Self::default()
        }
    }
}

/// One page of search results, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub entries: Vec<AuditEntry>,
    /// Number of matching entries before pagination.
    pub total: usize,
}
