//! Audit entries and the drafts callers submit to create them.
//!
//! `AuditEntry` is immutable once written. `AuditEntryDraft` carries every
//! caller-supplied field; the chain store fills in identifiers, timestamps,
//! and the two checksums.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of event an entry records.
///
/// Open enum: the well-known kinds have their own variants, anything else is
/// carried verbatim in `Other`. Serialized as its spelling, which is also
/// what equality and hashing compare, so `Other("DELETE")` equals `Delete`
/// and every value survives a serde round-trip unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Create,
    Update,
    Delete,
    Access,
    Export,
    Login,
    Logout,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Create => "CREATE",
            EventType::Update => "UPDATE",
            EventType::Delete => "DELETE",
            EventType::Access => "ACCESS",
            EventType::Export => "EXPORT",
            EventType::Login => "LOGIN",
            EventType::Logout => "LOGOUT",
            EventType::Other(s) => s,
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        let known = [
            EventType::Create,
            EventType::Update,
            EventType::Delete,
            EventType::Access,
            EventType::Export,
            EventType::Login,
            EventType::Logout,
        ];
        // Exact spelling only: "Delete" stays Other("Delete").
        known
            .into_iter()
            .find(|k| k.as_str() == s)
            .unwrap_or_else(|| EventType::Other(s.to_string()))
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for EventType {}

impl std::hash::Hash for EventType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(self.as_str(), state);
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        EventType::from(s.as_str())
    }
}

impl From<EventType> for String {
    fn from(e: EventType) -> Self {
        e.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Success,
    Failure,
    Partial,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Success => "success",
            EventStatus::Failure => "failure",
            EventStatus::Partial => "partial",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level difference between `before_data` and `after_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    /// Caller-declared type of the field (`"string"`, `"decimal"`, ...).
    pub data_type: String,
}

/// One tamper-evident entry in the audit chain.
///
/// `checksum` commits to the entry's content and to `previous_checksum`, so
/// editing any hashed field or unlinking an entry is detectable by
/// `AuditChainStore::verify_integrity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Opaque unique identifier (UUID v4).
    pub id: String,

    /// Human-readable sequence identifier, `AUD-<yyyyMMddHHmmssSSS>-<suffix>`.
    pub log_id: String,

    /// Chain instant. Non-decreasing in append order.
    pub timestamp: DateTime<Utc>,

    /// Wall-clock time the store accepted the entry.
    pub created_at: DateTime<Utc>,

    pub event_type: EventType,
    pub entity_type: String,
    pub entity_id: String,

    pub user_id: String,
    pub username: String,
    pub user_role: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,

    /// Human-readable description of what happened.
    pub action: String,

    pub before_data: Option<Value>,
    pub after_data: Option<Value>,
    pub changes: Option<Vec<FieldChange>>,

    pub is_security_event: bool,
    pub is_critical_operation: bool,
    pub compliance_relevant: bool,

    pub status: EventStatus,

    /// Hex digest over the canonical content of this entry.
    pub checksum: String,

    /// `checksum` of the previous entry in append order; `None` only for
    /// the first entry of the chain.
    pub previous_checksum: Option<String>,

    /// Days this entry must be preserved.
    pub retention_period: u32,
}

/// Caller-supplied content of a new audit entry.
///
/// Build with [`AuditEntryDraft::new`] and the `with_*` helpers:
///
/// ```rust
/// use auditchain_contracts::entry::{AuditEntryDraft, EventType};
///
/// let draft = AuditEntryDraft::new(EventType::Update, "invoice", "INV-1001", "user-7", "Voided invoice")
///     .with_actor("j.doe", "accountant")
///     .critical_operation();
/// assert!(draft.is_critical_operation);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntryDraft {
    pub event_type: EventType,
    pub entity_type: String,
    pub entity_id: String,
    pub user_id: String,
    pub username: String,
    pub user_role: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub action: String,
    pub before_data: Option<Value>,
    pub after_data: Option<Value>,
    pub changes: Option<Vec<FieldChange>>,
    pub is_security_event: bool,
    pub is_critical_operation: bool,
    pub compliance_relevant: bool,
    pub status: EventStatus,
    /// Falls back to the configured default when `None`.
    pub retention_period: Option<u32>,
}

impl AuditEntryDraft {
    pub fn new(
        event_type: EventType,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        user_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            event_type,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            username: user_id.clone(),
            user_id,
            user_role: String::new(),
            ip_address: None,
            user_agent: None,
            session_id: None,
            action: action.into(),
            before_data: None,
            after_data: None,
            changes: None,
            is_security_event: false,
            is_critical_operation: false,
            compliance_relevant: false,
            status: EventStatus::Success,
            retention_period: None,
        }
    }

    pub fn with_actor(mut self, username: impl Into<String>, user_role: impl Into<String>) -> Self {
        self.username = username.into();
        self.user_role = user_role.into();
        self
    }

    pub fn with_session(
        mut self,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        self.ip_address = Some(ip_address.into());
        self.user_agent = Some(user_agent.into());
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_before(mut self, before: Value) -> Self {
        self.before_data = Some(before);
        self
    }

    pub fn with_after(mut self, after: Value) -> Self {
        self.after_data = Some(after);
        self
    }

    pub fn with_changes(mut self, changes: Vec<FieldChange>) -> Self {
        self.changes = Some(changes);
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_retention_period(mut self, days: u32) -> Self {
        self.retention_period = Some(days);
        self
    }

    pub fn security_event(mut self) -> Self {
        self.is_security_event = true;
        self
    }

    pub fn critical_operation(mut self) -> Self {
        self.is_critical_operation = true;
        self
    }

    pub fn compliance_relevant(mut self) -> Self {
        self.compliance_relevant = true;
        self
    }
}
