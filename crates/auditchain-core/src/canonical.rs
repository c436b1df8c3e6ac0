//! Canonical entry encoding and checksum computation.
//!
//! The checksum input is the compact JSON encoding of `CanonicalEntry`:
//! every `AuditEntry` field except `checksum`, in declaration order, with
//! all object keys inside snapshot values sorted.
//!
//! Every field that contributes to an entry's checksum is listed explicitly
//! so nothing is accidentally omitted. `previous_checksum` is part of the
//! input, which is what chains each entry to its predecessor.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use auditchain_contracts::{
    entry::{AuditEntry, EventStatus, EventType, FieldChange},
    error::AuditResult,
};

use crate::traits::Digester;

#[derive(Serialize)]
struct CanonicalEntry<'a> {
    id: &'a str,
    log_id: &'a str,
    timestamp: &'a DateTime<Utc>,
    created_at: &'a DateTime<Utc>,
    event_type: &'a EventType,
    entity_type: &'a str,
    entity_id: &'a str,
    user_id: &'a str,
    username: &'a str,
    user_role: &'a str,
    ip_address: Option<&'a str>,
    user_agent: Option<&'a str>,
    session_id: Option<&'a str>,
    action: &'a str,
    before_data: Option<Value>,
    after_data: Option<Value>,
    changes: Option<Vec<CanonicalChange<'a>>>,
    is_security_event: bool,
    is_critical_operation: bool,
    compliance_relevant: bool,
    status: EventStatus,
    previous_checksum: Option<&'a str>,
    retention_period: u32,
}

#[derive(Serialize)]
struct CanonicalChange<'a> {
    field: &'a str,
    old_value: Value,
    new_value: Value,
    data_type: &'a str,
}

impl<'a> CanonicalChange<'a> {
    fn from_change(change: &'a FieldChange) -> Self {
        Self {
            field: &change.field,
            old_value: sorted_value(&change.old_value),
            new_value: sorted_value(&change.new_value),
            data_type: &change.data_type,
        }
    }
}

/// Rebuild `value` with object keys inserted in sorted order, so the
/// encoding does not depend on the map implementation serde_json uses.
fn sorted_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sorted_value(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_value).collect()),
        other => other.clone(),
    }
}

/// The exact bytes fed to the digester for `entry`.
pub fn canonical_bytes(entry: &AuditEntry) -> AuditResult<Vec<u8>> {
    let canonical = CanonicalEntry {
        id: &entry.id,
        log_id: &entry.log_id,
        timestamp: &entry.timestamp,
        created_at: &entry.created_at,
        event_type: &entry.event_type,
        entity_type: &entry.entity_type,
        entity_id: &entry.entity_id,
        user_id: &entry.user_id,
        username: &entry.username,
        user_role: &entry.user_role,
        ip_address: entry.ip_address.as_deref(),
        user_agent: entry.user_agent.as_deref(),
        session_id: entry.session_id.as_deref(),
        action: &entry.action,
        before_data: entry.before_data.as_ref().map(sorted_value),
        after_data: entry.after_data.as_ref().map(sorted_value),
        changes: entry
            .changes
            .as_ref()
            .map(|changes| changes.iter().map(CanonicalChange::from_change).collect()),
        is_security_event: entry.is_security_event,
        is_critical_operation: entry.is_critical_operation,
        compliance_relevant: entry.compliance_relevant,
        status: entry.status,
        previous_checksum: entry.previous_checksum.as_deref(),
        retention_period: entry.retention_period,
    };
    Ok(serde_json::to_vec(&canonical)?)
}

/// Compute the checksum `entry` should carry. The stored `checksum` field is
/// ignored.
pub fn compute_checksum(digester: &dyn Digester, entry: &AuditEntry) -> AuditResult<String> {
    let bytes = canonical_bytes(entry)?;
    Ok(digester.digest(&bytes))
}
