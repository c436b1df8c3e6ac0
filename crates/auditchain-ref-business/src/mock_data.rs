//! Simulated business-application events.
//!
//! All data in this module is hardcoded and fictional. Each function returns
//! drafts in the order a running ERP instance would emit them.

use chrono::Duration;
use serde_json::json;

use auditchain_contracts::{
    entry::{AuditEntry, AuditEntryDraft, EventStatus, EventType, FieldChange},
    error::AuditResult,
};
use auditchain_core::AuditChainStore;
use auditchain_store::ManualClock;

const WAREHOUSE_IP: &str = "10.20.4.17";
const OFFICE_IP: &str = "10.20.1.33";
const BROWSER: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";

// ── Inventory ────────────────────────────────────────────────────────────────

pub fn inventory_events() -> Vec<AuditEntryDraft> {
    vec![
        AuditEntryDraft::new(
            EventType::Create,
            "inventory_item",
            "SKU-1042",
            "u-mlopez",
            "Created inventory item 'Pallet jack, 2.5t'",
        )
        .with_actor("m.lopez", "warehouse_clerk")
        .with_session(WAREHOUSE_IP, BROWSER, "sess-wh-01")
        .with_after(json!({ "sku": "SKU-1042", "quantity": 12, "location": "A-03" })),
        AuditEntryDraft::new(
            EventType::Update,
            "inventory_item",
            "SKU-1042",
            "u-mlopez",
            "Adjusted stock after cycle count",
        )
        .with_actor("m.lopez", "warehouse_clerk")
        .with_session(WAREHOUSE_IP, BROWSER, "sess-wh-01")
        .with_before(json!({ "quantity": 12 }))
        .with_after(json!({ "quantity": 9 }))
        .with_changes(vec![FieldChange {
            field: "quantity".to_string(),
            old_value: json!(12),
            new_value: json!(9),
            data_type: "integer".to_string(),
        }]),
    ]
}

// ── Sales ────────────────────────────────────────────────────────────────────

pub fn sales_events() -> Vec<AuditEntryDraft> {
    vec![
        AuditEntryDraft::new(
            EventType::Create,
            "sales_order",
            "SO-2026-0815",
            "u-kchen",
            "Created sales order for Northwind Traders",
        )
        .with_actor("k.chen", "sales_rep")
        .with_session(OFFICE_IP, BROWSER, "sess-of-07")
        .with_after(json!({ "customer": "Northwind Traders", "total": "1840.00", "currency": "EUR" }))
        .compliance_relevant(),
        AuditEntryDraft::new(
            EventType::Update,
            "sales_order",
            "SO-2026-0815",
            "u-kchen",
            "Applied 15% discount, approved by manager",
        )
        .with_actor("k.chen", "sales_rep")
        .with_session(OFFICE_IP, BROWSER, "sess-of-07")
        .with_changes(vec![FieldChange {
            field: "total".to_string(),
            old_value: json!("1840.00"),
            new_value: json!("1564.00"),
            data_type: "decimal".to_string(),
        }])
        .critical_operation()
        .compliance_relevant(),
        AuditEntryDraft::new(
            EventType::Export,
            "sales_order",
            "SO-2026-0815",
            "u-kchen",
            "Exported invoice PDF",
        )
        .with_actor("k.chen", "sales_rep"),
    ]
}

// ── Medical records ──────────────────────────────────────────────────────────

/// Occupational-health records kept by the HR clinic module.
pub fn medical_record_events() -> Vec<AuditEntryDraft> {
    vec![
        AuditEntryDraft::new(
            EventType::Access,
            "medical_record",
            "MR-00311",
            "u-dr-okafor",
            "Viewed occupational health record",
        )
        .with_actor("dr.okafor", "company_physician")
        .with_session(OFFICE_IP, BROWSER, "sess-clinic-02")
        .security_event()
        .compliance_relevant(),
        AuditEntryDraft::new(
            EventType::Access,
            "medical_record",
            "MR-00311",
            "u-jsmith",
            "Attempted to view occupational health record",
        )
        .with_actor("j.smith", "hr_generalist")
        .with_session(OFFICE_IP, BROWSER, "sess-of-12")
        .with_status(EventStatus::Failure)
        .security_event()
        .compliance_relevant(),
    ]
}

// ── HR ───────────────────────────────────────────────────────────────────────

pub fn hr_events() -> Vec<AuditEntryDraft> {
    vec![
        AuditEntryDraft::new(EventType::Login, "session", "sess-of-12", "u-jsmith", "Signed in")
            .with_actor("j.smith", "hr_generalist")
            .with_session(OFFICE_IP, BROWSER, "sess-of-12")
            .security_event(),
        AuditEntryDraft::new(
            EventType::Update,
            "employee",
            "EMP-0451",
            "u-jsmith",
            "Changed salary band",
        )
        .with_actor("j.smith", "hr_generalist")
        .with_session(OFFICE_IP, BROWSER, "sess-of-12")
        .with_changes(vec![FieldChange {
            field: "salary_band".to_string(),
            old_value: json!("B2"),
            new_value: json!("B3"),
            data_type: "string".to_string(),
        }])
        .critical_operation()
        .compliance_relevant(),
        AuditEntryDraft::new(
            EventType::Delete,
            "employee",
            "EMP-0388",
            "u-jsmith",
            "Removed terminated employee profile",
        )
        .with_actor("j.smith", "hr_generalist")
        .with_before(json!({ "employee_id": "EMP-0388", "status": "terminated" }))
        .critical_operation()
        .compliance_relevant(),
        AuditEntryDraft::new(EventType::Logout, "session", "sess-of-12", "u-jsmith", "Signed out")
            .with_actor("j.smith", "hr_generalist")
            .security_event(),
    ]
}

// ── Supplier compliance ──────────────────────────────────────────────────────

pub fn supplier_events() -> Vec<AuditEntryDraft> {
    vec![
        AuditEntryDraft::new(
            EventType::Other("certificate_upload".to_string()),
            "supplier",
            "SUP-077",
            "u-apatel",
            "Uploaded ISO 9001 certificate for Acme Fasteners",
        )
        .with_actor("a.patel", "procurement")
        .with_after(json!({ "certificate": "ISO 9001:2015", "valid_until": "2028-03-31" }))
        .compliance_relevant(),
        AuditEntryDraft::new(
            EventType::Update,
            "supplier",
            "SUP-077",
            "u-apatel",
            "Supplier compliance review marked partial",
        )
        .with_actor("a.patel", "procurement")
        .with_status(EventStatus::Partial)
        .compliance_relevant(),
    ]
}

/// Every event above, interleaved roughly as one working day.
pub fn business_day() -> Vec<AuditEntryDraft> {
    let mut day = Vec::new();
    day.extend(hr_events().into_iter().take(1));
    day.extend(inventory_events());
    day.extend(sales_events());
    day.extend(medical_record_events());
    day.extend(hr_events().into_iter().skip(1));
    day.extend(supplier_events());
    day
}

/// Append `drafts` in order, advancing `clock` by `step` after each one.
pub fn record_all(
    chain: &AuditChainStore,
    clock: &ManualClock,
    drafts: Vec<AuditEntryDraft>,
    step: Duration,
) -> AuditResult<Vec<AuditEntry>> {
    let mut stored = Vec::with_capacity(drafts.len());
    for draft in drafts {
        stored.push(chain.append_with_retry(draft)?);
        clock.advance(step);
    }
    Ok(stored)
}
