//! # auditchain-ref-business
//!
//! Business-application reference runtime for the auditchain audit log.
//!
//! Demonstrates four scenarios over mock events from an ERP-style system:
//!
//! 1. **Tamper Detection**: in-place edits and an unrecorded deletion of
//!    stored entries are caught by chain verification.
//! 2. **Retention Cleanup**: aged entries are pruned while compliance
//!    entries survive and the chain still verifies.
//! 3. **Compliance Export**: a filtered export rendered in each format,
//!    with artifact expiry.
//! 4. **Activity Report**: search, entity and user history, and statistics
//!    over a business day.
//!
//! All data is hardcoded and fictional.

pub mod mock_data;
pub mod scenarios;
