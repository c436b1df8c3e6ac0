//! # auditchain-config
//!
//! TOML-driven settings for the audit chain: search paging, export and
//! statistics caps, default entry retention, and append retry attempts.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use auditchain_config::AuditSettings;
//!
//! let settings = AuditSettings::from_file(Path::new("config/auditchain.toml"))?;
//! ```

pub mod loader;
pub mod settings;

pub use settings::{
    AppendSettings, AuditSettings, ExportSettings, RetentionSettings, SearchSettings,
    StatisticsSettings,
};

// ── Tests ─────────────────────────────────────────────────────────────────────
