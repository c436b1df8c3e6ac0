//! auditchain Business Reference Runtime: Demo CLI
//!
//! Runs one or all of the four audit log scenarios. Each scenario uses the
//! real chain store, SHA-256 digester, and exporter wired to mock ERP events.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- tamper-detection
//!   cargo run -p demo -- retention-cleanup
//!   cargo run -p demo -- compliance-export --format csv
//!   cargo run -p demo -- activity-report
//!   cargo run -p demo -- --config config/auditchain.toml run-all

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use auditchain_config::AuditSettings;
use auditchain_contracts::{error::AuditResult, export::ExportFormat};
use auditchain_ref_business::scenarios::{
    activity_report, compliance_export, retention_cleanup, tamper_detection,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// auditchain, a tamper-evident audit log demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "auditchain business reference runtime demo",
    long_about = "Runs auditchain demo scenarios showing hash-chain tamper detection,\n\
                  retention pruning, compliance exports, and activity reporting."
)]
struct Cli {
    /// Settings file (TOML). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: in-place edits and unrecorded deletes are detected.
    TamperDetection,
    /// Scenario 2: retention pruning keeps the chain verifiable.
    RetentionCleanup,
    /// Scenario 3: filtered export with artifact expiry.
    ComplianceExport {
        /// json, csv, xml, or report.
        #[arg(long, default_value = "json")]
        format: ExportFormat,
    },
    /// Scenario 4: history, search, and statistics over a business day.
    ActivityReport,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = load_settings(cli.config.as_ref()).and_then(|settings| {
        print_banner(&settings);
        match cli.command {
            Command::RunAll => run_all(&settings),
            Command::TamperDetection => tamper_detection::run_scenario(&settings),
            Command::RetentionCleanup => retention_cleanup::run_scenario(&settings),
            Command::ComplianceExport { format } => {
                compliance_export::run_scenario(&settings, format)
            }
            Command::ActivityReport => activity_report::run_scenario(&settings),
        }
    });

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> AuditResult<AuditSettings> {
    match path {
        Some(path) => {
            let settings = AuditSettings::from_file(path)?;
            info!(path = %path.display(), "settings loaded");
            Ok(settings)
        }
        None => Ok(AuditSettings::default()),
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all(settings: &AuditSettings) -> AuditResult<()> {
    tamper_detection::run_scenario(settings)?;
    retention_cleanup::run_scenario(settings)?;
    compliance_export::run_scenario(settings, ExportFormat::Report)?;
    activity_report::run_scenario(settings)?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner(settings: &AuditSettings) {
    println!();
    println!("auditchain: Tamper-evident Audit Log");
    println!("Business Reference Demo");
    println!("=====================================");
    println!();
    println!("Every entry commits to its predecessor:");
    println!("  checksum = SHA-256(canonical JSON of all fields but checksum)");
    println!("  previous_checksum = checksum of the entry before it");
    println!();
    println!(
        "Settings: search limit {}/{}, export cap {}, artifact TTL {}h",
        settings.search.default_limit,
        settings.search.max_limit,
        settings.export.max_records,
        settings.export.artifact_ttl_hours
    );
    println!();
}
