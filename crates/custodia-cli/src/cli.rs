use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "custodia",
    about = "Custodia — tamper-evident chain of custody for digital evidence",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Acting identity for commands that append to the ledger
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Directory holding keys, catalog, payloads, and the ledger journal
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true, default_value = "custodia.toml")]
    pub config: PathBuf,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register new evidence and append its INTAKE event
    Intake(IntakeArgs),
    /// Record a custody event against cataloged evidence
    Record(RecordArgs),
    /// Endorse an earlier event on behalf of your organization
    Endorse(EndorseArgs),
    /// Re-derive an evidence digest and record the check
    Verify(VerifyArgs),
    /// Show the event history for one evidence item
    Timeline(TimelineArgs),
    /// Aggregate compliance report for a case
    Audit(AuditArgs),
    /// Validate the full hash chain
    Health(HealthArgs),
    /// List the registered actors and what they may do
    Actors(ActorsArgs),
    /// Show signing keys and the storage key fingerprint
    Keys(KeysArgs),
}

#[derive(Args)]
pub struct IntakeArgs {
    /// Evidence file to take into custody
    pub file: PathBuf,
    #[arg(long)]
    pub case: String,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub source_device: Option<String>,
    #[arg(long)]
    pub acquisition_method: Option<String>,
}

#[derive(Args)]
pub struct RecordArgs {
    pub evidence: String,
    /// Action type (TRANSFER, ACCESS, ANALYSIS, STORAGE, COURT_SUBMISSION)
    pub action: String,
    /// Purpose for ACCESS events
    #[arg(long)]
    pub purpose: Option<String>,
    /// Releasing organization for TRANSFER events
    #[arg(long)]
    pub from_org: Option<String>,
    /// Receiving organization for TRANSFER events
    #[arg(long)]
    pub to_org: Option<String>,
    /// Free-form detail field as key=value, repeatable
    #[arg(long = "field")]
    pub fields: Vec<String>,
    /// Count your own organization toward the endorsement threshold
    #[arg(long)]
    pub self_endorse: bool,
}

#[derive(Args)]
pub struct EndorseArgs {
    pub evidence: String,
    /// Transaction being endorsed
    pub target: String,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub evidence: String,
}

#[derive(Args)]
pub struct TimelineArgs {
    pub evidence: String,
}

#[derive(Args)]
pub struct AuditArgs {
    pub case: String,
}

#[derive(Args)]
pub struct HealthArgs {}

#[derive(Args)]
pub struct ActorsArgs {}

#[derive(Args)]
pub struct KeysArgs {}
