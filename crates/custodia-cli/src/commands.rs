use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use custodia_crypto::{DirKeyring, EventSigner, EvidenceCipher};
use custodia_ledger::{EventJournal, JournalConfig, SyncMode};
use custodia_sdk::{
    ActionType, Actor, ActorId, CaseId, ComplianceStatus, Custodia, EventDetails, EventRequest,
    EvidenceId, IntakeRequest, OrgId, Role, TxId,
};
use custodia_store::{FsCatalog, FsPayloadStore};

use crate::cli::*;
use crate::config::CliConfig;

/// The standard organizational roster. The directory is in-memory, so it
/// is re-seeded on every invocation; signing keys persist on disk and are
/// only generated the first time an actor is seen.
const ROSTER: &[(&str, Role, &str)] = &[
    ("officer1", Role::Officer, "KPS"),
    ("analyst1", Role::Analyst, "FORENSIC_LAB"),
    ("supervisor1", Role::Supervisor, "KPS"),
    ("prosecutor1", Role::Prosecutor, "ODPP"),
    ("judge1", Role::Judge, "JUDICIARY"),
    ("auditor1", Role::Auditor, "INTERNAL_AUDIT"),
];

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(&cli.config)?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let svc = open_service(&data_dir, &config)?;
    let format = cli.format;
    let actor = cli.actor;

    match cli.command {
        Command::Intake(args) => cmd_intake(&svc, &format, acting_identity(&actor, &config)?, args),
        Command::Record(args) => cmd_record(&svc, &format, acting_identity(&actor, &config)?, args),
        Command::Endorse(args) => {
            cmd_endorse(&svc, &format, acting_identity(&actor, &config)?, args)
        }
        Command::Verify(args) => cmd_verify(&svc, &format, acting_identity(&actor, &config)?, args),
        Command::Timeline(args) => cmd_timeline(&svc, &format, args),
        Command::Audit(args) => cmd_audit(&svc, &format, args),
        Command::Health(_) => cmd_health(&svc, &format),
        Command::Actors(_) => cmd_actors(&svc, &format),
        Command::Keys(_) => cmd_keys(&svc, &format),
    }
}

/// Assemble the durable service: file keyring, persisted storage key,
/// filesystem catalog and payload store, journal-backed ledger.
fn open_service(data_dir: &Path, config: &CliConfig) -> anyhow::Result<Custodia> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let signer: Arc<dyn EventSigner> = Arc::new(DirKeyring::open(data_dir.join("keys"))?);
    let cipher = storage_cipher(&data_dir.join("storage.key"))?;
    let catalog = Arc::new(FsCatalog::open(data_dir.join("catalog"))?);
    let payloads = Arc::new(FsPayloadStore::open(data_dir.join("payloads"))?);
    let sync_mode = if config.sync_every_write {
        SyncMode::EveryWrite
    } else {
        SyncMode::OsDefault
    };
    let journal = EventJournal::open(&data_dir.join("ledger.journal"), JournalConfig { sync_mode })?;

    let svc = Custodia::open(signer, cipher, catalog, payloads, Some(journal))?;
    for (id, role, org) in ROSTER {
        svc.register_actor(Actor::new(ActorId::new(*id), *role, OrgId::new(*org)))?;
    }
    debug!(data_dir = %data_dir.display(), "custody service opened");
    Ok(svc)
}

/// Load the storage key from `path`, generating and persisting a fresh one
/// on first use.
fn storage_cipher(path: &Path) -> anyhow::Result<EvidenceCipher> {
    if path.exists() {
        let hex_key = fs::read_to_string(path)
            .with_context(|| format!("reading storage key {}", path.display()))?;
        return Ok(EvidenceCipher::from_hex(&hex_key)?);
    }
    let (cipher, key) = EvidenceCipher::generate();
    fs::write(path, hex::encode(key))
        .with_context(|| format!("writing storage key {}", path.display()))?;
    Ok(cipher)
}

fn acting_identity(cli_actor: &Option<String>, config: &CliConfig) -> anyhow::Result<ActorId> {
    cli_actor
        .clone()
        .or_else(|| config.default_actor.clone())
        .map(ActorId::new)
        .context("no acting identity; pass --actor or set default_actor in the config file")
}

fn parse_evidence_id(s: &str) -> anyhow::Result<EvidenceId> {
    let uuid = uuid::Uuid::parse_str(s).with_context(|| format!("invalid evidence id {s:?}"))?;
    Ok(EvidenceId::from_uuid(uuid))
}

fn parse_tx_id(s: &str) -> anyhow::Result<TxId> {
    let uuid = uuid::Uuid::parse_str(s).with_context(|| format!("invalid transaction id {s:?}"))?;
    Ok(TxId::from_uuid(uuid))
}

/// Detail payload for a `record` invocation. TRANSFER and ACCESS have
/// fixed shapes; everything else carries the free-form `--field` pairs.
fn event_details(action: ActionType, args: &RecordArgs) -> anyhow::Result<EventDetails> {
    match action {
        ActionType::Transfer => {
            let (Some(from), Some(to)) = (&args.from_org, &args.to_org) else {
                bail!("TRANSFER needs --from-org and --to-org");
            };
            Ok(EventDetails::Transfer {
                from_org: OrgId::new(from.clone()),
                to_org: OrgId::new(to.clone()),
            })
        }
        ActionType::Access => Ok(EventDetails::Access {
            purpose: args
                .purpose
                .clone()
                .unwrap_or_else(|| "unspecified".to_string()),
        }),
        _ => {
            let mut fields = BTreeMap::new();
            for field in &args.fields {
                let (key, value) = field
                    .split_once('=')
                    .with_context(|| format!("field {field:?} is not key=value"))?;
                fields.insert(key.to_string(), serde_json::Value::from(value));
            }
            Ok(EventDetails::note(fields))
        }
    }
}

fn emit_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn endorsement_line(status: &custodia_sdk::EndorsementStatus) -> String {
    let verdict = if status.is_final() {
        "FINAL".green()
    } else {
        "PENDING".yellow()
    };
    let orgs: Vec<&str> = status.unique_orgs.iter().map(|o| o.as_str()).collect();
    if orgs.is_empty() {
        format!("{} (0/{} orgs)", verdict, status.required)
    } else {
        format!(
            "{} ({}/{} orgs: {})",
            verdict,
            orgs.len(),
            status.required,
            orgs.join(", ")
        )
    }
}

fn cmd_intake(
    svc: &Custodia,
    format: &OutputFormat,
    actor: ActorId,
    args: IntakeArgs,
) -> anyhow::Result<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("reading evidence file {}", args.file.display()))?;
    let file_name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .context("evidence file has no usable name")?
        .to_string();

    let mut request = IntakeRequest::new(
        actor,
        CaseId::new(args.case),
        args.description,
        file_name,
        bytes,
    );
    if let Some(device) = args.source_device {
        request = request.with_source_device(device);
    }
    if let Some(method) = args.acquisition_method {
        request = request.with_acquisition_method(method);
    }

    let receipt = svc.intake(request)?;
    if matches!(format, OutputFormat::Json) {
        return emit_json(&receipt);
    }
    println!("{} Evidence registered", "✓".green().bold());
    println!("  Evidence: {}", receipt.evidence_id.to_string().yellow());
    println!("  Case: {}", receipt.case_id.to_string().bold());
    println!("  SHA-256: {}", receipt.canonical_sha256.to_hex().cyan());
    println!("  Stored at: {}", receipt.location);
    println!("  Transaction: {}", receipt.tx_id.short_id().dimmed());
    Ok(())
}

fn cmd_record(
    svc: &Custodia,
    format: &OutputFormat,
    actor: ActorId,
    args: RecordArgs,
) -> anyhow::Result<()> {
    let evidence_id = parse_evidence_id(&args.evidence)?;
    let action: ActionType = args.action.parse()?;
    let details = event_details(action, &args)?;

    let mut request = EventRequest::new(actor, evidence_id, action, details);
    if args.self_endorse {
        request = request.self_endorsed();
    }

    let receipt = svc.record_event(request)?;
    if matches!(format, OutputFormat::Json) {
        return emit_json(&receipt);
    }
    println!("{} {} recorded", "✓".green().bold(), receipt.action);
    println!("  Transaction: {}", receipt.tx_id.to_string().yellow());
    println!("  Endorsement: {}", endorsement_line(&receipt.endorsement));
    Ok(())
}

fn cmd_endorse(
    svc: &Custodia,
    format: &OutputFormat,
    actor: ActorId,
    args: EndorseArgs,
) -> anyhow::Result<()> {
    let evidence_id = parse_evidence_id(&args.evidence)?;
    let target = parse_tx_id(&args.target)?;

    let receipt = svc.record_endorsement(&actor, evidence_id, target)?;
    if matches!(format, OutputFormat::Json) {
        return emit_json(&receipt);
    }
    println!("{} Endorsement recorded", "✓".green().bold());
    println!("  Target: {}", receipt.target_tx_id.short_id().yellow());
    println!(
        "  Target endorsement: {}",
        endorsement_line(&receipt.target_endorsement)
    );
    Ok(())
}

fn cmd_verify(
    svc: &Custodia,
    format: &OutputFormat,
    actor: ActorId,
    args: VerifyArgs,
) -> anyhow::Result<()> {
    let evidence_id = parse_evidence_id(&args.evidence)?;

    let report = svc.verify_integrity(&actor, evidence_id)?;
    if matches!(format, OutputFormat::Json) {
        return emit_json(&report);
    }
    if report.integrity_ok {
        println!("{} Integrity verified", "✓".green().bold());
    } else {
        println!("{} INTEGRITY FAILURE", "✗".red().bold());
    }
    println!("  Expected: {}", report.expected_sha256.to_hex());
    println!("  Actual:   {}", report.actual_sha256.to_hex());
    println!("  Recorded as: {}", report.tx_id.short_id().dimmed());
    Ok(())
}

fn cmd_timeline(svc: &Custodia, format: &OutputFormat, args: TimelineArgs) -> anyhow::Result<()> {
    let evidence_id = parse_evidence_id(&args.evidence)?;
    let entries = svc.timeline(&evidence_id)?;
    if matches!(format, OutputFormat::Json) {
        return emit_json(&entries);
    }

    println!(
        "Timeline for {} — {} event(s)",
        evidence_id.to_string().yellow(),
        entries.len()
    );
    for entry in &entries {
        println!(
            "{}  {}  {}",
            entry.event.tx_id.short_id().yellow(),
            entry.event.action.to_string().bold(),
            entry
                .event
                .recorded_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
        println!("  Actor: {}", entry.event.actor);
        println!("  Endorsement: {}", endorsement_line(&entry.endorsement));
        if let Some(digest) = &entry.event.presented_sha256 {
            println!("  Presented SHA-256: {}", digest.short_id().cyan());
        }
    }
    Ok(())
}

fn cmd_audit(svc: &Custodia, format: &OutputFormat, args: AuditArgs) -> anyhow::Result<()> {
    let audit = svc.case_audit(&CaseId::new(args.case))?;
    if matches!(format, OutputFormat::Json) {
        return emit_json(&audit);
    }

    println!(
        "Case {} — {} evidence item(s), {} event(s)",
        audit.case_id.to_string().bold(),
        audit.evidence_count,
        audit.total_events
    );
    let chain = if audit.chain_valid {
        "valid".green()
    } else {
        "INVALID".red().bold()
    };
    println!("  Chain: {}", chain);
    println!("  Pending endorsements: {}", audit.pending_endorsements);
    println!("  Integrity failures: {}", audit.integrity_failures);
    println!(
        "  Compliant: {}/{}",
        audit.compliant_evidence_count, audit.evidence_count
    );
    for row in &audit.evidence_audits {
        let verdict = match row.compliance {
            ComplianceStatus::Compliant => "COMPLIANT".green(),
            ComplianceStatus::AttentionRequired => "ATTENTION_REQUIRED".yellow(),
        };
        println!(
            "  {}  {}  {} event(s)  {}",
            row.evidence_id.short_id().yellow(),
            row.file_name,
            row.event_count,
            verdict
        );
    }
    Ok(())
}

fn cmd_health(svc: &Custodia, format: &OutputFormat) -> anyhow::Result<()> {
    let health = svc.chain_health()?;
    if matches!(format, OutputFormat::Json) {
        return emit_json(&health);
    }

    if health.chain.valid {
        println!(
            "{} Chain valid — {} event(s), {} evidence item(s)",
            "✓".green().bold(),
            health.chain.event_count,
            health.evidence_count
        );
    } else {
        println!("{} CHAIN INVALID", "✗".red().bold());
        if let Some(index) = health.chain.first_invalid_index {
            println!("  First invalid event: {}", index);
        }
        if let Some(reason) = &health.chain.reason {
            println!("  Reason: {}", reason);
        }
    }
    Ok(())
}

fn cmd_actors(svc: &Custodia, format: &OutputFormat) -> anyhow::Result<()> {
    let actors = svc.actors();
    if matches!(format, OutputFormat::Json) {
        return emit_json(&actors);
    }

    for actor in &actors {
        println!(
            "{}  {} @ {}",
            actor.actor_id.to_string().bold(),
            actor.role.to_string().cyan(),
            actor.org.to_string().yellow()
        );
        let permitted: Vec<&str> = svc
            .policy()
            .permitted_actions(actor.role)
            .iter()
            .map(|a| a.as_str())
            .collect();
        println!("  May originate: {}", permitted.join(", "));
    }
    Ok(())
}

#[derive(Serialize)]
struct KeyListing {
    storage_key_fingerprint: String,
    signing_keys: Vec<ActorKeyRow>,
}

#[derive(Serialize)]
struct ActorKeyRow {
    actor_id: String,
    public_key: String,
}

fn cmd_keys(svc: &Custodia, format: &OutputFormat) -> anyhow::Result<()> {
    let mut signing_keys = Vec::new();
    for actor in svc.actors() {
        let key = svc.actor_key(&actor.actor_id)?;
        signing_keys.push(ActorKeyRow {
            actor_id: actor.actor_id.to_string(),
            public_key: key.to_hex(),
        });
    }
    let listing = KeyListing {
        storage_key_fingerprint: svc.key_fingerprint().to_string(),
        signing_keys,
    };
    if matches!(format, OutputFormat::Json) {
        return emit_json(&listing);
    }

    println!(
        "Storage key fingerprint: {}",
        listing.storage_key_fingerprint.cyan()
    );
    for row in &listing.signing_keys {
        println!("  {}  {}", row.actor_id.bold(), row.public_key.dimmed());
    }
    Ok(())
}
