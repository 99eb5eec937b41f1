use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use custodia_ledger::{ChainValidator, CustodyEvent, LedgerError, LedgerReader, ValidationReport};
use custodia_policy::PolicyTable;
use custodia_types::{ActionType, CaseId, Evidence, EvidenceId};

use crate::endorsement::{EndorsementIndex, EndorsementState};

/// Per-evidence compliance verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    AttentionRequired,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliant => "COMPLIANT",
            Self::AttentionRequired => "ATTENTION_REQUIRED",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit row for one evidence item.
///
/// An item is `Compliant` iff its most recent integrity check (if any)
/// passed and none of its events still wait on endorsements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceAudit {
    pub evidence_id: EvidenceId,
    pub file_name: String,
    pub event_count: u64,
    pub integrity_failures: u64,
    pub pending_endorsements: u64,
    pub last_integrity_ok: Option<bool>,
    pub compliance: ComplianceStatus,
}

/// Case-level aggregate over every evidence item under one case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseAudit {
    pub case_id: CaseId,
    pub evidence_count: u64,
    pub total_events: u64,
    pub integrity_failures: u64,
    pub pending_endorsements: u64,
    pub compliant_evidence_count: u64,
    pub chain_valid: bool,
    pub evidence_audits: Vec<EvidenceAudit>,
}

/// Builds case audits from one consistent log snapshot, so the chain
/// verdict and the per-evidence rows always describe the same events.
pub struct CaseAuditor;

impl CaseAuditor {
    pub fn audit<R: LedgerReader + ?Sized>(
        reader: &R,
        case_id: &CaseId,
        evidence_items: &[Evidence],
        policy: &PolicyTable,
    ) -> Result<CaseAudit, LedgerError> {
        let events = reader.events()?;
        let chain = ChainValidator::validate(&events);
        Ok(Self::audit_snapshot(
            case_id,
            evidence_items,
            &events,
            &chain,
            policy,
        ))
    }

    /// Pure aggregation over an already-taken snapshot and its validation
    /// report.
    pub fn audit_snapshot(
        case_id: &CaseId,
        evidence_items: &[Evidence],
        events: &[CustodyEvent],
        chain: &ValidationReport,
        policy: &PolicyTable,
    ) -> CaseAudit {
        let index = EndorsementIndex::build(events);

        let mut by_evidence: HashMap<EvidenceId, Vec<&CustodyEvent>> = HashMap::new();
        for event in events {
            by_evidence.entry(event.evidence_id).or_default().push(event);
        }

        let mut evidence_audits = Vec::with_capacity(evidence_items.len());
        for item in evidence_items {
            let timeline = by_evidence
                .get(&item.evidence_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let mut integrity_failures = 0u64;
            let mut pending_endorsements = 0u64;
            let mut last_integrity_ok = None;

            for event in timeline {
                if let Some(presented) = event.presented_sha256 {
                    let ok = presented == item.canonical_sha256;
                    if !ok {
                        integrity_failures += 1;
                    }
                    last_integrity_ok = Some(ok);
                }
                if event.action != ActionType::Endorse
                    && index.status_of(event, policy).status == EndorsementState::Pending
                {
                    pending_endorsements += 1;
                }
            }

            let compliance = if last_integrity_ok != Some(false) && pending_endorsements == 0 {
                ComplianceStatus::Compliant
            } else {
                ComplianceStatus::AttentionRequired
            };

            evidence_audits.push(EvidenceAudit {
                evidence_id: item.evidence_id,
                file_name: item.file_name.clone(),
                event_count: timeline.len() as u64,
                integrity_failures,
                pending_endorsements,
                last_integrity_ok,
                compliance,
            });
        }

        CaseAudit {
            case_id: case_id.clone(),
            evidence_count: evidence_audits.len() as u64,
            total_events: evidence_audits.iter().map(|a| a.event_count).sum(),
            integrity_failures: evidence_audits.iter().map(|a| a.integrity_failures).sum(),
            pending_endorsements: evidence_audits
                .iter()
                .map(|a| a.pending_endorsements)
                .sum(),
            compliant_evidence_count: evidence_audits
                .iter()
                .filter(|a| a.compliance == ComplianceStatus::Compliant)
                .count() as u64,
            chain_valid: chain.valid,
            evidence_audits,
        }
    }
}
