use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use custodia_compliance::EndorsementStatus;
use custodia_ledger::{EventDetails, ValidationReport};
use custodia_types::{ActionType, ActorId, CaseId, EvidenceId, Sha256Digest, TxId};

/// Intake request: new evidence entering custody.
#[derive(Clone, Debug)]
pub struct IntakeRequest {
    pub actor_id: ActorId,
    pub case_id: CaseId,
    pub description: String,
    pub source_device: Option<String>,
    pub acquisition_method: Option<String>,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl IntakeRequest {
    pub fn new(
        actor_id: ActorId,
        case_id: CaseId,
        description: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            actor_id,
            case_id,
            description: description.into(),
            source_device: None,
            acquisition_method: None,
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn with_source_device(mut self, device: impl Into<String>) -> Self {
        self.source_device = Some(device.into());
        self
    }

    pub fn with_acquisition_method(mut self, method: impl Into<String>) -> Self {
        self.acquisition_method = Some(method.into());
        self
    }

    pub fn effective_acquisition_method(&self) -> &str {
        self.acquisition_method.as_deref().unwrap_or("unspecified")
    }
}

/// Request to record a custody event against cataloged evidence.
///
/// INTAKE and ENDORSE have dedicated operations and are not accepted here.
#[derive(Clone, Debug)]
pub struct EventRequest {
    pub actor_id: ActorId,
    pub evidence_id: EvidenceId,
    pub action: ActionType,
    pub details: EventDetails,
    pub presented_sha256: Option<Sha256Digest>,
    pub self_endorse: bool,
}

impl EventRequest {
    pub fn new(
        actor_id: ActorId,
        evidence_id: EvidenceId,
        action: ActionType,
        details: EventDetails,
    ) -> Self {
        Self {
            actor_id,
            evidence_id,
            action,
            details,
            presented_sha256: None,
            self_endorse: false,
        }
    }

    pub fn with_presented_sha256(mut self, digest: Sha256Digest) -> Self {
        self.presented_sha256 = Some(digest);
        self
    }

    pub fn self_endorsed(mut self) -> Self {
        self.self_endorse = true;
        self
    }
}

/// Receipt for registered evidence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntakeReceipt {
    pub evidence_id: EvidenceId,
    pub case_id: CaseId,
    pub canonical_sha256: Sha256Digest,
    pub location: String,
    pub tx_id: TxId,
    pub recorded_at: DateTime<Utc>,
}

/// Receipt for an appended custody event, with the endorsement status it
/// has immediately after the append.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventReceipt {
    pub tx_id: TxId,
    pub evidence_id: EvidenceId,
    pub action: ActionType,
    pub recorded_at: DateTime<Utc>,
    pub endorsement: EndorsementStatus,
}

/// Receipt for a recorded endorsement: the attestation's own transaction
/// plus the target's updated status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndorsementReceipt {
    pub tx_id: TxId,
    pub target_tx_id: TxId,
    pub target_endorsement: EndorsementStatus,
}

/// Outcome of an integrity verification.
///
/// A mismatch is a recorded fact, not an error: the check itself appends a
/// valid ACCESS event either way.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationReport {
    pub evidence_id: EvidenceId,
    pub integrity_ok: bool,
    pub expected_sha256: Sha256Digest,
    pub actual_sha256: Sha256Digest,
    pub tx_id: TxId,
}

/// Whole-chain health summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainHealth {
    pub chain: ValidationReport,
    pub evidence_count: u64,
}
