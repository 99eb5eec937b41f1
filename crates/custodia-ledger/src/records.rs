use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use custodia_crypto::VerifyingKey;
use custodia_types::{ActionType, Actor, CaseId, EvidenceId, OrgId, RecordHash, Sha256Digest, TxId};

/// Per-action payload carried by a custody event.
///
/// The common actions have a fixed shape; anything else goes through
/// [`EventDetails::Note`], an ordered key/value map that survives canonical
/// re-encoding byte for byte.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDetails {
    /// Recorded once per evidence item, at registration.
    Intake { case_id: CaseId, file_name: String },
    /// Custody handover between organizations.
    Transfer { from_org: OrgId, to_org: OrgId },
    /// Evidence was read; `purpose` says why.
    Access { purpose: String },
    /// Attestation of another event; the target rides on the event itself.
    Endorsement,
    /// Free-form fields for actions without a fixed shape.
    Note { fields: BTreeMap<String, Value> },
}

impl EventDetails {
    pub fn note(fields: BTreeMap<String, Value>) -> Self {
        Self::Note { fields }
    }
}

/// An event as submitted for appending, before the ledger assigns its
/// transaction id, timestamp, chain position, and signature.
#[derive(Clone, Debug)]
pub struct CandidateEvent {
    pub evidence_id: EvidenceId,
    pub action: ActionType,
    pub actor: Actor,
    pub details: EventDetails,
    /// Hash asserted by the caller, cross-checked against the canonical one.
    pub presented_sha256: Option<Sha256Digest>,
    /// Only ENDORSE events carry a target.
    pub target_tx_id: Option<TxId>,
    /// Counts the actor's own organization toward the endorsement threshold.
    pub self_endorsed: bool,
}

impl CandidateEvent {
    pub fn new(
        evidence_id: EvidenceId,
        action: ActionType,
        actor: Actor,
        details: EventDetails,
    ) -> Self {
        Self {
            evidence_id,
            action,
            actor,
            details,
            presented_sha256: None,
            target_tx_id: None,
            self_endorsed: false,
        }
    }

    /// Candidate for an ENDORSE event attesting to `target_tx_id`.
    pub fn endorsement(evidence_id: EvidenceId, actor: Actor, target_tx_id: TxId) -> Self {
        Self {
            evidence_id,
            action: ActionType::Endorse,
            actor,
            details: EventDetails::Endorsement,
            presented_sha256: None,
            target_tx_id: Some(target_tx_id),
            self_endorsed: false,
        }
    }

    pub fn with_presented_sha256(mut self, digest: Sha256Digest) -> Self {
        self.presented_sha256 = Some(digest);
        self
    }

    pub fn self_endorsed(mut self) -> Self {
        self.self_endorsed = true;
        self
    }
}

/// A sealed, immutable ledger record.
///
/// `record_hash` covers every stable field (everything except itself and the
/// signature) plus `prev_hash`, so each record pins its predecessor and its
/// own position. The signature is over the 32-byte `record_hash`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustodyEvent {
    pub tx_id: TxId,
    pub evidence_id: EvidenceId,
    pub action: ActionType,
    pub actor: Actor,
    pub recorded_at: DateTime<Utc>,
    pub details: EventDetails,
    pub presented_sha256: Option<Sha256Digest>,
    pub target_tx_id: Option<TxId>,
    pub self_endorsed: bool,
    pub prev_hash: RecordHash,
    pub record_hash: RecordHash,
    pub signer_pubkey: VerifyingKey,
    pub signature: custodia_crypto::Signature,
}

impl CustodyEvent {
    /// Borrowed view of the stable fields, in the exact order they are
    /// hashed. Append and validation must agree on this or recomputed
    /// hashes diverge from stored ones.
    pub(crate) fn preimage(&self) -> EventPreimage<'_> {
        EventPreimage {
            tx_id: &self.tx_id,
            evidence_id: &self.evidence_id,
            action: self.action,
            actor: &self.actor,
            recorded_at: &self.recorded_at,
            details: &self.details,
            presented_sha256: &self.presented_sha256,
            target_tx_id: &self.target_tx_id,
            self_endorsed: self.self_endorsed,
            prev_hash: &self.prev_hash,
            signer_pubkey: &self.signer_pubkey,
        }
    }
}

/// Serialize-only projection of a record's stable fields.
#[derive(Serialize)]
pub(crate) struct EventPreimage<'a> {
    pub(crate) tx_id: &'a TxId,
    pub(crate) evidence_id: &'a EvidenceId,
    pub(crate) action: ActionType,
    pub(crate) actor: &'a Actor,
    pub(crate) recorded_at: &'a DateTime<Utc>,
    pub(crate) details: &'a EventDetails,
    pub(crate) presented_sha256: &'a Option<Sha256Digest>,
    pub(crate) target_tx_id: &'a Option<TxId>,
    pub(crate) self_endorsed: bool,
    pub(crate) prev_hash: &'a RecordHash,
    pub(crate) signer_pubkey: &'a VerifyingKey,
}
