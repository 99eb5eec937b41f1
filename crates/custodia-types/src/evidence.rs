use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Sha256Digest;
use crate::id::{CaseId, EvidenceId};

/// Immutable metadata for one evidence item, fixed at intake.
///
/// `canonical_sha256` is the digest of the original plaintext bytes,
/// computed exactly once when the evidence enters custody. Every later
/// integrity check compares against it. Nothing here is ever updated;
/// later facts about the same item are new ledger events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_id: EvidenceId,
    pub case_id: CaseId,
    pub description: String,
    pub source_device: Option<String>,
    pub acquisition_method: String,
    pub file_name: String,
    pub canonical_sha256: Sha256Digest,
    pub created_at: DateTime<Utc>,
}
