use custodia_crypto::SigningError;
use custodia_types::{OrgId, TxId};

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("endorsement target {0} not found")]
    TargetNotFound(TxId),

    #[error("organization {org} already endorsed event {target}")]
    DuplicateEndorsement { target: TxId, org: OrgId },

    #[error("candidate event rejected: {0}")]
    CandidateRejected(String),

    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("canonical serialization failed: {0}")]
    Serialization(String),

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("journal i/o: {0}")]
    Io(#[from] std::io::Error),
}
