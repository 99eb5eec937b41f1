use thiserror::Error;

use custodia_types::{CaseId, EvidenceId};

/// Errors surfaced by the service facade. Subsystem errors convert
/// losslessly; the facade adds only the lookup failures it owns.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("evidence not found: {0}")]
    EvidenceNotFound(EvidenceId),

    #[error("case not found: {0}")]
    CaseNotFound(CaseId),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("policy error: {0}")]
    Policy(#[from] custodia_policy::PolicyError),

    #[error("signing error: {0}")]
    Signing(#[from] custodia_crypto::SigningError),

    #[error("cipher error: {0}")]
    Cipher(#[from] custodia_crypto::CipherError),

    #[error("store error: {0}")]
    Store(#[from] custodia_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] custodia_ledger::LedgerError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
