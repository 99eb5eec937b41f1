//! High-level SDK for Custodia.
//!
//! Provides a unified API over all Custodia subsystems: identity, policy,
//! payload encryption and storage, the signed hash-chained ledger, and the
//! derived compliance views. This is the main entry point for applications
//! embedding Custodia.

pub mod error;
pub mod request;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use request::{
    ChainHealth, EndorsementReceipt, EventReceipt, EventRequest, IntakeReceipt, IntakeRequest,
    VerificationReport,
};
pub use service::Custodia;

// Re-export key types
pub use custodia_compliance::{
    CaseAudit, ComplianceStatus, EndorsementState, EndorsementStatus, EvidenceAudit, TimelineEntry,
};
pub use custodia_crypto::EvidenceCipher;
pub use custodia_ledger::{CustodyEvent, EventDetails, EventJournal, JournalConfig, ValidationReport};
pub use custodia_policy::PolicyTable;
pub use custodia_types::{
    ActionType, Actor, ActorId, CaseId, Evidence, EvidenceId, OrgId, Role, Sha256Digest, TxId,
};
