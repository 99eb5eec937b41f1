//! Derived compliance views over the custody ledger.
//!
//! Endorsement status and case audits are recomputed from log snapshots on
//! every read. Nothing in this crate stores state, so a view can never
//! disagree with the ledger that produced it.

pub mod audit;
pub mod endorsement;

pub use audit::{CaseAudit, CaseAuditor, ComplianceStatus, EvidenceAudit};
pub use endorsement::{EndorsementIndex, EndorsementState, EndorsementStatus, TimelineEntry};
