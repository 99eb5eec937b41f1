//! Foundation types for the Custodia chain-of-custody ledger.
//!
//! This crate provides the identity, action, and evidence types shared by
//! every other Custodia crate. It has no crypto or storage behavior of its
//! own; it is vocabulary.
//!
//! # Key Types
//!
//! - [`TxId`] / [`EvidenceId`] — UUID v7 identifiers, time-ordered
//! - [`ActorId`] / [`OrgId`] / [`CaseId`] — opaque string identifiers
//! - [`Role`] / [`ActionType`] — the permission vocabulary
//! - [`Actor`] — an identity as recorded on a ledger event
//! - [`Evidence`] — immutable evidence metadata fixed at intake
//! - [`Sha256Digest`] — canonical evidence content hash
//! - [`RecordHash`] — chain-link hash of a ledger record

pub mod action;
pub mod actor;
pub mod digest;
pub mod error;
pub mod evidence;
pub mod id;

pub use action::ActionType;
pub use actor::{Actor, Role};
pub use digest::{RecordHash, Sha256Digest};
pub use error::TypeError;
pub use evidence::Evidence;
pub use id::{ActorId, CaseId, EvidenceId, OrgId, TxId};
