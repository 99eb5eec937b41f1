//! Append-only custody ledger.
//!
//! This crate is the heart of the system. It provides:
//! - Hash-chained, signed custody event records
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `CustodyLedger`, a single-writer log with snapshot reads
//! - A CRC-framed journal for crash-safe persistence
//! - Full-chain validation with fail-fast tamper reporting

pub mod error;
pub mod journal;
pub mod memory;
pub mod records;
pub mod traits;
pub mod validation;

pub use error::LedgerError;
pub use journal::{EventJournal, JournalConfig, SyncMode};
pub use memory::CustodyLedger;
pub use records::{CandidateEvent, CustodyEvent, EventDetails};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{ChainValidator, ValidationReport};
