use custodia_types::{EvidenceId, RecordHash, TxId};

use crate::error::LedgerError;
use crate::records::{CandidateEvent, CustodyEvent};
use crate::validation::ValidationReport;

/// Write boundary for the custody ledger's single append operation.
pub trait LedgerWriter: Send + Sync {
    /// Seal and append a candidate event: assign its transaction id and
    /// timestamp, link it to the current chain tail, hash, sign, persist.
    /// A failure at any step leaves the chain exactly as it was.
    fn append(&self, candidate: CandidateEvent) -> Result<CustodyEvent, LedgerError>;
}

/// Read boundary over consistent snapshots of the event log.
pub trait LedgerReader: Send + Sync {
    /// All events touching one evidence item, in global append order.
    fn read_timeline(&self, evidence_id: &EvidenceId) -> Result<Vec<CustodyEvent>, LedgerError>;

    /// Snapshot of the full log in append order.
    fn events(&self) -> Result<Vec<CustodyEvent>, LedgerError>;

    /// Look up a single event by transaction id.
    fn get(&self, tx_id: &TxId) -> Result<Option<CustodyEvent>, LedgerError>;

    fn event_count(&self) -> Result<u64, LedgerError>;

    /// `record_hash` of the newest event, or the genesis sentinel when the
    /// log is empty.
    fn tail_hash(&self) -> Result<RecordHash, LedgerError>;

    /// Walk the full log from genesis and report the first broken record.
    fn validate_chain(&self) -> Result<ValidationReport, LedgerError>;
}
