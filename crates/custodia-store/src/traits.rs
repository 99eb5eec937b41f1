use custodia_types::{CaseId, Evidence, EvidenceId};

use crate::error::StoreResult;

/// Evidence metadata catalog.
///
/// All implementations must satisfy these invariants:
/// - Evidence rows are immutable once inserted; a second insert for the
///   same ID fails rather than overwriting.
/// - The catalog never interprets payload bytes; it only records where
///   they were stored.
/// - `list_by_case` returns items in intake order (oldest first).
/// - All I/O errors are propagated, never silently ignored.
pub trait EvidenceCatalog: Send + Sync {
    /// Insert newly intaken evidence together with the location its
    /// payload was stored at.
    fn insert(&self, evidence: Evidence, location: String) -> StoreResult<()>;

    /// Look up evidence metadata by ID.
    ///
    /// Returns `Ok(None)` if the evidence is not cataloged.
    fn get(&self, id: &EvidenceId) -> StoreResult<Option<Evidence>>;

    /// The stored payload location for an evidence item.
    fn location(&self, id: &EvidenceId) -> StoreResult<Option<String>>;

    /// All evidence under a case, in intake order.
    fn list_by_case(&self, case_id: &CaseId) -> StoreResult<Vec<Evidence>>;

    /// Total number of cataloged evidence items.
    fn count(&self) -> StoreResult<usize>;
}

/// Evidence payload byte storage.
///
/// Stores opaque bytes (normally cipher envelopes) and returns an opaque
/// location string the catalog records. Implementations never inspect or
/// transform the bytes.
pub trait PayloadStore: Send + Sync {
    /// Store payload bytes for an evidence item; returns the location.
    fn put(&self, evidence_id: &EvidenceId, file_name: &str, bytes: &[u8]) -> StoreResult<String>;

    /// Fetch payload bytes by location.
    ///
    /// A location that no longer resolves is `PayloadNotFound`: recorded
    /// locations are expected to stay valid for the life of the case.
    fn get(&self, location: &str) -> StoreResult<Vec<u8>>;
}
