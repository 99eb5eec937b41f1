use std::collections::HashMap;
use std::sync::RwLock;

use custodia_types::{CaseId, Evidence, EvidenceId};

use crate::error::{StoreError, StoreResult};
use crate::traits::{EvidenceCatalog, PayloadStore};

/// In-memory, HashMap-based evidence catalog.
///
/// Intended for tests and embedding. Rows are held behind a `RwLock` for
/// safe concurrent access and cloned on read.
pub struct InMemoryCatalog {
    rows: RwLock<HashMap<EvidenceId, CatalogRow>>,
}

#[derive(Clone)]
struct CatalogRow {
    evidence: Evidence,
    location: String,
}

impl InMemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Returns `true` if nothing is cataloged.
    pub fn is_empty(&self) -> bool {
        self.rows.read().expect("lock poisoned").is_empty()
    }

    /// All distinct case IDs, sorted.
    pub fn case_ids(&self) -> Vec<CaseId> {
        let rows = self.rows.read().expect("lock poisoned");
        let mut ids: Vec<CaseId> = rows.values().map(|r| r.evidence.case_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceCatalog for InMemoryCatalog {
    fn insert(&self, evidence: Evidence, location: String) -> StoreResult<()> {
        let mut rows = self.rows.write().expect("lock poisoned");
        if rows.contains_key(&evidence.evidence_id) {
            return Err(StoreError::DuplicateEvidence(evidence.evidence_id));
        }
        rows.insert(evidence.evidence_id, CatalogRow { evidence, location });
        Ok(())
    }

    fn get(&self, id: &EvidenceId) -> StoreResult<Option<Evidence>> {
        let rows = self.rows.read().expect("lock poisoned");
        Ok(rows.get(id).map(|r| r.evidence.clone()))
    }

    fn location(&self, id: &EvidenceId) -> StoreResult<Option<String>> {
        let rows = self.rows.read().expect("lock poisoned");
        Ok(rows.get(id).map(|r| r.location.clone()))
    }

    fn list_by_case(&self, case_id: &CaseId) -> StoreResult<Vec<Evidence>> {
        let rows = self.rows.read().expect("lock poisoned");
        let mut items: Vec<Evidence> = rows
            .values()
            .filter(|r| &r.evidence.case_id == case_id)
            .map(|r| r.evidence.clone())
            .collect();
        // Intake order: created_at, then ID for a stable tiebreak.
        items.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.evidence_id.cmp(&b.evidence_id))
        });
        Ok(items)
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.rows.read().expect("lock poisoned").len())
    }
}

impl std::fmt::Debug for InMemoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.rows.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryCatalog")
            .field("evidence_count", &count)
            .finish()
    }
}

/// In-memory payload store keyed by location string.
pub struct InMemoryPayloadStore {
    payloads: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryPayloadStore {
    /// Create a new empty payload store.
    pub fn new() -> Self {
        Self {
            payloads: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.payloads.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.payloads.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.payloads
            .read()
            .expect("lock poisoned")
            .values()
            .map(|bytes| bytes.len() as u64)
            .sum()
    }

    /// Overwrite the bytes at an existing location. Test helper for
    /// simulating on-disk tampering.
    pub fn overwrite(&self, location: &str, bytes: Vec<u8>) -> StoreResult<()> {
        let mut payloads = self.payloads.write().expect("lock poisoned");
        if !payloads.contains_key(location) {
            return Err(StoreError::PayloadNotFound(location.to_string()));
        }
        payloads.insert(location.to_string(), bytes);
        Ok(())
    }
}

impl Default for InMemoryPayloadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadStore for InMemoryPayloadStore {
    fn put(&self, evidence_id: &EvidenceId, file_name: &str, bytes: &[u8]) -> StoreResult<String> {
        let location = format!("mem:{evidence_id}/{file_name}");
        let mut payloads = self.payloads.write().expect("lock poisoned");
        payloads.insert(location.clone(), bytes.to_vec());
        Ok(location)
    }

    fn get(&self, location: &str) -> StoreResult<Vec<u8>> {
        let payloads = self.payloads.read().expect("lock poisoned");
        payloads
            .get(location)
            .cloned()
            .ok_or_else(|| StoreError::PayloadNotFound(location.to_string()))
    }
}

impl std::fmt::Debug for InMemoryPayloadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPayloadStore")
            .field("payload_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use custodia_types::Sha256Digest;

    fn evidence(case: &str, name: &str) -> Evidence {
        Evidence {
            evidence_id: EvidenceId::new(),
            case_id: CaseId::new(case),
            description: format!("item {name}"),
            source_device: None,
            acquisition_method: "seizure".into(),
            file_name: name.into(),
            canonical_sha256: Sha256Digest::from_raw([1; 32]),
            created_at: Utc::now(),
        }
    }

    // ---- catalog ----

    #[test]
    fn insert_and_get() {
        let catalog = InMemoryCatalog::new();
        let item = evidence("CASE-1", "a.img");
        let id = item.evidence_id;
        catalog.insert(item.clone(), "loc-a".into()).unwrap();

        assert_eq!(catalog.get(&id).unwrap(), Some(item));
        assert_eq!(catalog.location(&id).unwrap(), Some("loc-a".into()));
        assert_eq!(catalog.count().unwrap(), 1);
    }

    #[test]
    fn get_missing_returns_none() {
        let catalog = InMemoryCatalog::new();
        assert_eq!(catalog.get(&EvidenceId::new()).unwrap(), None);
        assert_eq!(catalog.location(&EvidenceId::new()).unwrap(), None);
    }

    #[test]
    fn duplicate_insert_fails() {
        let catalog = InMemoryCatalog::new();
        let item = evidence("CASE-1", "a.img");
        catalog.insert(item.clone(), "loc-a".into()).unwrap();

        let err = catalog.insert(item, "loc-b".into()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEvidence(_)));
        assert_eq!(catalog.count().unwrap(), 1);
    }

    #[test]
    fn list_by_case_filters_and_orders() {
        let catalog = InMemoryCatalog::new();
        let a = evidence("CASE-1", "a.img");
        let b = evidence("CASE-1", "b.img");
        let other = evidence("CASE-2", "x.img");
        catalog.insert(a.clone(), "la".into()).unwrap();
        catalog.insert(b.clone(), "lb".into()).unwrap();
        catalog.insert(other, "lx".into()).unwrap();

        let listed = catalog.list_by_case(&CaseId::new("CASE-1")).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn case_ids_are_sorted_and_deduped() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(evidence("CASE-2", "a"), "1".into()).unwrap();
        catalog.insert(evidence("CASE-1", "b"), "2".into()).unwrap();
        catalog.insert(evidence("CASE-1", "c"), "3".into()).unwrap();

        let cases = catalog.case_ids();
        assert_eq!(cases, vec![CaseId::new("CASE-1"), CaseId::new("CASE-2")]);
    }

    // ---- payload store ----

    #[test]
    fn put_then_get() {
        let store = InMemoryPayloadStore::new();
        let id = EvidenceId::new();
        let location = store.put(&id, "a.img", b"payload bytes").unwrap();
        assert_eq!(store.get(&location).unwrap(), b"payload bytes");
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_bytes(), 13);
    }

    #[test]
    fn get_missing_location_fails() {
        let store = InMemoryPayloadStore::new();
        assert!(matches!(
            store.get("mem:nowhere"),
            Err(StoreError::PayloadNotFound(_))
        ));
    }

    #[test]
    fn overwrite_replaces_bytes() {
        let store = InMemoryPayloadStore::new();
        let location = store.put(&EvidenceId::new(), "a", b"before").unwrap();
        store.overwrite(&location, b"after".to_vec()).unwrap();
        assert_eq!(store.get(&location).unwrap(), b"after");
    }

    #[test]
    fn overwrite_missing_location_fails() {
        let store = InMemoryPayloadStore::new();
        assert!(store.overwrite("mem:nowhere", vec![]).is_err());
    }
}
