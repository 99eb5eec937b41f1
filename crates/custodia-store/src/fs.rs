use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use custodia_types::{CaseId, Evidence, EvidenceId};

use crate::error::{StoreError, StoreResult};
use crate::traits::{EvidenceCatalog, PayloadStore};

/// Filesystem payload store: one file per evidence item.
///
/// Files are written under a single root directory as
/// `<evidence_id>_<file_name>`. Only the final path component of the
/// supplied file name is used, so caller-controlled names cannot escape
/// the root. The location string is the absolute file path.
pub struct FsPayloadStore {
    root: PathBuf,
}

impl FsPayloadStore {
    /// Open a payload store rooted at `root`, creating the directory if
    /// needed.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PayloadStore for FsPayloadStore {
    fn put(&self, evidence_id: &EvidenceId, file_name: &str, bytes: &[u8]) -> StoreResult<String> {
        let safe_name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "payload".to_string());
        let path = self.root.join(format!("{evidence_id}_{safe_name}"));
        fs::write(&path, bytes)?;
        debug!(evidence_id = %evidence_id, path = %path.display(), len = bytes.len(), "payload stored");
        Ok(path.to_string_lossy().into_owned())
    }

    fn get(&self, location: &str) -> StoreResult<Vec<u8>> {
        match fs::read(location) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::PayloadNotFound(location.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

impl std::fmt::Debug for FsPayloadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FsPayloadStore({})", self.root.display())
    }
}

/// Filesystem evidence catalog: one JSON row file per evidence item.
///
/// Rows live under a single root directory as `<evidence_id>.json`, each
/// holding the evidence metadata plus the recorded payload location. Rows
/// are never rewritten; a second insert for the same ID fails.
pub struct FsCatalog {
    root: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct CatalogRow {
    evidence: Evidence,
    location: String,
}

impl FsCatalog {
    /// Open a catalog rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The catalog root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn row_path(&self, id: &EvidenceId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    fn read_row(path: &Path) -> StoreResult<CatalogRow> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::CorruptRow {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// All rows on disk, in directory order.
    fn rows(&self) -> StoreResult<Vec<CatalogRow>> {
        let mut rows = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                rows.push(Self::read_row(&path)?);
            }
        }
        Ok(rows)
    }
}

impl EvidenceCatalog for FsCatalog {
    fn insert(&self, evidence: Evidence, location: String) -> StoreResult<()> {
        let path = self.row_path(&evidence.evidence_id);
        if path.exists() {
            return Err(StoreError::DuplicateEvidence(evidence.evidence_id));
        }
        let row = CatalogRow { evidence, location };
        let json = serde_json::to_vec_pretty(&row).map_err(|e| StoreError::CorruptRow {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json)?;
        debug!(evidence_id = %row.evidence.evidence_id, path = %path.display(), "evidence cataloged");
        Ok(())
    }

    fn get(&self, id: &EvidenceId) -> StoreResult<Option<Evidence>> {
        let path = self.row_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::read_row(&path)?.evidence))
    }

    fn location(&self, id: &EvidenceId) -> StoreResult<Option<String>> {
        let path = self.row_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::read_row(&path)?.location))
    }

    fn list_by_case(&self, case_id: &CaseId) -> StoreResult<Vec<Evidence>> {
        let mut items: Vec<Evidence> = self
            .rows()?
            .into_iter()
            .map(|row| row.evidence)
            .filter(|evidence| &evidence.case_id == case_id)
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
        let mut count = 0;
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl std::fmt::Debug for FsCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FsCatalog({})", self.root.display())
    }
}
