//! Evidence metadata catalog and payload storage for Custodia.
//!
//! The ledger core does not own storage placement; it talks to these two
//! seams. [`EvidenceCatalog`] maps evidence IDs to their immutable metadata
//! and to the location their payload was stored at. [`PayloadStore`] holds
//! the (enveloped) payload bytes themselves.
//!
//! In-memory implementations back tests and embedded use; the filesystem
//! implementations write one file per evidence item (payload bytes and
//! catalog row respectively) and survive process restarts.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::{FsCatalog, FsPayloadStore};
pub use memory::{InMemoryCatalog, InMemoryPayloadStore};
pub use traits::{EvidenceCatalog, PayloadStore};
