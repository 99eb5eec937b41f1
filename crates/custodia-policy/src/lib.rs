//! Permission policy and identity resolution for Custodia.
//!
//! [`PolicyTable`] answers two pure questions: may this role originate
//! this action type, and how many distinct organizations must endorse an
//! event of this action type. [`IdentityDirectory`] resolves opaque actor
//! IDs to a role and organization.
//!
//! Both are checked before signing and appending; a denial never reaches
//! the ledger.

pub mod directory;
pub mod error;
pub mod table;

pub use directory::IdentityDirectory;
pub use error::PolicyError;
pub use table::PolicyTable;
