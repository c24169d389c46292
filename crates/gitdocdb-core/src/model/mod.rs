//! The data model shared across the merger, sync engine, and task queue.

mod changed_file;
mod doc_id;
mod fatdoc;
mod serialization;
mod sync_result;

pub use changed_file::{ChangeOperation, ChangedFile};
pub use doc_id::{DocId, DocIdError};
pub use fatdoc::{FatDoc, FatDocKind};
pub use serialization::SerializationMode;
pub use sync_result::{Commit, Conflict, SideChanges, SideCommits, SyncAction, SyncResult};
