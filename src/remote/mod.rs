//! Remote collection access.
//!
//! The pipelines talk to the document store through [`RemoteCollection`], a
//! narrow view of a keyed collection: read everything, replace everything,
//! count. [`FirestoreClient`] is the production implementation.

mod firestore;
#[cfg(test)]
pub mod memory;
mod retry;
mod value;

pub use firestore::FirestoreClient;
pub use retry::RetryPolicy;

use crate::record::LevelRecord;
use crate::sync::SyncError;

/// A named collection of level records held by a document store.
///
/// Batch operations must be atomic at the store level: after a failed
/// `delete_all` or `insert_all` the collection is unchanged.
pub trait RemoteCollection {
    /// Every document in `collection`, keyed by document id.
    ///
    /// Fails with [`SyncError::RemoteUnavailable`].
    async fn fetch_all(&self, collection: &str) -> Result<Vec<LevelRecord>, SyncError>;

    /// Deletes every document in one atomic batch, returning how many.
    ///
    /// Fails with [`SyncError::RemoteWriteFailed`] if the commit is rejected.
    async fn delete_all(&self, collection: &str) -> Result<usize, SyncError>;

    /// Writes `records` in one atomic batch, each keyed by its id.
    ///
    /// Fails with [`SyncError::RemoteWriteFailed`] if the commit is rejected.
    async fn insert_all(&self, collection: &str, records: &[LevelRecord])
        -> Result<(), SyncError>;

    /// Current number of documents in `collection`.
    async fn count(&self, collection: &str) -> Result<usize, SyncError>;
}
