//! Local → remote.

use std::collections::HashSet;
use std::path::Path;

use super::{Pipeline, SyncError};
use crate::mirror::MirrorStore;
use crate::record::{self, LevelRecord};
use crate::remote::RemoteCollection;

/// Outcome of a successful push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    /// Documents removed by the delete batch
    pub deleted: usize,
    /// Documents written by the insert batch (and confirmed by count)
    pub inserted: usize,
}

impl<R: RemoteCollection, M: MirrorStore> Pipeline<'_, R, M> {
    /// Replaces the contents of `collection` with the records in `dir`.
    ///
    /// Every local file is parsed before the remote side is touched. The
    /// delete and insert batches are each atomic; a rejected delete leaves
    /// the collection as it was and the insert is skipped.
    pub async fn push(&self, collection: &str, dir: &Path) -> Result<PushReport, SyncError> {
        let records = self.load_mirror(dir)?;
        tracing::info!(
            "Parsed {} record(s) from {}",
            records.len(),
            dir.display()
        );

        let deleted = self.remote.delete_all(collection).await?;
        tracing::info!("Deleted {} document(s) from '{}'", deleted, collection);

        self.remote.insert_all(collection, &records).await?;
        tracing::info!("Inserted {} document(s) into '{}'", records.len(), collection);

        let found = self.remote.count(collection).await?;
        if found != records.len() {
            return Err(SyncError::VerificationMismatch {
                expected: records.len(),
                found,
            });
        }

        Ok(PushReport {
            deleted,
            inserted: found,
        })
    }

    /// Reads and parses every record file in the mirror.
    ///
    /// Fails on the first unreadable or malformed file, or on a repeated id.
    pub fn load_mirror(&self, dir: &Path) -> Result<Vec<LevelRecord>, SyncError> {
        let files = self.mirror.list_files(dir)?;

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(files.len());
        for path in files {
            let text = self.mirror.read_text(&path)?;
            let stem = path.file_stem().and_then(|s| s.to_str());
            let level = record::deserialize(&text, stem, &path)?;

            if !seen.insert(level.id().to_string()) {
                return Err(SyncError::malformed(
                    &path,
                    format!("duplicate id '{}'", level.id()),
                ));
            }
            tracing::debug!("Parsed {} from {}", level.id(), path.display());
            records.push(level);
        }

        Ok(records)
    }
}
