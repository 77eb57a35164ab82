//! Remote → local.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use super::{Pipeline, SyncError};
use crate::mirror::{sentinel_path, MirrorStore};
use crate::record::{self, LevelRecord};
use crate::remote::RemoteCollection;

/// Outcome of a successful pull.
#[derive(Debug, Clone)]
pub struct PullReport {
    /// Number of record files written and confirmed
    pub written: usize,
    /// Timestamp stored in the sentinel file
    pub synced_at: DateTime<Utc>,
}

impl<R: RemoteCollection, M: MirrorStore> Pipeline<'_, R, M> {
    /// Replaces the mirror at `dir` with the current contents of `collection`.
    ///
    /// The mirror is only touched once the fetch has succeeded. If any file
    /// cannot be confirmed the run fails with
    /// [`SyncError::VerificationMismatch`] and the directory is left as is.
    pub async fn pull(&self, collection: &str, dir: &Path) -> Result<PullReport, SyncError> {
        let mut records = self.remote.fetch_all(collection).await?;
        tracing::info!(
            "Fetched {} record(s) from '{}'",
            records.len(),
            collection
        );

        record::sort_by_order(&mut records);

        self.mirror.reset(dir)?;
        tracing::debug!("Reset mirror directory {}", dir.display());

        let total = records.len();
        let mut unconfirmed = Vec::new();
        for level in &records {
            if !self.write_confirmed(level, dir) {
                unconfirmed.push(level.id());
            }
        }

        if !unconfirmed.is_empty() {
            tracing::warn!(
                "{} of {} record(s) not confirmed: {}",
                unconfirmed.len(),
                total,
                unconfirmed.join(", ")
            );
            return Err(SyncError::VerificationMismatch {
                expected: total,
                found: total - unconfirmed.len(),
            });
        }

        let synced_at = Utc::now();
        self.mirror.write_text(
            &sentinel_path(dir),
            &synced_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;

        Ok(PullReport {
            written: total,
            synced_at,
        })
    }

    /// Writes one record and checks the file landed.
    fn write_confirmed(&self, level: &LevelRecord, dir: &Path) -> bool {
        let path = dir.join(level.file_name());

        if let Err(e) = self.mirror.write_text(&path, &record::serialize(level)) {
            tracing::warn!("Failed to write {}: {}", level.id(), e);
            return false;
        }
        if !self.mirror.exists(&path) {
            tracing::warn!("Wrote {} but {} is missing", level.id(), path.display());
            return false;
        }

        tracing::debug!("Wrote {}", path.display());
        true
    }
}
