//! Local mirror storage.
//!
//! The mirror is a flat directory of `<id>.json` files plus the sentinel
//! `metadata.txt`, which records the time of the last successful pull.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::sync::SyncError;

/// Name of the sentinel timestamp file inside a mirror directory.
pub const SENTINEL_FILE: &str = "metadata.txt";

/// Path-addressed text storage backing the local mirror.
pub trait MirrorStore {
    /// Removes `dir` and everything under it, then recreates it empty.
    fn reset(&self, dir: &Path) -> Result<(), SyncError>;

    /// Regular files in `dir`, sentinel excluded, sorted by file name.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, SyncError>;

    fn read_text(&self, path: &Path) -> Result<String, SyncError>;

    fn write_text(&self, path: &Path, content: &str) -> Result<(), SyncError>;

    /// Presence check only; says nothing about content.
    fn exists(&self, path: &Path) -> bool;
}

/// Mirror store over the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMirror;

impl MirrorStore for FsMirror {
    fn reset(&self, dir: &Path) -> Result<(), SyncError> {
        match fs::remove_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(SyncError::io(dir, e)),
        }
        fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, SyncError> {
        let entries = fs::read_dir(dir).map_err(|e| SyncError::io(dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SyncError::io(dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| SyncError::io(&path, e))?;

            if !file_type.is_file() || entry.file_name() == SENTINEL_FILE {
                continue;
            }
            files.push(path);
        }

        files.sort();
        Ok(files)
    }

    fn read_text(&self, path: &Path) -> Result<String, SyncError> {
        fs::read_to_string(path).map_err(|e| SyncError::io(path, e))
    }

    fn write_text(&self, path: &Path, content: &str) -> Result<(), SyncError> {
        fs::write(path, content).map_err(|e| SyncError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Path of the sentinel file inside `dir`.
pub fn sentinel_path(dir: &Path) -> PathBuf {
    dir.join(SENTINEL_FILE)
}
