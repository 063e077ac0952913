//! JSON-file durable store.
//!
//! The snapshot is one JSON file. Writes go to a temporary file in the same
//! directory which is then renamed over the target, so a crash mid-write
//! leaves the previous snapshot intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::DurableStore;
use crate::error_handling::StoreError;

/// Durable store keeping the snapshot in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by the file at `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomically(path: &Path, blob: &str) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(blob.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl DurableStore for FileStore {
    async fn read_blob(&self) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write_blob(&self, blob: &str) -> Result<(), StoreError> {
        let path = self.path.clone();
        let blob = blob.to_string();
        tokio::task::spawn_blocking(move || write_atomically(&path, &blob))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
