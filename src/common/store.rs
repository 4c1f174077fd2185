//! Whole-file JSON record store.
//!
//! Records are loaded in full at startup and the full set is rewritten on
//! every mutation (temp file + rename). Saves are serialized, and the snapshot
//! is taken only once the save lock is held, so a slow save can never
//! overwrite a newer one.

use crate::common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct RecordFile {
    path: PathBuf,
    save_lock: Mutex<()>,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            save_lock: Mutex::new(()),
        }
    }

    /// Read every record. `Ok(None)` when the file does not exist.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<Option<Vec<T>>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(Vec::new()));
        }
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Rewrite the file with the records produced by `snapshot`.
    pub async fn save_with<T, F>(&self, snapshot: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce() -> Vec<T>,
    {
        let _guard = self.save_lock.lock().await;
        let records = snapshot();

        let data = serde_json::to_vec_pretty(&records)
            .map_err(|e| Error::Persistence(format!("serialize: {}", e)))?;
        let tmp = self.path.with_extension("tmp");

        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| Error::Persistence(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Persistence(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "Record file saved");
        Ok(())
    }
}
