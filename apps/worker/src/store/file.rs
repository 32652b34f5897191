use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{RecordStore, StoreError};

const RECORD_EXTENSION: &str = "json";

/// JSON-file record store laid out as `<base_dir>/<kind>/<id>.json`.
pub struct FileStore {
    base_dir: PathBuf,
    /// Distinguishes staging files of concurrent updates to one record
    staged: AtomicU64,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), staged: AtomicU64::new(0) }
    }

    /// `<id>.json.<n>.tmp` next to the record, never listed as a record
    fn staging_path(&self, kind: &str, id: &str) -> PathBuf {
        let n = self.staged.fetch_add(1, Ordering::Relaxed);
        self.base_dir.join(kind).join(format!("{id}.{RECORD_EXTENSION}.{n}.tmp"))
    }

    fn record_path(&self, kind: &str, id: &str) -> PathBuf {
        self.base_dir.join(kind).join(format!("{id}.{RECORD_EXTENSION}"))
    }

    fn not_found(kind: &str, id: &str) -> StoreError {
        StoreError::NotFound { kind: kind.to_string(), id: id.to_string() }
    }
}

fn record_id(path: &Path) -> Option<String> {
    if path.extension()? != RECORD_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

#[async_trait]
impl RecordStore for FileStore {
    async fn list(&self, kind: &str) -> Result<Vec<String>, StoreError> {
        let mut entries = fs::read_dir(self.base_dir.join(kind)).await?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if let Some(id) = record_id(&entry.path()) {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }

    async fn read(&self, kind: &str, id: &str) -> Result<Value, StoreError> {
        let raw = match fs::read(self.record_path(kind, id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Self::not_found(kind, id)),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
            kind: kind.to_string(),
            id: id.to_string(),
            source,
        })
    }

    async fn update(&self, kind: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(record).map_err(|source| StoreError::Encode {
            kind: kind.to_string(),
            id: id.to_string(),
            source,
        })?;

        let path = self.record_path(kind, id);
        // A record deleted since it was read must stay deleted
        match fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Self::not_found(kind, id)),
            Err(e) => return Err(e.into()),
        }

        // Readers only ever see the old record or the new one
        let staging = self.staging_path(kind, id);
        let written = async {
            let mut file = fs::File::create(&staging).await?;
            file.write_all(&encoded).await?;
            file.sync_all().await?;
            fs::rename(&staging, &path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                tracing::warn!(kind, id, "failed to remove staged record: {}", cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }
}
