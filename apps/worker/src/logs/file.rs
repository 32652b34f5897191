use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{Capture, LogError, LogSink, archive};

const LIVE_SUFFIX: &str = ".log";
const ARCHIVE_SUFFIX: &str = ".gz.b64";
const STAGING_SUFFIX: &str = ".tmp";

/// Directory of `<id>.log` live logs and `<archive-id>.gz.b64` archives
pub struct FileLogSink {
    base_dir: PathBuf,
    /// Held by appends and truncations so a truncation never drops a line
    /// appended after the capture.
    write_lock: Mutex<()>,
}

impl FileLogSink {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), write_lock: Mutex::new(()) }
    }

    fn live_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{id}{LIVE_SUFFIX}"))
    }

    fn staging_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{id}{LIVE_SUFFIX}{STAGING_SUFFIX}"))
    }

    fn archive_path(&self, archive_id: &str) -> PathBuf {
        self.base_dir.join(format!("{archive_id}{ARCHIVE_SUFFIX}"))
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    async fn append(&self, id: &str, line: &str) -> Result<(), LogError> {
        let _guard = self.write_lock.lock().await;
        fs::create_dir_all(&self.base_dir).await?;

        let mut file =
            fs::OpenOptions::new().create(true).append(true).open(self.live_path(id)).await?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn list(&self, include_archived: bool) -> Result<Vec<String>, LogError> {
        let mut entries = match fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if let Some(id) = file_name.strip_suffix(LIVE_SUFFIX) {
                names.push(id.to_string());
            } else if let Some(archive_id) = file_name.strip_suffix(ARCHIVE_SUFFIX) {
                if include_archived {
                    names.push(archive_id.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn compress(&self, id: &str, archive_id: &str) -> Result<Capture, LogError> {
        let raw = match fs::read(self.live_path(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(LogError::NotFound(id.to_string())),
            Err(e) => return Err(e.into()),
        };
        if raw.is_empty() {
            return Ok(Capture::Empty);
        }

        let encoded = archive::encode(&raw)?;

        let archive_path = self.archive_path(archive_id);
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&archive_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(LogError::ArchiveExists(archive_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(encoded.as_bytes()).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            // A half-written archive would be mistaken for a good one
            if let Err(cleanup) = fs::remove_file(&archive_path).await {
                tracing::warn!(archive_id, "failed to remove partial archive: {}", cleanup);
            }
            return Err(e.into());
        }

        Ok(Capture::Archived { bytes: raw.len() as u64 })
    }

    async fn truncate(&self, id: &str, captured_bytes: u64) -> Result<(), LogError> {
        let _guard = self.write_lock.lock().await;
        let live = self.live_path(id);

        let contents = match fs::read(&live).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(LogError::NotFound(id.to_string())),
            Err(e) => return Err(e.into()),
        };
        let tail = contents.get(captured_bytes as usize..).unwrap_or_default();

        if tail.is_empty() {
            // Everything in the live log is already archived
            let file = fs::OpenOptions::new().write(true).open(&live).await?;
            file.set_len(0).await?;
            return Ok(());
        }

        // The live log is replaced whole, so a failed write leaves it as it was
        let staging = self.staging_path(id);
        let written = async {
            let mut file = fs::File::create(&staging).await?;
            file.write_all(tail).await?;
            file.sync_all().await?;
            fs::rename(&staging, &live).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                tracing::warn!(log_id = id, "failed to remove staged log: {}", cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn decompress(&self, archive_id: &str) -> Result<String, LogError> {
        let text = match fs::read_to_string(self.archive_path(archive_id)).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LogError::NotFound(archive_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let corrupt = |reason: String| LogError::CorruptArchive { id: archive_id.to_string(), reason };
        let raw = archive::decode(&text).map_err(|e| corrupt(e.to_string()))?;
        String::from_utf8(raw).map_err(|e| corrupt(e.to_string()))
    }
}
