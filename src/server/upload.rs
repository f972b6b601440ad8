//! On-disk storage for uploaded attachments.
//!
//! Uploads land in a flat directory created at startup, named by millisecond
//! timestamp plus a counter, keeping the client's file extension. Storage is
//! fire-and-forget: nothing here cleans files up.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::fs;
use tracing::debug;

pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
    seq: AtomicU64,
}

impl UploadStore {
    /// Open the store, creating the directory if it does not exist.
    pub async fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create uploads dir {}", dir.display()))?;
        Ok(Self {
            dir,
            max_bytes,
            seq: AtomicU64::new(0),
        })
    }

    /// Persist one uploaded file and return its path. The size cap is
    /// enforced here, before the bytes reach the chat core.
    pub async fn persist(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<PathBuf> {
        if bytes.len() > self.max_bytes {
            bail!(
                "upload of {} bytes exceeds the {} byte limit",
                bytes.len(),
                self.max_bytes
            );
        }

        let ext = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        // Counter disambiguates uploads landing in the same millisecond.
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("{}-{}{}", Utc::now().timestamp_millis(), seq, ext);
        let path = self.dir.join(file_name);

        fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write upload {}", path.display()))?;

        debug!(path = %path.display(), size = bytes.len(), "stored upload");
        Ok(path)
    }
}
