//! JSON-file implementation of the `CheckpointStore` trait.
//!
//! Each stream has its own `resume-token-<stream>.json` in the configured
//! directory. Writes go to a sibling temp file which is then renamed over
//! the checkpoint, so a crash never leaves a half-written token behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use feedwatch_core::checkpoint::{CheckpointError, CheckpointStore};
use feedwatch_core::event::ResumeToken;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileCheckpoint {
    token: String,
}

/// Checkpoints kept as JSON files.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Creates a store rooted at `dir`. The directory is created on first
    /// save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the checkpoint file for `stream`.
    #[must_use]
    pub fn path_for(&self, stream: &str) -> PathBuf {
        self.dir.join(format!("resume-token-{stream}.json"))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, stream: &str) -> Result<Option<ResumeToken>, CheckpointError> {
        let path = self.path_for(stream);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(parse_checkpoint(&path, &raw))
    }

    async fn save(&self, stream: &str, token: &ResumeToken) -> Result<(), CheckpointError> {
        if token.is_empty() {
            return Ok(());
        }
        tokio::fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_vec(&FileCheckpoint {
            token: token.as_str().to_owned(),
        })
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        let path = self.path_for(stream);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn clear(&self, stream: &str) -> Result<(), CheckpointError> {
        match tokio::fs::remove_file(self.path_for(stream)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Undecodable content counts as no checkpoint.
fn parse_checkpoint(path: &Path, raw: &[u8]) -> Option<ResumeToken> {
    match serde_json::from_slice::<FileCheckpoint>(raw) {
        Ok(checkpoint) => Some(ResumeToken::new(checkpoint.token)).filter(|t| !t.is_empty()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable checkpoint file");
            None
        }
    }
}
