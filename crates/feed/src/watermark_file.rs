//! JSON file-backed watermark store with atomic writes.

use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    tokio::fs,
    tracing::debug,
};

use crate::{Error, Result, watermark::WatermarkStore};

#[derive(Debug, Serialize, Deserialize)]
struct StoredWatermark {
    since: DateTime<Utc>,
}

/// One small JSON file per channel: `<dir>/<channel>.json`.
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    dir: PathBuf,
}

impl FileWatermarkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, channel: &str) -> Result<PathBuf> {
        if channel.is_empty()
            || channel.starts_with('.')
            || channel.contains(['/', '\\'])
        {
            return Err(Error::message(format!(
                "invalid channel name for watermark file: {channel:?}"
            )));
        }
        Ok(self.dir.join(format!("{channel}.json")))
    }
}

#[async_trait]
impl WatermarkStore for FileWatermarkStore {
    async fn load(&self, channel: &str) -> Result<Option<DateTime<Utc>>> {
        let path = self.path_for(channel)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).await?;
        let stored: StoredWatermark = serde_json::from_str(&data)?;
        Ok(Some(stored.since))
    }

    /// Write to a temp file, then rename over the target.
    async fn save(&self, channel: &str, since: DateTime<Utc>) -> Result<()> {
        let path = self.path_for(channel)?;
        fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_string(&StoredWatermark { since })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;

        debug!(channel, path = %path.display(), since = %since, "watermark saved");
        Ok(())
    }
}
