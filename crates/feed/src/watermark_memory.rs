//! In-memory watermark store. Nothing survives a restart.

use std::{collections::HashMap, sync::Mutex};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
};

use crate::{Result, watermark::WatermarkStore};

/// Store backed by a `HashMap`. Used when persistence is disabled.
#[derive(Debug, Default)]
pub struct MemoryWatermarkStore {
    watermarks: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WatermarkStore for MemoryWatermarkStore {
    async fn load(&self, channel: &str) -> Result<Option<DateTime<Utc>>> {
        let watermarks = self.watermarks.lock().unwrap_or_else(|e| e.into_inner());
        Ok(watermarks.get(channel).copied())
    }

    async fn save(&self, channel: &str, since: DateTime<Utc>) -> Result<()> {
        let mut watermarks = self.watermarks.lock().unwrap_or_else(|e| e.into_inner());
        watermarks.insert(channel.to_string(), since);
        Ok(())
    }
}
