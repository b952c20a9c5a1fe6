use super::ChunkObserver;
use crate::error::HookError;
use std::path::Path;
use tracing::{debug, info};

/// Logs a progress line every `every` words and each finished chunk
pub struct ProgressLogger {
    label: String,
    every: u64,
}

impl ProgressLogger {
    pub fn new(label: impl Into<String>, every: u64) -> Self {
        Self {
            label: label.into(),
            every: every.max(1),
        }
    }
}

impl ChunkObserver for ProgressLogger {
    fn on_chunk_close(&self, path: &Path) -> Result<(), HookError> {
        debug!(input = %self.label, chunk = %path.display(), "Chunk written");
        Ok(())
    }

    fn on_progress(&self, words: u64) -> Result<(), HookError> {
        if words % self.every == 0 {
            info!(input = %self.label, words, "Progress");
        }
        Ok(())
    }
}
