mod progress;

#[cfg(test)]
mod tests;

pub use progress::ProgressLogger;

use crate::error::HookError;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Receives chunk lifecycle notifications from the rotator.
///
/// Every method is best-effort: returned errors and panics are logged and
/// discarded, and never change which files get written.
pub trait ChunkObserver: Send + Sync {
    /// First word written into a new chunk file
    fn on_chunk_open(&self, _path: &Path) -> Result<(), HookError> {
        Ok(())
    }

    /// Chunk file fully flushed and closed
    fn on_chunk_close(&self, _path: &Path) -> Result<(), HookError> {
        Ok(())
    }

    /// Called after every word with the cumulative word count
    fn on_progress(&self, _words: u64) -> Result<(), HookError> {
        Ok(())
    }
}

type PathHook = Box<dyn Fn(&Path) -> Result<(), HookError> + Send + Sync>;
type ProgressHook = Box<dyn Fn(u64) -> Result<(), HookError> + Send + Sync>;

/// Closure-backed observer for callers that only care about some events
#[derive(Default)]
pub struct Callbacks {
    on_open: Option<PathHook>,
    on_close: Option<PathHook>,
    on_progress: Option<ProgressHook>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open(
        mut self,
        hook: impl Fn(&Path) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.on_open = Some(Box::new(hook));
        self
    }

    pub fn with_close(
        mut self,
        hook: impl Fn(&Path) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    pub fn with_progress(
        mut self,
        hook: impl Fn(u64) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(hook));
        self
    }
}

impl ChunkObserver for Callbacks {
    fn on_chunk_open(&self, path: &Path) -> Result<(), HookError> {
        self.on_open.as_ref().map_or(Ok(()), |hook| hook(path))
    }

    fn on_chunk_close(&self, path: &Path) -> Result<(), HookError> {
        self.on_close.as_ref().map_or(Ok(()), |hook| hook(path))
    }

    fn on_progress(&self, words: u64) -> Result<(), HookError> {
        self.on_progress.as_ref().map_or(Ok(()), |hook| hook(words))
    }
}

/// Fan-out to registered observers. This is the isolation boundary: nothing
/// an observer does propagates back into the rotator.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    list: Vec<Arc<dyn ChunkObserver>>,
}

impl Observers {
    pub(crate) fn push(&mut self, observer: Arc<dyn ChunkObserver>) {
        self.list.push(observer);
    }

    pub(crate) fn chunk_opened(&self, path: &Path) {
        self.dispatch("open", |o| o.on_chunk_open(path));
    }

    pub(crate) fn chunk_closed(&self, path: &Path) {
        self.dispatch("close", |o| o.on_chunk_close(path));
    }

    pub(crate) fn progress(&self, words: u64) {
        self.dispatch("progress", |o| o.on_progress(words));
    }

    fn dispatch(
        &self,
        event: &'static str,
        call: impl Fn(&dyn ChunkObserver) -> Result<(), HookError>,
    ) {
        for observer in &self.list {
            match panic::catch_unwind(AssertUnwindSafe(|| call(observer.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(event, error = %e, "Chunk observer failed"),
                Err(_) => warn!(event, "Chunk observer panicked"),
            }
        }
    }
}
