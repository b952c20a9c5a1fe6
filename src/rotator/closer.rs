use crate::error::ChunkError;
use crate::observer::Observers;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::debug;

struct PendingClose {
    index: u64,
    path: PathBuf,
    handle: JoinHandle<io::Result<()>>,
}

/// Bounded FIFO of chunk closes running in the background.
///
/// Closes complete in any order, but they are confirmed (and observers told)
/// strictly in chunk order. When the queue is full the oldest close is awaited
/// before another one is queued.
pub(crate) struct CloseQueue {
    limit: usize,
    pending: VecDeque<PendingClose>,
}

impl CloseQueue {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            pending: VecDeque::with_capacity(limit.max(1)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) async fn push(
        &mut self,
        index: u64,
        path: PathBuf,
        handle: JoinHandle<io::Result<()>>,
        observers: &Observers,
    ) -> Result<(), ChunkError> {
        self.reap(observers).await?;
        while self.pending.len() >= self.limit {
            self.confirm_oldest(observers).await?;
        }
        self.pending.push_back(PendingClose {
            index,
            path,
            handle,
        });
        Ok(())
    }

    /// Confirm closes at the front of the queue that already finished
    pub(crate) async fn reap(&mut self, observers: &Observers) -> Result<(), ChunkError> {
        while self.pending.front().is_some_and(|c| c.handle.is_finished()) {
            self.confirm_oldest(observers).await?;
        }
        Ok(())
    }

    /// Wait for every queued close. Keeps going after a failure so that all
    /// I/O has settled, then reports the first error.
    pub(crate) async fn drain(&mut self, observers: &Observers) -> Result<(), ChunkError> {
        let mut first_error = None;
        while !self.pending.is_empty() {
            if let Err(e) = self.confirm_oldest(observers).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn confirm_oldest(&mut self, observers: &Observers) -> Result<(), ChunkError> {
        let Some(close) = self.pending.pop_front() else {
            return Ok(());
        };

        let result = match close.handle.await {
            Ok(result) => result,
            Err(join_error) => Err(io::Error::other(join_error)),
        };

        match result {
            Ok(()) => {
                debug!(index = close.index, path = %close.path.display(), "Closed chunk");
                observers.chunk_closed(&close.path);
                Ok(())
            }
            Err(source) => Err(ChunkError::Output {
                path: close.path,
                source,
            }),
        }
    }
}
