mod chunk;
mod closer;
mod counters;


pub use counters::Snapshot;

use crate::config::PipelineConfig;
use crate::error::ChunkError;
use crate::observer::{ChunkObserver, Observers};
use chunk::{ChunkState, OpenChunk};
use closer::CloseQueue;
use std::io;
use std::mem;
use std::sync::Arc;
use tokio::fs::{self, File};
use tracing::{debug, info, warn};

/// Record terminator appended to every chunk file
const TERMINATOR: &str = "\n";

/// Writes words into numbered chunk files, rotating every
/// `words_per_chunk` words.
///
/// Files are created lazily: a chunk exists only once a word arrives for it.
/// I/O failures are fatal to the run; observer failures never are.
pub struct Rotator {
    config: PipelineConfig,
    observers: Observers,
    state: ChunkState,
    next_index: u64,
    separator: Vec<u8>,
    terminator: Vec<u8>,
    closes: CloseQueue,
    counters: Snapshot,
    pending_input: u64,
}

impl Rotator {
    pub fn new(config: PipelineConfig) -> Self {
        let separator = config.encoding.encode(&config.output_delimiter).into_owned();
        let terminator = config.encoding.encode(TERMINATOR).into_owned();

        Self {
            next_index: config.start_index,
            closes: CloseQueue::new(config.max_inflight_closes),
            observers: Observers::default(),
            state: ChunkState::Uninitialized,
            separator,
            terminator,
            counters: Snapshot::default(),
            pending_input: 0,
            config,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ChunkObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ChunkObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current counters. Never waits on I/O.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            in_flight_closes: self.closes.len(),
            ..self.counters
        }
    }

    /// Account for input handed to the pipeline and the partial word the
    /// tokenizer is still holding.
    pub fn record_input(&mut self, consumed: usize, pending: usize) {
        self.counters.bytes_consumed += consumed as u64;
        self.pending_input = pending as u64;
        self.refresh_buffered();
    }

    pub async fn on_token(&mut self, token: &str) -> Result<(), ChunkError> {
        if let ChunkState::Uninitialized = self.state {
            match self.open_chunk().await {
                Ok(chunk) => self.state = ChunkState::Open(chunk),
                Err(e) => return Err(self.fail(e).await),
            }
        }

        let word = self.config.encoding.encode(token);
        let written = match &mut self.state {
            ChunkState::Open(chunk) => chunk
                .write_word(&word, &self.separator)
                .await
                .map(|bytes| (bytes, chunk.words)),
            _ => return Err(ChunkError::Finished),
        };

        let (bytes, chunk_words) = match written {
            Ok(w) => w,
            Err(source) => return Err(self.fail_write(source).await),
        };

        self.counters.words += 1;
        self.counters.bytes_written += bytes;

        if chunk_words == 1 {
            if let ChunkState::Open(chunk) = &self.state {
                self.observers.chunk_opened(&chunk.path);
            }
        }
        self.observers.progress(self.counters.words);
        self.refresh_buffered();

        if self.counters.words % self.config.words_per_chunk == 0 {
            self.rotate().await?;
        }
        Ok(())
    }

    /// Close the open chunk, if any, and wait for every pending close.
    pub async fn on_end_of_input(&mut self) -> Result<Snapshot, ChunkError> {
        match mem::replace(&mut self.state, ChunkState::Closed) {
            ChunkState::Open(chunk) => self.close_chunk(chunk).await?,
            ChunkState::Uninitialized => {}
            ChunkState::Closed => return Err(ChunkError::Finished),
        }

        if let Err(e) = self.closes.drain(&self.observers).await {
            return Err(self.fail(e).await);
        }
        self.refresh_buffered();

        info!(
            stem = %self.config.stem,
            words = self.counters.words,
            chunks = self.counters.chunks,
            "Chunking complete"
        );
        Ok(self.snapshot())
    }

    /// Stop after a failure elsewhere (e.g. the input stream). The open chunk
    /// is closed best-effort with no close notification; queued closes are
    /// still awaited.
    pub async fn abort(&mut self) {
        self.shut_down().await;
    }

    async fn open_chunk(&mut self) -> Result<OpenChunk, ChunkError> {
        let dir = self.config.out_dir();
        fs::create_dir_all(dir)
            .await
            .map_err(|source| ChunkError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;

        let index = self.next_index;
        let path = self.config.chunk_path(index);
        let file = File::create(&path)
            .await
            .map_err(|source| ChunkError::Output {
                path: path.clone(),
                source,
            })?;

        self.next_index += 1;
        self.counters.chunks += 1;
        debug!(index, path = %path.display(), "Opened chunk");

        Ok(OpenChunk::new(index, path, file, self.config.write_buffer_size))
    }

    async fn rotate(&mut self) -> Result<(), ChunkError> {
        match mem::replace(&mut self.state, ChunkState::Uninitialized) {
            ChunkState::Open(chunk) => self.close_chunk(chunk).await,
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// Terminate the chunk on the control flow, then hand the flush and close
    /// to a background task tracked by the close queue.
    async fn close_chunk(&mut self, mut chunk: OpenChunk) -> Result<(), ChunkError> {
        match chunk.write_terminator(&self.terminator).await {
            Ok(bytes) => self.counters.bytes_written += bytes,
            Err(source) => {
                let path = chunk.path.clone();
                if let Err(e) = chunk.finish().await {
                    debug!(
                        path = %path.display(),
                        error = %e,
                        "Close after failed write also failed"
                    );
                }
                return Err(self.fail(ChunkError::Output { path, source }).await);
            }
        }

        let index = chunk.index;
        let path = chunk.path.clone();
        let handle = tokio::spawn(chunk.finish());

        if let Err(e) = self.closes.push(index, path, handle, &self.observers).await {
            return Err(self.fail(e).await);
        }
        self.refresh_buffered();
        Ok(())
    }

    async fn fail_write(&mut self, source: io::Error) -> ChunkError {
        let path = match &self.state {
            ChunkState::Open(chunk) => chunk.path.clone(),
            _ => self.config.out_dir.clone(),
        };
        self.fail(ChunkError::Output { path, source }).await
    }

    async fn fail(&mut self, error: ChunkError) -> ChunkError {
        warn!(stem = %self.config.stem, error = %error, "Chunking failed");
        self.shut_down().await;
        error
    }

    async fn shut_down(&mut self) {
        if let ChunkState::Open(chunk) = mem::replace(&mut self.state, ChunkState::Closed) {
            let path = chunk.path.clone();
            if let Err(e) = chunk.finish().await {
                debug!(path = %path.display(), error = %e, "Best-effort close failed");
            }
        }
        if let Err(e) = self.closes.drain(&self.observers).await {
            debug!(error = %e, "Pending close failed during shutdown");
        }
    }

    fn refresh_buffered(&mut self) {
        let unflushed = match &self.state {
            ChunkState::Open(chunk) => chunk.buffered() as u64,
            _ => 0,
        };
        self.counters.observe_buffered(self.pending_input + unflushed);
    }
}
