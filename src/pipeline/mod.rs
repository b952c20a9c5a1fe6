
use crate::config::PipelineConfig;
use crate::encoding::Decoder;
use crate::error::ChunkError;
use crate::observer::ChunkObserver;
use crate::rotator::{Rotator, Snapshot};
use crate::source;
use crate::tokenizer::Tokenizer;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{debug, warn};

/// Decoder, tokenizer and rotator composed into one push-driven run.
///
/// Feed fragments with [`push`](Self::push) and end with
/// [`finish`](Self::finish), or hand a whole reader to [`run`](Self::run).
pub struct Pipeline {
    decoder: Decoder,
    tokenizer: Tokenizer,
    rotator: Rotator,
    fragment_size: usize,
    channel_capacity: usize,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            decoder: config.encoding.decoder(),
            tokenizer: Tokenizer::new(config.delimiter.clone()),
            fragment_size: config.fragment_size,
            channel_capacity: config.channel_capacity,
            rotator: Rotator::new(config),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ChunkObserver>) -> Self {
        self.rotator.add_observer(observer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        self.rotator.config()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.rotator.snapshot()
    }

    /// Decode and tokenize one fragment of raw input, writing every word it
    /// completes. Returns once those writes have been accepted by the output.
    pub async fn push(&mut self, bytes: &[u8]) -> Result<(), ChunkError> {
        let text = self.decoder.decode(bytes);
        self.feed(&text, bytes.len()).await
    }

    /// Push already-decoded text
    pub async fn push_str(&mut self, text: &str) -> Result<(), ChunkError> {
        self.feed(text, text.len()).await
    }

    /// Flush the held partial word and close the last chunk. Resolves after
    /// every chunk close has completed.
    pub async fn finish(mut self) -> Result<Snapshot, ChunkError> {
        let tail = self.decoder.finish();
        if !tail.is_empty() {
            self.feed(&tail, 0).await?;
        }

        self.rotator.record_input(0, 0);
        for word in self.tokenizer.flush() {
            self.rotator.on_token(&word).await?;
        }
        self.rotator.on_end_of_input().await
    }

    /// Drive the whole run from `reader`.
    ///
    /// Reading happens on its own task and is bounded by the channel, so a
    /// slow output stalls the reader. An input error ends the run at once:
    /// the held partial word is dropped and the open chunk is not terminated.
    pub async fn run<R>(mut self, reader: R) -> Result<Snapshot, ChunkError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        debug!(
            stem = %self.config().stem(),
            delimiter = %self.tokenizer.delimiter().describe(),
            encoding = %self.config().encoding(),
            words_per_chunk = self.config().words_per_chunk(),
            "Starting run"
        );
        let mut fragments = source::spawn_reader(reader, self.fragment_size, self.channel_capacity);

        while let Some(fragment) = fragments.recv().await {
            match fragment {
                Ok(bytes) => self.push(&bytes).await?,
                Err(e) => {
                    warn!(stem = %self.config().stem(), error = %e, "Input failed");
                    self.rotator.abort().await;
                    return Err(ChunkError::Input(e));
                }
            }
        }

        debug!(stem = %self.config().stem(), "Input exhausted");
        self.finish().await
    }

    async fn feed(&mut self, text: &str, consumed: usize) -> Result<(), ChunkError> {
        for word in self.tokenizer.feed(text) {
            self.rotator.on_token(&word).await?;
        }
        let pending = self.tokenizer.pending_len();
        self.rotator.record_input(consumed, pending);
        Ok(())
    }
}
