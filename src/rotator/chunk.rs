use std::io;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Lifecycle of the current chunk slot
#[derive(Debug)]
pub(crate) enum ChunkState {
    /// No file yet for the next index
    Uninitialized,
    /// File created and accepting words
    Open(OpenChunk),
    /// End of input reached or the run failed
    Closed,
}

#[derive(Debug)]
pub(crate) struct OpenChunk {
    pub(crate) index: u64,
    pub(crate) path: PathBuf,
    pub(crate) words: u64,
    writer: BufWriter<File>,
}

impl OpenChunk {
    pub(crate) fn new(index: u64, path: PathBuf, file: File, buffer: usize) -> Self {
        Self {
            index,
            path,
            words: 0,
            writer: BufWriter::with_capacity(buffer, file),
        }
    }

    /// Write one word, preceded by `separator` unless it is the first.
    /// Returns the bytes handed to the writer.
    pub(crate) async fn write_word(&mut self, word: &[u8], separator: &[u8]) -> io::Result<u64> {
        let mut written = word.len();
        if self.words > 0 {
            self.writer.write_all(separator).await?;
            written += separator.len();
        }
        self.writer.write_all(word).await?;
        self.words += 1;
        Ok(written as u64)
    }

    pub(crate) async fn write_terminator(&mut self, terminator: &[u8]) -> io::Result<u64> {
        self.writer.write_all(terminator).await?;
        Ok(terminator.len() as u64)
    }

    /// Bytes sitting in the write buffer
    pub(crate) fn buffered(&self) -> usize {
        self.writer.buffer().len()
    }

    /// Flush and close the file
    pub(crate) async fn finish(mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}
