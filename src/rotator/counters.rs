use serde::Serialize;

/// Running counters of one run, copied out on demand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Words written across all chunks
    pub words: u64,
    /// Chunk files created
    pub chunks: u64,
    /// Input bytes handed to the pipeline
    pub bytes_consumed: u64,
    /// Bytes written to chunk files, delimiters and terminators included
    pub bytes_written: u64,
    /// Bytes buffered right now: pending partial word plus unflushed output
    pub buffered_bytes: u64,
    /// High-water mark of `buffered_bytes`
    pub peak_buffered_bytes: u64,
    /// Chunk closes started but not yet confirmed
    pub in_flight_closes: usize,
}

impl Snapshot {
    pub(crate) fn observe_buffered(&mut self, bytes: u64) {
        self.buffered_bytes = bytes;
        self.peak_buffered_bytes = self.peak_buffered_bytes.max(bytes);
    }
}
