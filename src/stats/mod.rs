//! Derived run statistics. Nothing here feeds back into the pipeline.


use crate::error::HookError;
use crate::observer::ChunkObserver;
use crate::rotator::Snapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Default)]
struct StatsState {
    opened: u64,
    closed: u64,
    last_progress: u64,
    /// Open instants of chunks not yet closed, oldest first
    open_since: VecDeque<Instant>,
    total_latency: Duration,
}

/// Observer that timestamps lifecycle events.
///
/// Closes arrive in the same order as opens, so the oldest open instant
/// always belongs to the chunk being closed.
#[derive(Default)]
pub struct StatsObserver {
    state: Mutex<StatsState>,
}

/// What a [`StatsObserver`] saw over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ObservedStats {
    pub chunks_opened: u64,
    pub chunks_closed: u64,
    pub last_progress: u64,
    /// Mean time from first word to confirmed close, over closed chunks
    pub mean_chunk_latency_ms: f64,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> ObservedStats {
        let state = self.lock();
        let mean_chunk_latency_ms = if state.closed == 0 {
            0.0
        } else {
            state.total_latency.as_secs_f64() * 1000.0 / state.closed as f64
        };
        ObservedStats {
            chunks_opened: state.opened,
            chunks_closed: state.closed,
            last_progress: state.last_progress,
            mean_chunk_latency_ms,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatsState> {
        // a panic elsewhere leaves plain counters behind, still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChunkObserver for StatsObserver {
    fn on_chunk_open(&self, _path: &Path) -> Result<(), HookError> {
        let mut state = self.lock();
        state.opened += 1;
        state.open_since.push_back(Instant::now());
        Ok(())
    }

    fn on_chunk_close(&self, _path: &Path) -> Result<(), HookError> {
        let mut state = self.lock();
        state.closed += 1;
        if let Some(opened_at) = state.open_since.pop_front() {
            state.total_latency += opened_at.elapsed();
        }
        Ok(())
    }

    fn on_progress(&self, words: u64) -> Result<(), HookError> {
        self.lock().last_progress = words;
        Ok(())
    }
}

/// Summary of one finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u128,
    pub words: u64,
    pub chunks: u64,
    pub bytes_consumed: u64,
    pub bytes_written: u64,
    pub peak_buffered_bytes: u64,
    pub words_per_sec: f64,
    pub bytes_per_sec: f64,
    pub chunks_per_sec: f64,
    pub mean_words_per_chunk: f64,
    pub mean_chunk_latency_ms: f64,
}

impl RunReport {
    /// Derive rates from the final counters. `elapsed` is the wall time of
    /// the run, ending now.
    pub fn compute(snapshot: &Snapshot, observed: &ObservedStats, elapsed: Duration) -> Self {
        let since =
            chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());
        let secs = elapsed.as_secs_f64();

        Self {
            started_at: Utc::now() - since,
            elapsed_ms: elapsed.as_millis(),
            words: snapshot.words,
            chunks: snapshot.chunks,
            bytes_consumed: snapshot.bytes_consumed,
            bytes_written: snapshot.bytes_written,
            peak_buffered_bytes: snapshot.peak_buffered_bytes,
            words_per_sec: rate(snapshot.words, secs),
            bytes_per_sec: rate(snapshot.bytes_consumed, secs),
            chunks_per_sec: rate(snapshot.chunks, secs),
            mean_words_per_chunk: if snapshot.chunks == 0 {
                0.0
            } else {
                snapshot.words as f64 / snapshot.chunks as f64
            },
            mean_chunk_latency_ms: observed.mean_chunk_latency_ms,
        }
    }
}

fn rate(count: u64, secs: f64) -> f64 {
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}
