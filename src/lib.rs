// Public API exports
pub mod config;
pub mod encoding;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod rotator;
pub mod source;
pub mod stats;
pub mod tokenizer;

// Re-export main types for convenience
pub use config::{ConfigFile, PipelineConfig, PipelineConfigBuilder};
pub use encoding::{Decoder, Encoding};
pub use error::{ChunkError, ConfigError, ErrorKind, HookError};

pub use tokenizer::{Delimiter, Pattern, Tokenizer, Tokens};

pub use observer::{Callbacks, ChunkObserver, ProgressLogger};
pub use rotator::{Rotator, Snapshot};

pub use pipeline::Pipeline;
pub use stats::{ObservedStats, RunReport, StatsObserver};
