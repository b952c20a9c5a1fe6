use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a lifecycle observer. Always discarded by the rotator.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Word threshold must be a positive integer")]
    InvalidThreshold,

    #[error("Output directory must not be empty")]
    EmptyDirectory,

    #[error("File name stem must not be empty")]
    EmptyStem,

    #[error("File name stem {0:?} must not contain path separators")]
    InvalidStem(String),

    #[error("Invalid file extension {0:?}: expected a dot-prefixed suffix such as \".txt\"")]
    InvalidExtension(String),

    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(String),

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("{name} must be greater than 0")]
    ZeroLimit { name: &'static str },

    #[error("Index width {width} is too large (max: {max})")]
    IndexWidthTooLarge { width: usize, max: usize },

    #[error("Failed to read config file {path}: {cause}")]
    File { path: PathBuf, cause: String },
}

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create output directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write chunk {path}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input stream failed")]
    Input(#[source] std::io::Error),

    #[error("Pipeline already finished")]
    Finished,
}

/// Coarse classification of a [`ChunkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    CreateDir,
    Output,
    Input,
    Finished,
}

impl ChunkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChunkError::Config(_) => ErrorKind::Config,
            ChunkError::CreateDir { .. } => ErrorKind::CreateDir,
            ChunkError::Output { .. } => ErrorKind::Output,
            ChunkError::Input(_) => ErrorKind::Input,
            ChunkError::Finished => ErrorKind::Finished,
        }
    }
}
