mod file;


pub use file::ConfigFile;

use crate::encoding::Encoding;
use crate::error::ConfigError;
use crate::tokenizer::Delimiter;
use std::path::{Path, PathBuf};

/// Words per chunk when none is configured
pub const DEFAULT_WORDS_PER_CHUNK: u64 = 1000;

/// First chunk index (`notes_0001.txt`)
pub const DEFAULT_START_INDEX: u64 = 1;

/// Zero padding applied to chunk indices
pub const DEFAULT_INDEX_WIDTH: usize = 4;

/// Widest padding accepted; `u64::MAX` has 20 digits
pub const MAX_INDEX_WIDTH: usize = 20;

pub const DEFAULT_EXTENSION: &str = ".txt";
pub const DEFAULT_OUTPUT_DELIMITER: &str = " ";
pub const DEFAULT_WRITE_BUFFER: usize = 64 * 1024;
pub const DEFAULT_MAX_INFLIGHT_CLOSES: usize = 4;
pub const DEFAULT_FRAGMENT_SIZE: usize = 64 * 1024;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Immutable settings for one chunking run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub(crate) delimiter: Delimiter,
    pub(crate) words_per_chunk: u64,
    pub(crate) out_dir: PathBuf,
    pub(crate) stem: String,
    pub(crate) extension: String,
    pub(crate) encoding: Encoding,
    pub(crate) output_delimiter: String,
    pub(crate) start_index: u64,
    pub(crate) index_width: usize,
    pub(crate) write_buffer_size: usize,
    pub(crate) max_inflight_closes: usize,
    pub(crate) fragment_size: usize,
    pub(crate) channel_capacity: usize,
}

impl PipelineConfig {
    pub fn builder(stem: impl Into<String>) -> PipelineConfigBuilder {
        PipelineConfigBuilder::new(stem)
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    pub fn words_per_chunk(&self) -> u64 {
        self.words_per_chunk
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn output_delimiter(&self) -> &str {
        &self.output_delimiter
    }

    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    /// File name of the chunk with the given index, e.g. `notes_0003.txt`
    pub fn chunk_file_name(&self, index: u64) -> String {
        format!(
            "{}_{:0width$}{}",
            self.stem,
            index,
            self.extension,
            width = self.index_width
        )
    }

    pub fn chunk_path(&self, index: u64) -> PathBuf {
        self.out_dir.join(self.chunk_file_name(index))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.words_per_chunk == 0 {
            return Err(ConfigError::InvalidThreshold);
        }

        if self.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDirectory);
        }

        if self.stem.is_empty() {
            return Err(ConfigError::EmptyStem);
        }
        if self.stem.contains(['/', '\\']) {
            return Err(ConfigError::InvalidStem(self.stem.clone()));
        }

        validate_extension(&self.extension)?;
        self.delimiter.validate()?;

        if self.index_width > MAX_INDEX_WIDTH {
            return Err(ConfigError::IndexWidthTooLarge {
                width: self.index_width,
                max: MAX_INDEX_WIDTH,
            });
        }

        let limits = [
            ("write_buffer_size", self.write_buffer_size),
            ("max_inflight_closes", self.max_inflight_closes),
            ("fragment_size", self.fragment_size),
            ("channel_capacity", self.channel_capacity),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::ZeroLimit { name });
            }
        }

        Ok(())
    }
}

/// A dot followed by one or more dot-separated segments: `.txt`, `.tar.gz`
fn validate_extension(ext: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidExtension(ext.to_string());

    let body = ext.strip_prefix('.').ok_or_else(invalid)?;
    let well_formed = !body.is_empty()
        && body.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| !c.is_whitespace() && !c.is_control() && c != '/' && c != '\\')
        });

    if well_formed {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Builder for [`PipelineConfig`]
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Start from defaults, writing `{stem}_NNNN.txt` into `./chunks`
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            config: PipelineConfig {
                delimiter: Delimiter::Whitespace,
                words_per_chunk: DEFAULT_WORDS_PER_CHUNK,
                out_dir: PathBuf::from("chunks"),
                stem: stem.into(),
                extension: DEFAULT_EXTENSION.to_string(),
                encoding: Encoding::utf8(),
                output_delimiter: DEFAULT_OUTPUT_DELIMITER.to_string(),
                start_index: DEFAULT_START_INDEX,
                index_width: DEFAULT_INDEX_WIDTH,
                write_buffer_size: DEFAULT_WRITE_BUFFER,
                max_inflight_closes: DEFAULT_MAX_INFLIGHT_CLOSES,
                fragment_size: DEFAULT_FRAGMENT_SIZE,
                channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            },
        }
    }

    pub fn delimiter(mut self, delimiter: Delimiter) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    pub fn words_per_chunk(mut self, words: u64) -> Self {
        self.config.words_per_chunk = words;
        self
    }

    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.out_dir = dir.into();
        self
    }

    pub fn stem(mut self, stem: impl Into<String>) -> Self {
        self.config.stem = stem.into();
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.config.extension = ext.into();
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    pub fn output_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.output_delimiter = delimiter.into();
        self
    }

    pub fn start_index(mut self, index: u64) -> Self {
        self.config.start_index = index;
        self
    }

    pub fn index_width(mut self, width: usize) -> Self {
        self.config.index_width = width;
        self
    }

    /// Capacity of the buffered writer in front of each chunk file
    pub fn write_buffer_size(mut self, bytes: usize) -> Self {
        self.config.write_buffer_size = bytes;
        self
    }

    /// Closes allowed in flight before rotation waits for the oldest one
    pub fn max_inflight_closes(mut self, closes: usize) -> Self {
        self.config.max_inflight_closes = closes;
        self
    }

    /// Read size used when pulling from an input stream
    pub fn fragment_size(mut self, bytes: usize) -> Self {
        self.config.fragment_size = bytes;
        self
    }

    /// Fragments buffered between the reader task and the pipeline
    pub fn channel_capacity(mut self, fragments: usize) -> Self {
        self.config.channel_capacity = fragments;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
