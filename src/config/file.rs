use super::PipelineConfigBuilder;
use crate::encoding::Encoding;
use crate::error::ConfigError;
use crate::tokenizer::Delimiter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional TOML overrides, e.g. `wordchunk.toml`:
///
/// ```toml
/// words = 5000
/// out_dir = "out"
/// pattern = "[,;]\\s*"
/// output_delimiter = "\n"
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub words: Option<u64>,
    pub out_dir: Option<PathBuf>,
    pub extension: Option<String>,
    /// Literal separator
    pub delimiter: Option<String>,
    /// Regex separator
    pub pattern: Option<String>,
    pub output_delimiter: Option<String>,
    pub encoding: Option<Encoding>,
    pub start_index: Option<u64>,
    pub index_width: Option<usize>,
    pub write_buffer_size: Option<usize>,
    pub max_inflight_closes: Option<usize>,
    pub fragment_size: Option<usize>,
    pub channel_capacity: Option<usize>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;

        Self::parse(&text).map_err(|e| match e {
            ConfigError::File { cause, .. } => ConfigError::File {
                path: path.to_path_buf(),
                cause,
            },
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::File {
            path: PathBuf::new(),
            cause: e.to_string(),
        })
    }

    /// The configured delimiter, if any. Setting both forms is an error.
    pub fn delimiter(&self) -> Result<Option<Delimiter>, ConfigError> {
        match (&self.delimiter, &self.pattern) {
            (Some(_), Some(_)) => Err(ConfigError::InvalidDelimiter(
                "set either `delimiter` or `pattern`, not both".to_string(),
            )),
            (Some(literal), None) => Delimiter::literal(literal.as_str()).map(Some),
            (None, Some(pattern)) => Delimiter::pattern(pattern).map(Some),
            (None, None) => Ok(None),
        }
    }

    /// Layer the values present in the file onto `builder`
    pub fn apply(
        &self,
        mut builder: PipelineConfigBuilder,
    ) -> Result<PipelineConfigBuilder, ConfigError> {
        if let Some(delimiter) = self.delimiter()? {
            builder = builder.delimiter(delimiter);
        }
        if let Some(words) = self.words {
            builder = builder.words_per_chunk(words);
        }
        if let Some(dir) = &self.out_dir {
            builder = builder.out_dir(dir.clone());
        }
        if let Some(ext) = &self.extension {
            builder = builder.extension(ext.clone());
        }
        if let Some(delimiter) = &self.output_delimiter {
            builder = builder.output_delimiter(delimiter.clone());
        }
        if let Some(encoding) = self.encoding {
            builder = builder.encoding(encoding);
        }
        if let Some(index) = self.start_index {
            builder = builder.start_index(index);
        }
        if let Some(width) = self.index_width {
            builder = builder.index_width(width);
        }
        if let Some(bytes) = self.write_buffer_size {
            builder = builder.write_buffer_size(bytes);
        }
        if let Some(closes) = self.max_inflight_closes {
            builder = builder.max_inflight_closes(closes);
        }
        if let Some(bytes) = self.fragment_size {
            builder = builder.fragment_size(bytes);
        }
        if let Some(fragments) = self.channel_capacity {
            builder = builder.channel_capacity(fragments);
        }
        Ok(builder)
    }
}
