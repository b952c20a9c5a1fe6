
use crate::error::ConfigError;
use encoding_rs::{CoderResult, EncoderResult, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Text encoding of the input stream and the chunk files.
///
/// Names are WHATWG encoding labels, so `latin1`, `iso-8859-1` and `ascii`
/// all mean windows-1252.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Encoding(&'static encoding_rs::Encoding);

impl Default for Encoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl Encoding {
    pub fn utf8() -> Self {
        Self(UTF_8)
    }

    pub fn windows_1252() -> Self {
        Self(WINDOWS_1252)
    }

    /// Resolve a label such as `utf-8` or `latin1`
    pub fn for_label(label: &str) -> Result<Self, ConfigError> {
        encoding_rs::Encoding::for_label(label.trim().as_bytes())
            .map(Self)
            .ok_or_else(|| ConfigError::UnknownEncoding(label.to_string()))
    }

    /// Canonical name, e.g. `UTF-8` or `windows-1252`
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Streaming decoder. Byte order marks are not sniffed; the input is
    /// taken to be in this encoding.
    pub fn decoder(self) -> Decoder {
        Decoder {
            encoding: self.0,
            inner: self.0.new_decoder_without_bom_handling(),
        }
    }

    /// Encode a word for output. Characters the encoding cannot represent
    /// are written as `?`. UTF-16 and `replacement` write UTF-8.
    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        let output = self.0.output_encoding();
        if output == UTF_8 || (output.is_ascii_compatible() && text.is_ascii()) {
            return Cow::Borrowed(text.as_bytes());
        }

        let mut encoder = output.new_encoder();
        let mut out = Vec::with_capacity(text.len());
        let mut buf = [0u8; 1024];
        let mut rest = text;
        loop {
            let (result, read, written) =
                encoder.encode_from_utf8_without_replacement(rest, &mut buf, true);
            out.extend_from_slice(&buf[..written]);
            rest = &rest[read..];
            match result {
                EncoderResult::InputEmpty => break,
                EncoderResult::OutputFull => {}
                EncoderResult::Unmappable(_) => out.push(b'?'),
            }
        }
        Cow::Owned(out)
    }
}

impl FromStr for Encoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_label(s)
    }
}

impl TryFrom<String> for Encoding {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Encoding> for String {
    fn from(value: Encoding) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental byte-to-text decoder.
///
/// A multi-byte sequence cut by a fragment boundary is completed by the next
/// call instead of being replaced. Malformed input decodes to U+FFFD.
pub struct Decoder {
    encoding: &'static encoding_rs::Encoding,
    inner: encoding_rs::Decoder,
}

impl Decoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.run(bytes, false)
    }

    /// Settle a dangling partial sequence at end of input. The decoder is
    /// reset and can be reused.
    pub fn finish(&mut self) -> String {
        let tail = self.run(&[], true);
        self.inner = self.encoding.new_decoder_without_bom_handling();
        tail
    }

    fn run(&mut self, bytes: &[u8], last: bool) -> String {
        let mut out = String::new();
        let mut rest = bytes;
        loop {
            let needed = self
                .inner
                .max_utf8_buffer_length(rest.len())
                .unwrap_or(rest.len() * 3 + 16);
            out.reserve(needed);

            let (result, read, _) = self.inner.decode_to_string(rest, &mut out, last);
            rest = &rest[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => {}
            }
        }
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("encoding", &self.encoding.name())
            .finish_non_exhaustive()
    }
}
