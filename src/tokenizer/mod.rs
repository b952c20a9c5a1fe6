mod delimiter;
mod scan;

#[cfg(test)]
mod tests;

pub use delimiter::{Delimiter, Pattern};

use scan::PatternScan;
use std::mem;

/// Streaming word splitter.
///
/// Input arrives as arbitrary text fragments. Everything up to the last
/// delimiter seen so far is complete and gets emitted; the remainder stays in
/// a pending buffer until a later fragment or [`Tokenizer::flush`] settles it.
/// The emitted sequence does not depend on how the input was fragmented.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    delimiter: Delimiter,
    pending: String,
    scan: PatternScan,
}

impl Tokenizer {
    pub fn new(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            pending: String::new(),
            scan: PatternScan::default(),
        }
    }

    /// Append a fragment and return the words it completed
    pub fn feed(&mut self, fragment: &str) -> Tokens<'_> {
        let fresh_from = self.pending.len();
        self.pending.push_str(fragment);

        let boundary = match &self.delimiter {
            Delimiter::Pattern(pattern) => self.scan.advance(pattern, self.pending.as_bytes()),
            other => other.last_boundary(&self.pending, fresh_from),
        };

        let ready = match boundary {
            Some(end) => {
                self.scan.rebase(end);
                let rest = self.pending.split_off(end);
                mem::replace(&mut self.pending, rest)
            }
            None => String::new(),
        };

        Tokens {
            delimiter: &self.delimiter,
            text: ready,
            pos: 0,
        }
    }

    /// Emit whatever is still pending. Call once, after the last fragment.
    ///
    /// Yields at most one word, except for pattern delimiters whose matches
    /// were held back in case the next fragment changed them.
    pub fn flush(&mut self) -> Tokens<'_> {
        self.scan = PatternScan::default();
        Tokens {
            delimiter: &self.delimiter,
            text: mem::take(&mut self.pending),
            pos: 0,
        }
    }

    /// Bytes held back waiting for a boundary
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }
}

/// Lazy iterator over the complete words produced by one [`Tokenizer::feed`] call
#[derive(Debug)]
pub struct Tokens<'a> {
    delimiter: &'a Delimiter,
    text: String,
    pos: usize,
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.text.len() {
            let (piece_end, next_pos) = match self.delimiter.find_at(&self.text, self.pos) {
                Some((start, end)) if end > self.pos => (start, end),
                _ => (self.text.len(), self.text.len()),
            };

            let start = self.pos;
            self.pos = next_pos;

            // consecutive delimiters produce empty pieces
            if piece_end > start {
                return Some(self.text[start..piece_end].to_owned());
            }
        }
        None
    }
}
