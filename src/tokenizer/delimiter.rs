use crate::error::ConfigError;
use regex::Regex;
use regex_automata::dfa::dense;
use regex_automata::nfa::thompson;
use std::sync::Arc;

/// How the input stream is split into words
#[derive(Debug, Clone, Default)]
pub enum Delimiter {
    /// Runs of Unicode whitespace
    #[default]
    Whitespace,
    /// An exact, non-empty separator string
    Literal(String),
    /// A regular expression, see [`Delimiter::pattern`]
    Pattern(Pattern),
}

/// A compiled pattern delimiter.
///
/// The regex splits settled text; the DFA decides, byte by byte, when a
/// match can no longer change as more input arrives.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    dfa: Arc<dense::DFA<Vec<u32>>>,
}

impl Pattern {
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }

    pub(crate) fn dfa(&self) -> &dense::DFA<Vec<u32>> {
        &self.dfa
    }
}

impl Delimiter {
    pub fn literal(separator: impl Into<String>) -> Result<Self, ConfigError> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(ConfigError::InvalidDelimiter(
                "literal separator must not be empty".to_string(),
            ));
        }
        Ok(Delimiter::Literal(separator))
    }

    /// Compile a regex delimiter.
    ///
    /// The pattern must not match the empty string and must not use anchors
    /// or word boundaries (`^`, `$`, `\b`): a stream has no stable line or
    /// word context at fragment edges.
    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        let invalid =
            |reason: String| ConfigError::InvalidDelimiter(format!("{pattern:?}: {reason}"));

        let regex = Regex::new(pattern).map_err(|e| invalid(e.to_string()))?;
        let nfa = thompson::NFA::new(pattern).map_err(|e| invalid(e.to_string()))?;
        if nfa.has_empty() {
            return Err(invalid("matches the empty string".to_string()));
        }
        if !nfa.look_set_any().is_empty() {
            return Err(invalid("anchors and word boundaries are not supported".to_string()));
        }
        let dfa = dense::DFA::new(pattern).map_err(|e| invalid(e.to_string()))?;

        Ok(Delimiter::Pattern(Pattern {
            regex,
            dfa: Arc::new(dfa),
        }))
    }

    /// Re-checks a delimiter that was constructed directly from its variants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Delimiter::Literal(sep) => Delimiter::literal(sep.as_str()).map(|_| ()),
            Delimiter::Whitespace | Delimiter::Pattern(_) => Ok(()),
        }
    }

    /// Human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            Delimiter::Whitespace => "whitespace".to_string(),
            Delimiter::Literal(s) => format!("literal {s:?}"),
            Delimiter::Pattern(p) => format!("pattern /{}/", p.as_str()),
        }
    }

    /// First match starting at or after `from`, as a byte range.
    pub(crate) fn find_at(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        match self {
            Delimiter::Whitespace => {
                let (offset, _) = text[from..]
                    .char_indices()
                    .find(|(_, c)| c.is_whitespace())?;
                let start = from + offset;
                let run: usize = text[start..]
                    .chars()
                    .take_while(|c| c.is_whitespace())
                    .map(char::len_utf8)
                    .sum();
                Some((start, start + run))
            }
            Delimiter::Literal(sep) => text[from..]
                .find(sep.as_str())
                .map(|offset| (from + offset, from + offset + sep.len())),
            Delimiter::Pattern(p) => p.regex().find_at(text, from).map(|m| (m.start(), m.end())),
        }
    }

    /// End offset of the last match in `text`, for the fixed-width variants.
    ///
    /// `fresh_from` is where newly appended bytes begin. The caller guarantees
    /// that `text[..fresh_from]` holds no complete match, so only the tail is
    /// rescanned. Patterns are settled incrementally by the tokenizer's
    /// scanner instead and always yield `None` here.
    pub(crate) fn last_boundary(&self, text: &str, fresh_from: usize) -> Option<usize> {
        match self {
            Delimiter::Whitespace => text[fresh_from..]
                .char_indices()
                .rev()
                .find(|(_, c)| c.is_whitespace())
                .map(|(i, c)| fresh_from + i + c.len_utf8()),
            Delimiter::Literal(sep) => {
                let mut from = fresh_from.saturating_sub(sep.len().saturating_sub(1));
                while !text.is_char_boundary(from) {
                    from -= 1;
                }
                text[from..]
                    .match_indices(sep.as_str())
                    .last()
                    .map(|(i, m)| from + i + m.len())
            }
            Delimiter::Pattern(_) => None,
        }
    }
}
