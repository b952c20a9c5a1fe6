use super::delimiter::Pattern;
use regex_automata::dfa::{Automaton, dense};
use regex_automata::util::primitives::StateID;
use regex_automata::Input;

/// Incremental search state for a pattern delimiter over the pending buffer.
///
/// Every byte is stepped through the DFA once. A match is settled when the
/// DFA can make no further progress from it, so later input cannot extend it
/// or let a higher-priority alternative win. Offsets are relative to the
/// start of the pending buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct PatternScan {
    state: Option<StateID>,
    /// Next byte to step
    pos: usize,
    /// Where the current leftmost-first search began
    search_start: usize,
    /// End of the best match seen in the current search
    last_match: Option<usize>,
    /// The DFA gave up; the rest is left to `flush`
    stalled: bool,
}

impl PatternScan {
    /// Step over newly appended bytes and return the end of the last
    /// settled match, if any.
    pub(crate) fn advance(&mut self, pattern: &Pattern, text: &[u8]) -> Option<usize> {
        if self.stalled {
            return None;
        }
        let dfa = pattern.dfa();
        let mut sid = match self.state {
            Some(sid) => sid,
            None => match start_state(dfa, text, self.search_start) {
                Some(sid) => sid,
                None => {
                    self.stalled = true;
                    return None;
                }
            },
        };

        let mut boundary = None;
        while self.pos < text.len() {
            let at = self.pos;
            sid = dfa.next_state(sid, text[at]);
            self.pos += 1;

            if dfa.is_quit_state(sid) {
                self.stalled = true;
                break;
            }
            // match states are delayed by one byte: this match ended at `at`
            if dfa.is_match_state(sid) {
                self.last_match = Some(at);
            }
            let settled =
                dfa.is_dead_state(sid) || (dfa.is_match_state(sid) && dead_end(dfa, sid));
            if !settled {
                continue;
            }

            match self.last_match.take() {
                Some(end) if end > self.search_start => {
                    boundary = Some(end);
                    self.search_start = end;
                    self.pos = end;
                    match start_state(dfa, text, end) {
                        Some(next) => sid = next,
                        None => {
                            self.stalled = true;
                            break;
                        }
                    }
                }
                _ => {
                    self.stalled = true;
                    break;
                }
            }
        }

        self.state = Some(sid);
        boundary
    }

    /// Shift offsets after the first `consumed` bytes left the buffer
    pub(crate) fn rebase(&mut self, consumed: usize) {
        self.pos -= consumed;
        self.search_start -= consumed;
        self.last_match = self.last_match.map(|end| end - consumed);
    }
}

fn start_state(dfa: &dense::DFA<Vec<u32>>, text: &[u8], at: usize) -> Option<StateID> {
    dfa.start_state_forward(&Input::new(text).range(at..)).ok()
}

/// A match state with no live transitions: nothing can follow it
fn dead_end(dfa: &dense::DFA<Vec<u32>>, sid: StateID) -> bool {
    (0..=u8::MAX).all(|byte| dfa.is_dead_state(dfa.next_state(sid, byte)))
}

#[cfg(test)]
mod scan_tests {
    use super::*;
    use crate::tokenizer::Delimiter;

    fn compile(pattern: &str) -> Pattern {
        match Delimiter::pattern(pattern).unwrap() {
            Delimiter::Pattern(p) => p,
            other => panic!("expected a pattern, got {other:?}"),
        }
    }

    #[test]
    fn test_long_word_is_stepped_once() {
        let pattern = compile(r"[,;]\s*");
        let mut scan = PatternScan::default();
        let mut text = Vec::new();

        for _ in 0..1000 {
            text.extend_from_slice(b"xyz");
            assert_eq!(scan.advance(&pattern, &text), None);
            assert_eq!(scan.pos, text.len());
        }

        text.extend_from_slice(b", w");
        assert_eq!(scan.advance(&pattern, &text), Some(3002));
    }

    #[test]
    fn test_longer_alternative_can_still_win() {
        let pattern = compile(r"</p>|<");
        let mut scan = PatternScan::default();

        assert_eq!(scan.advance(&pattern, b"a</"), None);
        assert_eq!(scan.advance(&pattern, b"a</p>b"), Some(5));
    }

    #[test]
    fn test_preferred_short_alternative_settles_early() {
        let pattern = compile(r"<|</p>");
        let mut scan = PatternScan::default();
        assert_eq!(scan.advance(&pattern, b"a</"), Some(2));
    }

    #[test]
    fn test_rebase_keeps_scanning() {
        let pattern = compile(",");
        let mut scan = PatternScan::default();

        assert_eq!(scan.advance(&pattern, b"a,bc"), Some(2));
        scan.rebase(2);
        assert_eq!(scan.advance(&pattern, b"bc,d"), Some(3));
    }
}
