use super::*;

fn tokenize_fragments(delimiter: Delimiter, fragments: &[&str]) -> Vec<String> {
    let mut tokenizer = Tokenizer::new(delimiter);
    let mut tokens = Vec::new();
    for fragment in fragments {
        tokens.extend(tokenizer.feed(fragment));
    }
    tokens.extend(tokenizer.flush());
    tokens
}

fn tokenize_whole(delimiter: Delimiter, text: &str) -> Vec<String> {
    tokenize_fragments(delimiter, &[text])
}

/// Feed `text` cut at every pair of char boundaries and compare with the
/// single-fragment result.
fn assert_fragmentation_invariant(delimiter: Delimiter, text: &str) {
    let expected = tokenize_whole(delimiter.clone(), text);
    let cuts: Vec<usize> = (0..=text.len()).filter(|i| text.is_char_boundary(*i)).collect();

    for (n, &a) in cuts.iter().enumerate() {
        for &b in &cuts[n..] {
            let fragments = [&text[..a], &text[a..b], &text[b..]];
            let tokens = tokenize_fragments(delimiter.clone(), &fragments);
            assert_eq!(
                tokens, expected,
                "split at {a}/{b} of {text:?} with {}",
                delimiter.describe()
            );
        }
    }
}

#[test]
fn test_fragments_straddling_words() {
    let tokens = tokenize_fragments(Delimiter::Whitespace, &["hel", "lo wor", "ld"]);
    assert_eq!(tokens, vec!["hello", "world"]);
}

#[test]
fn test_basic_sentence() {
    let tokens = tokenize_whole(Delimiter::Whitespace, "one two three four five six seven");
    assert_eq!(
        tokens,
        vec!["one", "two", "three", "four", "five", "six", "seven"]
    );
}

#[test]
fn test_empty_input() {
    assert!(tokenize_whole(Delimiter::Whitespace, "").is_empty());
    assert!(tokenize_fragments(Delimiter::Whitespace, &[]).is_empty());
}

#[test]
fn test_only_delimiters() {
    assert!(tokenize_whole(Delimiter::Whitespace, "   \n\t ").is_empty());
    assert!(tokenize_whole(Delimiter::literal(",").unwrap(), ",,,,").is_empty());
}

#[test]
fn test_no_empty_tokens() {
    let inputs = [
        "  leading",
        "trailing   ",
        "a  \n\n  b\t\tc",
        "\u{3000}wide\u{3000}\u{3000}space",
    ];
    for input in inputs {
        let tokens = tokenize_whole(Delimiter::Whitespace, input);
        assert!(tokens.iter().all(|t| !t.is_empty()), "{input:?} -> {tokens:?}");
    }

    let tokens = tokenize_whole(Delimiter::literal(",").unwrap(), ",a,,b,");
    assert_eq!(tokens, vec!["a", "b"]);
}

#[test]
fn test_feed_holds_incomplete_tail() {
    let mut tokenizer = Tokenizer::new(Delimiter::Whitespace);

    let first: Vec<String> = tokenizer.feed("alpha be").collect();
    assert_eq!(first, vec!["alpha"]);
    assert_eq!(tokenizer.pending_len(), 2);

    let second: Vec<String> = tokenizer.feed("ta").collect();
    assert!(second.is_empty());
    assert_eq!(tokenizer.pending_len(), 4);

    let last: Vec<String> = tokenizer.flush().collect();
    assert_eq!(last, vec!["beta"]);
    assert_eq!(tokenizer.pending_len(), 0);
    assert_eq!(tokenizer.flush().count(), 0);
}

#[test]
fn test_trailing_delimiter_leaves_nothing_pending() {
    let mut tokenizer = Tokenizer::new(Delimiter::Whitespace);
    let tokens: Vec<String> = tokenizer.feed("one two ").collect();
    assert_eq!(tokens, vec!["one", "two"]);
    assert_eq!(tokenizer.pending_len(), 0);
    assert_eq!(tokenizer.flush().count(), 0);
}

#[test]
fn test_literal_delimiter_split_across_fragments() {
    let crlf = Delimiter::literal("\r\n").unwrap();
    let tokens = tokenize_fragments(crlf, &["first\r", "\nsecond\r", "\n", "third"]);
    assert_eq!(tokens, vec!["first", "second", "third"]);
}

#[test]
fn test_pattern_delimiter() {
    let pattern = Delimiter::pattern(r"[,;]\s*").unwrap();
    let tokens = tokenize_fragments(pattern, &["a, b;", "c,", "  d"]);
    assert_eq!(tokens, vec!["a", "b", "c", "d"]);
}

#[test]
fn test_pattern_match_at_fragment_end_is_held() {
    let pattern = Delimiter::pattern(r";\s*").unwrap();
    let mut tokenizer = Tokenizer::new(pattern);

    let tokens: Vec<String> = tokenizer.feed("x;").collect();
    assert!(tokens.is_empty());

    let tokens: Vec<String> = tokenizer.feed("   y").collect();
    assert_eq!(tokens, vec!["x"]);

    let tokens: Vec<String> = tokenizer.flush().collect();
    assert_eq!(tokens, vec!["y"]);
}

#[test]
fn test_flush_splits_held_pattern_match() {
    let pattern = Delimiter::pattern(r",+").unwrap();
    let tokens = tokenize_fragments(pattern, &["a,,b,,"]);
    assert_eq!(tokens, vec!["a", "b"]);
}

#[test]
fn test_multibyte_words_survive() {
    let tokens = tokenize_fragments(Delimiter::Whitespace, &["naïve ", "café crè", "me"]);
    assert_eq!(tokens, vec!["naïve", "café", "crème"]);
}

#[test]
fn test_fragmentation_invariance_whitespace() {
    assert_fragmentation_invariant(Delimiter::Whitespace, "the quick  brown\tfox\n\njumps ");
    assert_fragmentation_invariant(Delimiter::Whitespace, " x ");
    assert_fragmentation_invariant(Delimiter::Whitespace, "héllo wörld\u{2003}ünïcode");
}

#[test]
fn test_fragmentation_invariance_literal() {
    assert_fragmentation_invariant(Delimiter::literal("--").unwrap(), "a--b---c----d-");
    assert_fragmentation_invariant(Delimiter::literal("aa").unwrap(), "baaab aaaa c");
}

#[test]
fn test_fragmentation_invariance_pattern() {
    assert_fragmentation_invariant(Delimiter::pattern(r"\s+").unwrap(), "one  two\n three ");
    assert_fragmentation_invariant(Delimiter::pattern(r"[,|]+").unwrap(), ",a|b,,|c,d|");
    assert_fragmentation_invariant(Delimiter::pattern(r"[,;]\s*").unwrap(), "a, b;c,  d; ");
    assert_fragmentation_invariant(Delimiter::pattern(r"</p>|<").unwrap(), "a</p>b");
    assert_fragmentation_invariant(Delimiter::pattern(r"</p>|<").unwrap(), "x<y</p>z</q");
    assert_fragmentation_invariant(Delimiter::pattern(r"a|ab").unwrap(), "xabyaz");
    assert_fragmentation_invariant(Delimiter::pattern(r"<[^>]*>|,").unwrap(), "q<a,b>r,s<t");
}

#[test]
fn test_longer_alternative_across_fragments() {
    let pattern = Delimiter::pattern(r"</p>|<").unwrap();
    assert_eq!(tokenize_whole(pattern.clone(), "a</p>b"), vec!["a", "b"]);
    assert_eq!(tokenize_fragments(pattern, &["a</", "p>b"]), vec!["a", "b"]);
}

#[test]
fn test_pattern_holds_until_match_is_settled() {
    let mut tokenizer = Tokenizer::new(Delimiter::pattern(r"</p>|<").unwrap());

    assert_eq!(tokenizer.feed("a</").count(), 0);
    let tokens: Vec<String> = tokenizer.feed("p>b").collect();
    assert_eq!(tokens, vec!["a"]);
    assert_eq!(tokenizer.pending_len(), 1);

    let tokens: Vec<String> = tokenizer.flush().collect();
    assert_eq!(tokens, vec!["b"]);
}
