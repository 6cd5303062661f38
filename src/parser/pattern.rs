//! # Pattern Parser
//!
//! Bridges a regular expression onto a lazily grown character stream.
//!
//! The pattern is compiled to an anchored dense DFA which is stepped one
//! character at a time as the stream is forced. Before pulling another
//! character the parser asks whether any continuation could still move the
//! match boundary; if none can, it stops. A pattern like
//! `\d{4}/\d{1,2}/\d{1,2}` therefore never reads past the last digit of its
//! match, while a pattern ending in an unbounded repetition reads exactly
//! one character past its match to see that the repetition is over.
//!
//! The DFA cannot evaluate a Unicode `\b` next to a non-ASCII character.
//! When that happens the parser starts over with a DFA for the pattern
//! without its word assertions, which only bounds how far to read, and
//! runs `regex_automata::meta::Regex` over the characters it read.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use regex_automata::dfa::{dense, Automaton, StartKind};
use regex_automata::meta;
use regex_automata::nfa::thompson;
use regex_automata::util::primitives::StateID;
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input, MatchError};
use regex_syntax::hir::{Capture, Hir, HirKind, Look, Repetition};
use thiserror::Error;

use super::core::{ParseError, ParseResult, Parser};
use crate::config::PatternConfig;
use crate::stream::Stream;

/// Error returned when a pattern cannot be compiled.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid pattern {pattern:?}: {source}")]
    Build {
        pattern: String,
        #[source]
        source: Box<dense::BuildError>,
    },
    #[error("Pattern {pattern:?} has no anchored start state: {source}")]
    Start {
        pattern: String,
        #[source]
        source: MatchError,
    },
    #[error("Invalid pattern {pattern:?}: {source}")]
    Syntax {
        pattern: String,
        #[source]
        source: Box<regex_syntax::Error>,
    },
    #[error("Pattern {pattern:?} cannot be compiled for word boundaries: {source}")]
    Nfa {
        pattern: String,
        #[source]
        source: Box<thompson::BuildError>,
    },
    #[error("Pattern {pattern:?} cannot be compiled for word boundaries: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: Box<meta::BuildError>,
    },
}

/// Bytes that can begin a UTF-8 encoded character.
fn leading_bytes() -> impl Iterator<Item = u8> {
    (0x00..=0x7F).chain(0xC2..=0xF4)
}

fn syntax_config(config: &PatternConfig) -> syntax::Config {
    syntax::Config::new()
        .case_insensitive(config.case_insensitive)
        .multi_line(config.multi_line)
        .dot_matches_new_line(config.dot_matches_new_line)
        .unicode(config.unicode)
        .utf8(config.unicode)
}

fn dfa_config(config: &PatternConfig) -> dense::Config {
    dense::DFA::config()
        .start_kind(StartKind::Anchored)
        .unicode_word_boundary(true)
        .minimize(config.minimize)
}

/// What the DFA says about the current position before another character
/// is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    /// The input so far matches, whatever follows.
    Match,
    /// Nothing that follows can produce a match.
    NoMatch,
    /// The next character decides.
    Open,
}

struct Machine {
    dfa: dense::DFA<Vec<u32>>,
    start: StateID,
    // States from which some continuation still reaches a match that ends
    // after the byte that led into them.
    open: HashSet<StateID>,
}

impl Machine {
    fn new(dfa: dense::DFA<Vec<u32>>, text: &str) -> Result<Self, PatternError> {
        let start = dfa
            .start_state_forward(&Input::new("").anchored(Anchored::Yes))
            .map_err(|e| PatternError::Start {
                pattern: text.to_string(),
                source: e,
            })?;
        let open = open_states(&dfa, start);
        Ok(Self { dfa, start, open })
    }

    fn eoi_matches(&self, state: StateID) -> bool {
        self.dfa.is_match_state(self.dfa.next_eoi_state(state))
    }

    fn stopped(&self, state: StateID) -> bool {
        self.dfa.is_dead_state(state) || self.dfa.is_quit_state(state)
    }

    /// Feeds the UTF-8 bytes of `c`. Returns true when a match ending just
    /// before `c` was reported.
    fn step(&self, state: &mut StateID, c: char) -> bool {
        let mut buf = [0u8; 4];
        let mut bytes = c.encode_utf8(&mut buf).bytes();
        let mut reported = false;
        if let Some(first) = bytes.next() {
            *state = self.dfa.next_state(*state, first);
            // matches are reported one byte late
            reported = self.dfa.is_match_state(*state);
        }
        for byte in bytes {
            if self.stopped(*state) {
                break;
            }
            *state = self.dfa.next_state(*state, byte);
        }
        reported
    }

    fn settle(&self, state: StateID) -> Settled {
        let mut all_match = true;
        let mut any_match = false;
        for byte in leading_bytes() {
            let next = self.dfa.next_state(state, byte);
            // a quit state needs the next character as well
            if self.open.contains(&next) || self.dfa.is_quit_state(next) {
                return Settled::Open;
            }
            if self.dfa.is_match_state(next) {
                any_match = true;
            } else {
                all_match = false;
            }
        }
        let eoi = self.eoi_matches(state);
        match (eoi, any_match, all_match) {
            (true, _, true) => Settled::Match,
            (false, false, _) => Settled::NoMatch,
            _ => Settled::Open,
        }
    }
}

/// Handles patterns with Unicode word boundaries once the DFA gives up on a
/// non-ASCII byte. `relaxed` accepts the pattern with those assertions
/// removed and decides how far to read; `regex` then finds the real match
/// in what was read.
struct WordFallback {
    relaxed: Machine,
    regex: meta::Regex,
}

impl WordFallback {
    fn build(text: &str, hir: &Hir, config: &PatternConfig) -> Result<Self, PatternError> {
        let nfa = thompson::Compiler::new()
            .build_from_hir(&without_unicode_words(hir))
            .map_err(|e| PatternError::Nfa {
                pattern: text.to_string(),
                source: Box::new(e),
            })?;
        let dfa = dense::Builder::new()
            .configure(dfa_config(config))
            .build_from_nfa(&nfa)
            .map_err(|e| PatternError::Build {
                pattern: text.to_string(),
                source: Box::new(e),
            })?;
        let regex = meta::Regex::builder()
            .syntax(syntax_config(config))
            .build(text)
            .map_err(|e| PatternError::Regex {
                pattern: text.to_string(),
                source: Box::new(e),
            })?;
        Ok(Self {
            relaxed: Machine::new(dfa, text)?,
            regex,
        })
    }
}

fn is_unicode_word(look: Look) -> bool {
    matches!(
        look,
        Look::WordUnicode
            | Look::WordUnicodeNegate
            | Look::WordStartUnicode
            | Look::WordEndUnicode
            | Look::WordStartHalfUnicode
            | Look::WordEndHalfUnicode
    )
}

/// The same expression with every Unicode word assertion replaced by the
/// empty match. It accepts everything the original accepts.
fn without_unicode_words(hir: &Hir) -> Hir {
    match hir.kind() {
        HirKind::Look(look) if is_unicode_word(*look) => Hir::empty(),
        HirKind::Repetition(rep) => Hir::repetition(Repetition {
            min: rep.min,
            max: rep.max,
            greedy: rep.greedy,
            sub: Box::new(without_unicode_words(&rep.sub)),
        }),
        HirKind::Capture(cap) => Hir::capture(Capture {
            index: cap.index,
            name: cap.name.clone(),
            sub: Box::new(without_unicode_words(&cap.sub)),
        }),
        HirKind::Concat(subs) => Hir::concat(subs.iter().map(without_unicode_words).collect()),
        HirKind::Alternation(subs) => {
            Hir::alternation(subs.iter().map(without_unicode_words).collect())
        }
        _ => hir.clone(),
    }
}

struct Compiled {
    exact: Machine,
    fallback: Option<WordFallback>,
}

impl Compiled {
    fn build(text: &str, config: &PatternConfig) -> Result<Self, PatternError> {
        let dfa = dense::DFA::builder()
            .configure(dfa_config(config))
            .syntax(syntax_config(config))
            .build(text)
            .map_err(|e| PatternError::Build {
                pattern: text.to_string(),
                source: Box::new(e),
            })?;
        let exact = Machine::new(dfa, text)?;

        let hir = syntax::parse_with(text, &syntax_config(config)).map_err(|e| {
            PatternError::Syntax {
                pattern: text.to_string(),
                source: Box::new(e),
            }
        })?;
        let fallback = if hir.properties().look_set().contains_word_unicode() {
            Some(WordFallback::build(text, &hir, config)?)
        } else {
            None
        };

        tracing::debug!(
            target: "lazyparse::parser::pattern",
            pattern = text,
            memory = exact.dfa.memory_usage(),
            open = exact.open.len(),
            word_fallback = fallback.is_some(),
            "Compiled pattern"
        );

        Ok(Self { exact, fallback })
    }
}

/// Walks every state reachable from `start` and keeps those that can still
/// grow a match.
fn open_states(dfa: &dense::DFA<Vec<u32>>, start: StateID) -> HashSet<StateID> {
    let mut successors: HashMap<StateID, Vec<StateID>> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    while let Some(state) = queue.pop_front() {
        if successors.contains_key(&state) {
            continue;
        }
        let mut next: Vec<StateID> = Vec::new();
        if !dfa.is_dead_state(state) && !dfa.is_quit_state(state) {
            for byte in 0..=u8::MAX {
                let target = dfa.next_state(state, byte);
                if !next.contains(&target) {
                    next.push(target);
                }
            }
        }
        queue.extend(next.iter().copied());
        successors.insert(state, next);
    }

    let eoi_match = |state: StateID| dfa.is_match_state(dfa.next_eoi_state(state));

    // live: a match is reported at this state or somewhere after it
    let mut live: HashSet<StateID> = successors
        .keys()
        .copied()
        .filter(|&s| dfa.is_match_state(s) || eoi_match(s))
        .collect();
    let mut predecessors: HashMap<StateID, Vec<StateID>> = HashMap::new();
    for (&from, targets) in &successors {
        for &to in targets {
            predecessors.entry(to).or_default().push(from);
        }
    }
    let mut work: Vec<StateID> = live.iter().copied().collect();
    while let Some(state) = work.pop() {
        for &from in predecessors.get(&state).into_iter().flatten() {
            if live.insert(from) {
                work.push(from);
            }
        }
    }

    successors
        .iter()
        .filter(|(&state, targets)| {
            eoi_match(state) || targets.iter().any(|target| live.contains(target))
        })
        .map(|(&state, _)| state)
        .collect()
}

/// Matches a regular expression against the front of the stream.
///
/// The value is the matched text and the remainder the stream just past
/// it. On failure the expected text is the pattern itself and the actual
/// text is what was examined.
#[derive(Clone)]
pub struct Pattern {
    text: String,
    compiled: Arc<Compiled>,
}

impl Pattern {
    pub fn new(text: &str) -> Result<Self, PatternError> {
        Self::with_config(text, &PatternConfig::default())
    }

    pub fn with_config(text: &str, config: &PatternConfig) -> Result<Self, PatternError> {
        Ok(Self {
            text: text.to_string(),
            compiled: Arc::new(Compiled::build(text, config)?),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Pattern").field(&self.text).finish()
    }
}

impl Pattern {
    fn failure(&self, input: &Stream<char>, seen: String) -> ParseError<char> {
        if seen.is_empty() && input.is_empty() {
            ParseError::eof(self.text.clone(), input.clone())
        } else {
            ParseError::unexpected(self.text.clone(), format!("{:?}", seen), input.clone())
        }
    }

    /// Reads until the relaxed machine rules out a longer match, keeping one
    /// character past the candidate region so boundaries at its end can be
    /// judged, then searches that window.
    fn parse_with_fallback(
        &self,
        fallback: &WordFallback,
        input: &Stream<char>,
    ) -> ParseResult<char, String> {
        let relaxed = &fallback.relaxed;
        let mut state = relaxed.start;
        let mut current = input.clone();
        let mut seen = String::new();
        // whether the last character of `seen` is there only as context
        let mut lookahead = false;

        loop {
            match relaxed.settle(state) {
                Settled::Open => {}
                Settled::NoMatch => {
                    lookahead = !seen.is_empty();
                    break;
                }
                Settled::Match => {
                    if let Some((&c, _)) = current.uncons() {
                        seen.push(c);
                        lookahead = true;
                    }
                    break;
                }
            }

            let Some((&c, rest)) = current.uncons() else {
                break;
            };
            relaxed.step(&mut state, c);
            seen.push(c);
            current = rest.clone();

            if relaxed.stopped(state) {
                lookahead = true;
                break;
            }
        }

        let end = match (lookahead, seen.chars().next_back()) {
            (true, Some(last)) => seen.len() - last.len_utf8(),
            _ => seen.len(),
        };
        let window = Input::new(&seen).range(..end).anchored(Anchored::Yes);
        let matched = fallback
            .regex
            .search(&window)
            .and_then(|m| seen.get(..m.end()))
            .map(str::to_string);

        tracing::trace!(
            target: "lazyparse::parser::pattern",
            pattern = %self.text,
            position = input.position(),
            examined = seen.chars().count(),
            matched = matched.as_ref().map(|m| m.chars().count()),
            "Pattern finished through word boundary fallback"
        );

        match matched {
            Some(text) => Ok((input.advance(text.chars().count()), text)),
            None => Err(self.failure(input, seen)),
        }
    }
}

impl Parser<char, String> for Pattern {
    fn parse(&self, input: &Stream<char>) -> ParseResult<char, String> {
        let compiled = &*self.compiled;
        let exact = &compiled.exact;

        let mut state = exact.start;
        let mut current = input.clone();
        let mut seen = String::new();
        let mut chars = 0usize;
        // (bytes, chars) of the longest accepted prefix so far
        let mut accepted: Option<(usize, usize)> = None;

        loop {
            match exact.settle(state) {
                Settled::Match => {
                    accepted = Some((seen.len(), chars));
                    break;
                }
                Settled::NoMatch => break,
                Settled::Open => {}
            }

            let Some((&c, rest)) = current.uncons() else {
                if exact.eoi_matches(state) {
                    accepted = Some((seen.len(), chars));
                }
                break;
            };

            if exact.step(&mut state, c) {
                accepted = Some((seen.len(), chars));
            }
            seen.push(c);
            chars += 1;
            current = rest.clone();

            if exact.stopped(state) {
                break;
            }
        }

        // the DFA cannot judge a Unicode word boundary next to non-ASCII text
        if exact.dfa.is_quit_state(state) {
            if let Some(fallback) = &compiled.fallback {
                return self.parse_with_fallback(fallback, input);
            }
        }

        tracing::trace!(
            target: "lazyparse::parser::pattern",
            pattern = %self.text,
            position = input.position(),
            examined = chars,
            matched = accepted.map(|(_, n)| n),
            "Pattern finished"
        );

        match accepted {
            Some((bytes, chars)) => {
                seen.truncate(bytes);
                Ok((input.advance(chars), seen))
            }
            None => Err(self.failure(input, seen)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(pattern: &str, text: &str) -> (String, String) {
        let (rest, value) = Pattern::new(pattern)
            .unwrap()
            .parse(&Stream::from(text))
            .unwrap();
        (value, rest.to_string())
    }

    #[test]
    fn test_date_pattern() {
        assert_eq!(
            parse(r"\d{4}/\d{1,2}/\d{1,2}", "1977/1/10ABC"),
            ("1977/1/10".to_string(), "ABC".to_string())
        );
        assert_eq!(
            parse(r"\d{4}/\d{1,2}/\d{1,2}", "1977/1/10"),
            ("1977/1/10".to_string(), String::new())
        );
    }

    #[test]
    fn test_bounded_pattern_does_not_look_ahead() {
        let input = Stream::from("1977/1/10ABC");
        let parser = Pattern::new(r"\d{4}/\d{1,2}/\d{1,2}").unwrap();
        let (rest, _) = parser.parse(&input).unwrap();
        assert!(!rest.is_forced());
        assert_eq!(input.materialized(), 9);
    }

    #[test]
    fn test_star_reads_one_past_match() {
        let input = Stream::from("hello world");
        let parser = Pattern::new("[a-zA-Z][_0-9a-zA-Z]*").unwrap();
        let (rest, value) = parser.parse(&input).unwrap();
        assert_eq!(value, "hello");
        assert_eq!(input.materialized(), 6);
        assert_eq!(rest.to_string(), " world");

        assert_eq!(
            parse("[a-zA-Z][_0-9a-zA-Z]*", "hello"),
            ("hello".to_string(), String::new())
        );
    }

    #[test]
    fn test_leftmost_first_alternation() {
        assert_eq!(parse("a|ab", "abc"), ("a".to_string(), "bc".to_string()));
        assert_eq!(parse("ab|a", "abc"), ("ab".to_string(), "c".to_string()));
    }

    #[test]
    fn test_empty_match() {
        assert_eq!(parse("a*", "bbb"), (String::new(), "bbb".to_string()));
        assert_eq!(parse("x?", ""), (String::new(), String::new()));
    }

    #[test]
    fn test_word_boundary_and_end_anchor() {
        assert_eq!(parse(r"\w+\b", "abc def"), ("abc".to_string(), " def".to_string()));
        assert_eq!(parse("ab$", "ab"), ("ab".to_string(), String::new()));
        assert!(Pattern::new("ab$")
            .unwrap()
            .parse(&Stream::from("abc"))
            .is_err());
    }

    #[test]
    fn test_word_boundary_with_non_ascii() {
        let input = Stream::from("héllo world");
        let parser = Pattern::new(r"\w+\b").unwrap();
        let (rest, value) = parser.parse(&input).unwrap();
        assert_eq!(value, "héllo");
        assert_eq!(rest.to_string(), " world");
        assert_eq!(input.materialized(), 6);

        assert_eq!(parse(r"\w+\b", "日本語 text"), ("日本語".to_string(), " text".to_string()));
        assert_eq!(parse(r"\w+\b", "naïve"), ("naïve".to_string(), String::new()));
        assert_eq!(parse(r"café\b", "café au lait"), ("café".to_string(), " au lait".to_string()));
        assert_eq!(parse(r"\bé", "éa"), ("é".to_string(), "a".to_string()));
    }

    #[test]
    fn test_word_boundary_with_non_ascii_can_fail() {
        let parser = Pattern::new(r"café\b").unwrap();
        let error = parser.parse(&Stream::from("cafés")).unwrap_err();
        assert_eq!(error.expected(), r"café\b");
        assert_eq!(error.position(), 0);

        let error = Pattern::new(r"\bé").unwrap().parse(&Stream::from("xé")).unwrap_err();
        assert_eq!(error.position(), 0);
    }

    #[test]
    fn test_multibyte_characters() {
        assert_eq!(parse("é+", "ééa"), ("éé".to_string(), "a".to_string()));
        assert_eq!(parse(r"\w+", "日本語 text"), ("日本語".to_string(), " text".to_string()));
    }

    #[test]
    fn test_failure_reports_pattern_and_examined_text() {
        let parser = Pattern::new(r"\d{4}").unwrap();
        let error = parser.parse(&Stream::from("19x7")).unwrap_err();
        assert_eq!(error.expected(), r"\d{4}");
        assert_eq!(error.actual(), "\"19x\"");
        assert_eq!(error.position(), 0);

        let error = parser.parse(&Stream::from("")).unwrap_err();
        assert!(matches!(error, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_config_is_applied() {
        let config = PatternConfig {
            case_insensitive: true,
            ..PatternConfig::default()
        };
        let parser = Pattern::with_config("abc", &config).unwrap();
        let (_, value) = parser.parse(&Stream::from("ABC")).unwrap();
        assert_eq!(value, "ABC");
    }

    #[test]
    fn test_invalid_pattern() {
        let error = Pattern::new("(unclosed").unwrap_err();
        assert!(matches!(error, PatternError::Build { .. }));
        assert!(error.to_string().starts_with("Invalid pattern \"(unclosed\""));
    }
}
