mod common;

use std::io::{self, Cursor, Read};
use std::sync::{Arc, Mutex};

use lazyparse::parser::prelude::*;
use pretty_assertions::assert_eq;

/// A reader whose position can be inspected after a stream took it over.
#[derive(Clone)]
struct SharedReader(Arc<Mutex<Cursor<Vec<u8>>>>);

impl SharedReader {
    fn new(text: &str) -> Self {
        Self(Arc::new(Mutex::new(Cursor::new(text.as_bytes().to_vec()))))
    }

    fn next_byte(&self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.0.lock().unwrap().read(&mut buf).unwrap() {
            0 => None,
            _ => Some(buf[0]),
        }
    }
}

impl Read for SharedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.lock().unwrap().read(buf)
    }
}

const DATE: &str = r"\d{4}/\d{1,2}/\d{1,2}";

#[test]
fn test_can_parse_using_regex() {
    let (rest, value) = pattern(DATE).unwrap().parse_str("1977/1/10ABC").unwrap();
    assert_eq!(value, "1977/1/10");
    assert_eq!(rest, Stream::from("ABC"));
}

#[test]
fn test_can_parse_to_end() {
    let (rest, value) = pattern(DATE).unwrap().parse_str("1977/1/10").unwrap();
    assert_eq!(value, "1977/1/10");
    assert!(rest.is_empty());
}

#[test]
fn test_does_not_read_more_than_it_needs() {
    let reader = SharedReader::new("1977/1/10ABC");
    let (_, value) = pattern(DATE)
        .unwrap()
        .parse_reader(reader.clone())
        .unwrap();
    assert_eq!(value, "1977/1/10");
    assert_eq!(reader.next_byte(), Some(b'A'));
}

#[test]
fn test_word_boundary_after_accented_word() {
    let (rest, value) = pattern(r"\w+\b").unwrap().parse_str("héllo world").unwrap();
    assert_eq!(value, "héllo");
    assert_eq!(rest.to_string(), " world");

    // one character of lookahead, then the reader is left alone
    let reader = SharedReader::new("héllo world");
    let (_, value) = pattern(r"\w+\b")
        .unwrap()
        .parse_reader(reader.clone())
        .unwrap();
    assert_eq!(value, "héllo");
    assert_eq!(reader.next_byte(), Some(b'w'));
}

#[test]
fn test_works_with_patterns_ending_with_star() {
    let identifier = pattern("[a-zA-Z][_0-9a-zA-Z]*").unwrap();

    let (rest, value) = identifier.parse_str("hello").unwrap();
    assert_eq!(value, "hello");
    assert!(rest.is_empty());

    let (rest, value) = identifier.parse_str("hello world").unwrap();
    assert_eq!(value, "hello");
    assert_eq!(rest.to_string(), " world");
}

#[test]
fn test_star_reads_exactly_one_character_past_match() {
    let reader = SharedReader::new("hello world");
    let (rest, value) = pattern("[a-zA-Z][_0-9a-zA-Z]*")
        .unwrap()
        .parse_reader(reader.clone())
        .unwrap();
    assert_eq!(value, "hello");
    // the space was read to end the repetition and is kept in the remainder
    assert_eq!(rest.head(), Ok(&' '));
    assert_eq!(reader.next_byte(), Some(b'w'));
}

#[test]
fn test_pattern_composes_with_other_parsers() {
    let date = pattern(DATE).unwrap();
    let word = pattern("[A-Z]+").unwrap();
    let parser = date.followed_by(character(' ').many()).then(word);

    let (rest, value) = parser.parse_str("2024/12/31  END.").unwrap();
    assert_eq!(value, ("2024/12/31".to_string(), "END".to_string()));
    assert_eq!(rest.to_string(), ".");
}

#[test]
fn test_backtracking_over_pattern() {
    let number = pattern(r"[0-9]+\.[0-9]+")
        .unwrap()
        .or(pattern("[0-9]+").unwrap());
    let (rest, value) = number.parse_str("42;").unwrap();
    assert_eq!(value, "42");
    assert_eq!(rest.to_string(), ";");
}

#[test]
fn test_no_match_reports_pattern_text() {
    let error = pattern(DATE).unwrap().parse_str("19/1/10").unwrap_err();
    assert_eq!(error.expected(), DATE);
    assert_eq!(error.position(), 0);
    assert_eq!(error.actual(), "\"19/\"");
}

#[test]
fn test_malformed_pattern_is_an_error() {
    assert!(pattern("[a-").is_err());
    assert!(pattern("a{2,1}").is_err());
}

#[test]
fn test_case_insensitive_config() {
    let config = lazyparse::PatternConfig {
        case_insensitive: true,
        ..Default::default()
    };
    let keyword = pattern_with("select", &config).unwrap();
    assert_eq!(keyword.parse_str("SeLeCt *").unwrap().1, "SeLeCt");
}
