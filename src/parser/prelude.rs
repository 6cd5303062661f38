//! Free functions for building parsers, plus the traits needed to use them.
//!
//! `use lazyparse::parser::prelude::*;` is enough to write a grammar.

use std::fmt;

use super::combinators::*;
use super::core::BoxedParser;
use super::pattern::{Pattern, PatternError};
use crate::config::PatternConfig;

pub use super::core::{ParseError, ParseResult, Parser};
pub use super::ext::{ParserExt, TextParser};
pub use super::reference::Reference;
pub use crate::stream::Stream;

/// Matches one specific element.
pub fn equal<I: Clone + PartialEq + fmt::Debug>(value: I) -> Equal<I> {
    Equal::new(value)
}

/// Matches one specific character.
pub fn character(c: char) -> Equal<char> {
    Equal::new(c)
}

pub fn literal(text: &str) -> Literal {
    Literal::new(text)
}

pub fn identity<I: Clone>() -> Identity<I> {
    Identity::new()
}

/// Consumes any single character.
pub fn any_char() -> Identity<char> {
    Identity::new()
}

pub fn zero<I, O: Clone>(zero_value: O) -> Zero<I, O> {
    Zero::new(zero_value)
}

/// Succeeds with `value` without consuming input.
pub fn succeed<I, O: Clone>(value: O) -> Zero<I, O> {
    Zero::new(value)
}

pub fn fail<I, O>(message: &str) -> Fail<I, O> {
    Fail::new(message)
}

pub fn satisfy<I, O, F>(f: F) -> Satisfy<I, O, F>
where
    I: fmt::Debug,
    F: Fn(&I) -> Option<O>,
{
    Satisfy::new(f)
}

pub fn end_of_input<I: fmt::Debug>() -> EndOfInput<I> {
    EndOfInput::new()
}

pub fn choice<I, O>(parsers: Vec<BoxedParser<I, O>>) -> Choice<I, O> {
    Choice::new(parsers)
}

/// Runs each parser in turn and collects their values.
pub fn list<I, O>(parsers: Vec<BoxedParser<I, O>>) -> Sequence<I, O> {
    Sequence::new(parsers)
}

pub fn pattern(text: &str) -> Result<Pattern, PatternError> {
    Pattern::new(text)
}

pub fn pattern_with(text: &str, config: &PatternConfig) -> Result<Pattern, PatternError> {
    Pattern::with_config(text, config)
}

pub fn reference<I, O>(name: &str) -> Reference<I, O> {
    Reference::new(name)
}

pub fn lazy<I, O, F, P>(f: F) -> Lazy<F>
where
    F: Fn() -> P,
    P: Parser<I, O>,
{
    Lazy::new(f)
}

pub fn tuple2<P1, P2, I, O1, O2>(parser1: P1, parser2: P2) -> Tuple2<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    Tuple2::new(parser1, parser2)
}

pub fn preceded<P1, P2, I, O1, O2>(parser1: P1, parser2: P2) -> Preceded<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    Preceded::new(parser1, parser2)
}

pub fn terminated<P1, P2, I, O1, O2>(parser1: P1, parser2: P2) -> Terminated<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    Terminated::new(parser1, parser2)
}

pub fn delimited<L, P, R, I, OL, O, OR>(left: L, parser: P, right: R) -> Delimited<L, P, R, I, OL, O, OR>
where
    L: Parser<I, OL>,
    P: Parser<I, O>,
    R: Parser<I, OR>,
{
    Delimited::new(left, parser, right)
}

pub fn many<P, I, O>(parser: P) -> Many<P, I, O>
where
    P: Parser<I, O>,
{
    Many::new(parser)
}

pub fn many1<P, I, O>(parser: P) -> Many<P, I, O>
where
    P: Parser<I, O>,
{
    Many::at_least(parser, 1)
}

pub fn separated_list<P, S, I, O, OS>(item_parser: P, separator_parser: S) -> SeparatedList<P, S, I, O, OS>
where
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    SeparatedList::new(item_parser, separator_parser)
}

pub fn optional<P, I, O>(parser: P) -> Optional<P, I, O>
where
    P: Parser<I, O>,
{
    Optional::new(parser)
}

pub fn with_context<P, I, O, C>(parser: P, c: C) -> WithContext<P, C>
where
    P: Parser<I, O>,
{
    WithContext::new(parser, c)
}
