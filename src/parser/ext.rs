//! Method-style construction of parsers.
//!
//! [`ParserExt`] is implemented for every parser, so grammars read left to
//! right:
//!
//! ```
//! use lazyparse::parser::prelude::*;
//!
//! let number = satisfy(|c: &char| c.to_digit(10))
//!     .many1()
//!     .map(|digits| digits.into_iter().fold(0, |n, d| n * 10 + d));
//! let list = number.sep_by(character(',')).between(character('['), character(']'));
//!
//! let (rest, values) = list.parse_str("[1,22,333]!").unwrap();
//! assert_eq!(values, vec![1, 22, 333]);
//! assert_eq!(rest.to_string(), "!");
//! ```

use std::io::Read;
use std::sync::Arc;

use super::combinators::*;
use super::core::{BoxedParser, ParseResult, Parser};
use super::sequence::SequenceOf;
use super::trace::{TraceObserver, Traced};
use crate::stream::Stream;

pub trait ParserExt<I, O>: Parser<I, O> + Sized {
    /// Transforms the value on success.
    fn map<B, F>(self, f: F) -> Map<Self, F, O, B>
    where
        F: Fn(O) -> B,
    {
        Map::new(self, f)
    }

    /// Runs `other` after `self` and pairs the values.
    fn then<O2, P>(self, other: P) -> Tuple2<Self, P, I, O, O2>
    where
        P: Parser<I, O2>,
    {
        Tuple2::new(self, other)
    }

    /// Runs `other` after `self` and keeps the value of `other`.
    fn next<O2, P>(self, other: P) -> Preceded<Self, P, I, O, O2>
    where
        P: Parser<I, O2>,
    {
        Preceded::new(self, other)
    }

    /// Runs `other` after `self` and keeps the value of `self`.
    fn followed_by<O2, P>(self, other: P) -> Terminated<Self, P, I, O, O2>
    where
        P: Parser<I, O2>,
    {
        Terminated::new(self, other)
    }

    fn between<OL, OR, L, R>(self, before: L, after: R) -> Delimited<L, Self, R, I, OL, O, OR>
    where
        L: Parser<I, OL>,
        R: Parser<I, OR>,
    {
        Delimited::new(before, self, after)
    }

    /// Like [`between`](ParserExt::between) with the same parser on both
    /// sides.
    fn surrounded_by<OS, S>(self, around: S) -> Delimited<S, Self, S, I, OS, O, OS>
    where
        S: Parser<I, OS> + Clone,
    {
        Delimited::new(around.clone(), self, around)
    }

    /// Ordered choice: `other` is only tried if `self` fails.
    fn or<P>(self, other: P) -> Or<Self, P, I, O>
    where
        P: Parser<I, O>,
    {
        Or::new(self, other)
    }

    fn optional(self) -> Optional<Self, I, O> {
        Optional::new(self)
    }

    fn many(self) -> Many<Self, I, O> {
        Many::new(self)
    }

    fn many1(self) -> Many<Self, I, O> {
        Many::at_least(self, 1)
    }

    fn many_min(self, min: usize) -> Many<Self, I, O> {
        Many::at_least(self, min)
    }

    fn times(self, count: usize) -> Times<Self, I, O> {
        Times::new(self, count)
    }

    fn sep_by<OS, S>(self, separator: S) -> SeparatedList<Self, S, I, O, OS>
    where
        S: Parser<I, OS>,
    {
        SeparatedList::new(self, separator)
    }

    fn separated_by<OS, S>(self, separator: S) -> SeparatedList<Self, S, I, O, OS>
    where
        S: Parser<I, OS>,
    {
        self.sep_by(separator)
    }

    fn sep_by1<OS, S>(self, separator: S) -> SeparatedList<Self, S, I, O, OS>
    where
        S: Parser<I, OS>,
    {
        SeparatedList::at_least(self, separator, 1)
    }

    /// Lazy repetition: the items come back as a [`Stream`] that is parsed
    /// as it is read.
    fn sequence(self) -> SequenceOf<Self, Zero<I, ()>, I, O, ()> {
        SequenceOf::new(self, Zero::new(()))
    }

    /// Lazy repetition with an optional separator after each item.
    fn sequenced_by<OS, S>(self, separator: S) -> SequenceOf<Self, S, I, O, OS>
    where
        S: Parser<I, OS>,
    {
        SequenceOf::new(self, separator)
    }

    fn seq_by<OS, S>(self, separator: S) -> SequenceOf<Self, S, I, O, OS>
    where
        S: Parser<I, OS>,
    {
        self.sequenced_by(separator)
    }

    fn ignore(self) -> AsUnit<Self, O> {
        AsUnit::new(self)
    }

    fn with_context<C: ToString>(self, context: C) -> WithContext<Self, C> {
        WithContext::new(self, context)
    }

    /// Reports each invocation under `name` through `tracing`.
    fn debug(self, name: &str) -> Traced<Self, I, O> {
        Traced::new(self, name)
    }

    fn debug_with(self, name: &str, observer: Arc<dyn TraceObserver>) -> Traced<Self, I, O> {
        Traced::with_observer(self, name, observer)
    }

    fn boxed(self) -> BoxedParser<I, O>
    where
        Self: Send + Sync + 'static,
    {
        Box::new(self)
    }
}

impl<I, O, P: Parser<I, O>> ParserExt<I, O> for P {}

/// Entry points for parsers over characters.
pub trait TextParser<O>: Parser<char, O> {
    fn parse_str(&self, text: &str) -> ParseResult<char, O> {
        self.parse(&Stream::from(text))
    }

    /// Parses UTF-8 text pulled from `reader` one character at a time.
    fn parse_reader<R>(&self, reader: R) -> ParseResult<char, O>
    where
        R: Read + Send + 'static,
    {
        self.parse(&Stream::from_reader(reader))
    }

    fn parse_chars<C>(&self, chars: C) -> ParseResult<char, O>
    where
        C: IntoIterator<Item = char>,
        C::IntoIter: Send + 'static,
    {
        self.parse(&Stream::from_source(chars.into_iter()))
    }
}

impl<O, P: Parser<char, O> + ?Sized> TextParser<O> for P {}
