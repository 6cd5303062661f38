//! # Parser Combinators
//!
//! The building blocks of the parser algebra. Each combinator is a plain
//! immutable struct wrapping its children; invoking it invokes the children
//! against explicit stream handles and combines their results.
//!
//! ## Combinator Types
//!
//! * **Primitives**: `Equal`, `Literal`, `Satisfy`, `Identity`, `Zero`, `Fail`, `EndOfInput`
//! * **Sequential Combinators**: `Tuple2`, `Preceded`, `Terminated`, `Delimited`, `Sequence`
//! * **Alternative Combinators**: `Or`, `Choice`, `Optional`
//! * **Repetition Combinators**: `Many`, `Times`, `SeparatedList`
//! * **Transformation Combinators**: `Map`, `AsUnit`
//! * **Error Handling Combinators**: `WithContext`
//! * **Deferred Construction**: `Lazy`

use std::fmt;
use std::marker::PhantomData;

use super::core::{mismatch, BoxedParser, ParseError, ParseResult, Parser};
use crate::stream::Stream;

/// Matches one specific element.
#[derive(Clone)]
pub struct Equal<I> {
    value: I,
}

impl<I> Equal<I> {
    pub fn new(value: I) -> Self {
        Self { value }
    }
}

impl<I: Clone + PartialEq + fmt::Debug> Parser<I, I> for Equal<I> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, I> {
        match input.uncons() {
            Some((found, rest)) if *found == self.value => Ok((rest.clone(), found.clone())),
            _ => Err(mismatch(format!("{:?}", self.value), input)),
        }
    }
}

// fails at the starting position if any character differs
#[derive(Clone)]
pub struct Literal {
    text: String,
}

impl Literal {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Parser<char, String> for Literal {
    fn parse(&self, input: &Stream<char>) -> ParseResult<char, String> {
        let mut current = input.clone();
        for (matched, expected) in self.text.chars().enumerate() {
            let next = match current.uncons() {
                Some((found, rest)) if *found == expected => rest.clone(),
                Some((found, _)) => {
                    let actual: String = self.text.chars().take(matched).chain([*found]).collect();
                    return Err(ParseError::unexpected(
                        format!("{:?}", self.text),
                        format!("{:?}", actual),
                        input.clone(),
                    ));
                }
                None => return Err(ParseError::eof(format!("{:?}", self.text), input.clone())),
            };
            current = next;
        }
        Ok((current, self.text.clone()))
    }
}

#[derive(Clone)]
pub struct Identity<I> {
    _phantom: PhantomData<I>,
}

impl<I> Identity<I> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<I> Default for Identity<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Clone> Parser<I, I> for Identity<I> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, I> {
        input
            .uncons()
            .map(|(head, rest)| (rest.clone(), head.clone()))
            .ok_or_else(|| ParseError::eof("any element", input.clone()))
    }
}

// Zero: succeeds with a fixed value, consumes nothing
#[derive(Clone)]
pub struct Zero<I, O> {
    zero_value: O,
    _phantom: PhantomData<I>,
}

impl<I, O> Zero<I, O> {
    pub fn new(zero_value: O) -> Self {
        Self {
            zero_value,
            _phantom: PhantomData,
        }
    }
}

impl<I, O: Clone> Parser<I, O> for Zero<I, O> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        Ok((input.clone(), self.zero_value.clone()))
    }
}

#[derive(Clone)]
pub struct Fail<I, O> {
    message: String,
    _phantom: PhantomData<(I, O)>,
}

impl<I, O> Fail<I, O> {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl<I, O> Parser<I, O> for Fail<I, O> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        Err(ParseError::failure(self.message.clone(), input.clone()))
    }
}

/// Consumes one element if `f` maps it to a value.
#[derive(Clone)]
pub struct Satisfy<I, O, F> {
    f: F,
    description: String,
    _phantom: PhantomData<(I, O)>,
}

impl<I, O, F> Satisfy<I, O, F> {
    pub fn new(f: F) -> Self {
        Self::described("a matching element", f)
    }

    /// Like `new`, with a description used as "expected" on failure.
    pub fn described(description: impl Into<String>, f: F) -> Self {
        Self {
            f,
            description: description.into(),
            _phantom: PhantomData,
        }
    }
}

impl<I, O, F> Parser<I, O> for Satisfy<I, O, F>
where
    I: fmt::Debug,
    F: Fn(&I) -> Option<O>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        input
            .uncons()
            .and_then(|(head, rest)| (self.f)(head).map(|value| (rest.clone(), value)))
            .ok_or_else(|| mismatch(self.description.as_str(), input))
    }
}

#[derive(Clone)]
pub struct EndOfInput<I> {
    _phantom: PhantomData<I>,
}

impl<I> EndOfInput<I> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<I> Default for EndOfInput<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: fmt::Debug> Parser<I, ()> for EndOfInput<I> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, ()> {
        match input.head() {
            Ok(found) => Err(ParseError::unexpected(
                "end of input",
                format!("{:?}", found),
                input.clone(),
            )),
            Err(_) => Ok((input.clone(), ())),
        }
    }
}

/// Ordered choice. The right parser sees the same stream the left one was
/// given.
#[derive(Clone)]
pub struct Or<P1, P2, I, O> {
    left: P1,
    right: P2,
    _phantom: PhantomData<(I, O)>,
}

impl<P1, P2, I, O> Or<P1, P2, I, O> {
    pub fn new(left: P1, right: P2) -> Self {
        Self {
            left,
            right,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O> Parser<I, O> for Or<P1, P2, I, O>
where
    P1: Parser<I, O>,
    P2: Parser<I, O>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        match self.left.parse(input) {
            Ok(success) => Ok(success),
            Err(_) => self.right.parse(input),
        }
    }
}

// first success wins; otherwise the last failure
pub struct Choice<I, O> {
    parsers: Vec<BoxedParser<I, O>>,
}

impl<I, O> Choice<I, O> {
    pub fn new(parsers: Vec<BoxedParser<I, O>>) -> Self {
        Self { parsers }
    }
}

impl<I, O> Parser<I, O> for Choice<I, O> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        let mut last_error = None;
        for parser in &self.parsers {
            match parser.parse(input) {
                Ok(result) => return Ok(result),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| ParseError::failure("no alternatives", input.clone())))
    }
}

pub struct Sequence<I, O> {
    parsers: Vec<BoxedParser<I, O>>,
}

impl<I, O> Sequence<I, O> {
    pub fn new(parsers: Vec<BoxedParser<I, O>>) -> Self {
        Self { parsers }
    }
}

impl<I, O> Parser<I, Vec<O>> for Sequence<I, O> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, Vec<O>> {
        let mut results = Vec::with_capacity(self.parsers.len());
        let mut current = input.clone();
        for parser in &self.parsers {
            let (rest, value) = parser.parse(&current)?;
            results.push(value);
            current = rest;
        }
        Ok((current, results))
    }
}

// Tuple2
#[derive(Clone)]
pub struct Tuple2<P1, P2, I, O1, O2> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O1, O2)>,
}

impl<P1, P2, I, O1, O2> Tuple2<P1, P2, I, O1, O2> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, (O1, O2)> for Tuple2<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, (O1, O2)> {
        let (rest, result1) = self.parser1.parse(input)?;
        let (rest, result2) = self.parser2.parse(&rest)?;
        Ok((rest, (result1, result2)))
    }
}

#[derive(Clone)]
pub struct Preceded<P1, P2, I, O1, O2> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O1, O2)>,
}

impl<P1, P2, I, O1, O2> Preceded<P1, P2, I, O1, O2> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, O2> for Preceded<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O2> {
        let (rest, _) = self.parser1.parse(input)?;
        self.parser2.parse(&rest)
    }
}

#[derive(Clone)]
pub struct Terminated<P1, P2, I, O1, O2> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O1, O2)>,
}

impl<P1, P2, I, O1, O2> Terminated<P1, P2, I, O1, O2> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, O1> for Terminated<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O1> {
        let (rest, value) = self.parser1.parse(input)?;
        let (rest, _) = self.parser2.parse(&rest)?;
        Ok((rest, value))
    }
}

/// Content between two delimiters; only the content is kept.
#[derive(Clone)]
pub struct Delimited<L, P, R, I, OL, O, OR> {
    left: L,
    parser: P,
    right: R,
    _phantom: PhantomData<(I, OL, O, OR)>,
}

impl<L, P, R, I, OL, O, OR> Delimited<L, P, R, I, OL, O, OR> {
    pub fn new(left: L, parser: P, right: R) -> Self {
        Self {
            left,
            parser,
            right,
            _phantom: PhantomData,
        }
    }
}

impl<L, P, R, I, OL, O, OR> Parser<I, O> for Delimited<L, P, R, I, OL, O, OR>
where
    L: Parser<I, OL>,
    P: Parser<I, O>,
    R: Parser<I, OR>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        let (rest, _) = self.left.parse(input)?;
        let (rest, value) = self.parser.parse(&rest)?;
        let (rest, _) = self.right.parse(&rest)?;
        Ok((rest, value))
    }
}

// a panic inside `f` propagates
#[derive(Clone)]
pub struct Map<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> Map<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for Map<P, F, A, B>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, B> {
        self.parser
            .parse(input)
            .map(|(rest, value)| (rest, (self.f)(value)))
    }
}

#[derive(Clone)]
pub struct AsUnit<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> AsUnit<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, P, O> Parser<I, ()> for AsUnit<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, ()> {
        self.parser.parse(input).map(|(rest, _)| (rest, ()))
    }
}

/// `Some` on success, `None` without consuming on failure.
#[derive(Clone)]
pub struct Optional<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Optional<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Option<O>> for Optional<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, Option<O>> {
        match self.parser.parse(input) {
            Ok((rest, value)) => Ok((rest, Some(value))),
            Err(e) => {
                tracing::trace!(
                    target: "lazyparse::parser::optional",
                    error = %e,
                    position = input.position(),
                    "Optional parser suppressed an error"
                );
                Ok((input.clone(), None))
            }
        }
    }
}

/// Applies a parser until it fails, giving back whatever the failing
/// attempt consumed. Fails when fewer than `min` attempts succeeded, and an
/// attempt that consumes nothing ends the repetition.
#[derive(Clone)]
pub struct Many<P, I, O> {
    parser: P,
    min: usize,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Many<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self::at_least(parser, 0)
    }

    pub fn at_least(parser: P, min: usize) -> Self {
        Self {
            parser,
            min,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Many<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, Vec<O>> {
        let mut results = Vec::new();
        let mut current = input.clone();

        loop {
            match self.parser.parse(&current) {
                Ok((rest, value)) => {
                    results.push(value);
                    if rest.position() == current.position() {
                        if results.len() < self.min {
                            return Err(ParseError::unexpected(
                                format!("at least {} matches", self.min),
                                format!("{} before an attempt that consumed nothing", results.len()),
                                current,
                            ));
                        }
                        tracing::warn!(
                            target: "lazyparse::parser::many",
                            position = current.position(),
                            "Many parser stopped on an attempt that consumed nothing"
                        );
                        break;
                    }
                    current = rest;
                }
                Err(e) if results.len() < self.min => {
                    return Err(ParseError::unexpected(
                        format!("at least {} matches", self.min),
                        e.actual(),
                        e.remainder().clone(),
                    ));
                }
                Err(e) => {
                    tracing::trace!(
                        target: "lazyparse::parser::many",
                        error = %e,
                        position = current.position(),
                        items_collected = results.len(),
                        "Many parser stopped collection"
                    );
                    break;
                }
            }
        }

        Ok((current, results))
    }
}

// exactly `count` times, no partial list
#[derive(Clone)]
pub struct Times<P, I, O> {
    parser: P,
    count: usize,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Times<P, I, O> {
    pub fn new(parser: P, count: usize) -> Self {
        Self {
            parser,
            count,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Times<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, Vec<O>> {
        let mut results = Vec::with_capacity(self.count);
        let mut current = input.clone();
        for _ in 0..self.count {
            let (rest, value) = self.parser.parse(&current)?;
            results.push(value);
            current = rest;
        }
        Ok((current, results))
    }
}

/// Items each followed by an optional separator. A trailing separator is
/// absorbed.
#[derive(Clone)]
pub struct SeparatedList<P, S, I, O, OS> {
    item_parser: P,
    separator_parser: S,
    min: usize,
    _phantom: PhantomData<(I, O, OS)>,
}

impl<P, S, I, O, OS> SeparatedList<P, S, I, O, OS> {
    pub fn new(item_parser: P, separator_parser: S) -> Self {
        Self::at_least(item_parser, separator_parser, 0)
    }

    pub fn at_least(item_parser: P, separator_parser: S, min: usize) -> Self {
        Self {
            item_parser,
            separator_parser,
            min,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, OS, P, S> Parser<I, Vec<O>> for SeparatedList<P, S, I, O, OS>
where
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, Vec<O>> {
        let mut results = Vec::new();
        let mut current = input.clone();

        loop {
            let (rest, value) = match self.item_parser.parse(&current) {
                Ok(success) => success,
                Err(e) if results.len() < self.min => {
                    return Err(ParseError::unexpected(
                        format!("at least {} matches", self.min),
                        e.actual(),
                        e.remainder().clone(),
                    ));
                }
                Err(_) => break,
            };
            results.push(value);
            let rest = match self.separator_parser.parse(&rest) {
                Ok((after_separator, _)) => after_separator,
                Err(_) => rest,
            };
            if rest.position() == current.position() {
                if results.len() < self.min {
                    return Err(ParseError::unexpected(
                        format!("at least {} matches", self.min),
                        format!("{} before an attempt that consumed nothing", results.len()),
                        current,
                    ));
                }
                break;
            }
            current = rest;
        }

        Ok((current, results))
    }
}

#[derive(Clone)]
pub struct WithContext<P, C> {
    parser: P,
    context: C,
}

impl<P, C> WithContext<P, C> {
    pub fn new(parser: P, context: C) -> Self {
        Self { parser, context }
    }
}

impl<I, O, P, C: ToString> Parser<I, O> for WithContext<P, C>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        self.parser
            .parse(input)
            .map_err(|e| e.with_context(&self.context.to_string()))
    }
}

/// Builds the parser on every invocation, for grammars written as
/// recursive functions.
#[derive(Clone)]
pub struct Lazy<F> {
    f: F,
}

impl<F> Lazy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I, O, F, P> Parser<I, O> for Lazy<F>
where
    F: Fn() -> P,
    P: Parser<I, O>,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        (self.f)().parse(input)
    }
}
