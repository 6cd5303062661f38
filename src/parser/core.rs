//! # Core Parser Definitions
//!
//! This module defines the parser interface and the failure type that every
//! combinator in the crate builds on.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::stream::Stream;

/// A parser takes a stream handle and either succeeds with the remainder and
/// a value, or fails with a [`ParseError`]. Parsers hold no mutable state, so
/// the same input always gives the same answer.
pub trait Parser<I, O> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O>;
}

pub type ParseResult<I, O> = Result<(Stream<I>, O), ParseError<I>>;

/// A type-erased parser that can be shared between threads.
pub type BoxedParser<I, O> = Box<dyn Parser<I, O> + Send + Sync>;

impl<I, O, P: Parser<I, O> + ?Sized> Parser<I, O> for &P {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        (**self).parse(input)
    }
}

impl<I, O, P: Parser<I, O> + ?Sized> Parser<I, O> for Box<P> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        (**self).parse(input)
    }
}

impl<I, O, P: Parser<I, O> + ?Sized> Parser<I, O> for Arc<P> {
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        (**self).parse(input)
    }
}

const END_OF_INPUT: &str = "end of input";

/// Every variant keeps the stream at the point of failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError<I> {
    /// Something other than the expected input was found
    #[error(
        "Unexpected: expected {expected}, found {actual} at position {}{}",
        .remainder.position(),
        context_suffix(.context)
    )]
    Unexpected {
        expected: String,
        actual: String,
        remainder: Stream<I>,
        context: Option<String>,
    },
    /// The stream ended before the expected input
    #[error(
        "Unexpected EOF: expected {expected} at position {}{}",
        .remainder.position(),
        context_suffix(.context)
    )]
    UnexpectedEof {
        expected: String,
        remainder: Stream<I>,
        context: Option<String>,
    },
    /// Explicit failure
    #[error(
        "Failure: {message} at position {}{}",
        .remainder.position(),
        context_suffix(.context)
    )]
    Failure {
        message: String,
        remainder: Stream<I>,
        context: Option<String>,
    },
}

fn context_suffix(context: &Option<String>) -> String {
    match context {
        Some(context) => format!(", context: {}", context),
        None => String::new(),
    }
}

impl<I> ParseError<I> {
    pub fn unexpected(
        expected: impl Into<String>,
        actual: impl Into<String>,
        remainder: Stream<I>,
    ) -> Self {
        ParseError::Unexpected {
            expected: expected.into(),
            actual: actual.into(),
            remainder,
            context: None,
        }
    }

    pub fn eof(expected: impl Into<String>, remainder: Stream<I>) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            remainder,
            context: None,
        }
    }

    pub fn failure(message: impl Into<String>, remainder: Stream<I>) -> Self {
        ParseError::Failure {
            message: message.into(),
            remainder,
            context: None,
        }
    }

    /// What the parser was looking for. For explicit failures this is the
    /// failure message.
    pub fn expected(&self) -> &str {
        match self {
            ParseError::Unexpected { expected, .. } => expected,
            ParseError::UnexpectedEof { expected, .. } => expected,
            ParseError::Failure { message, .. } => message,
        }
    }

    /// What was found instead.
    pub fn actual(&self) -> &str {
        match self {
            ParseError::Unexpected { actual, .. } => actual,
            ParseError::UnexpectedEof { .. } => END_OF_INPUT,
            ParseError::Failure { .. } => "failure",
        }
    }

    /// The stream at the point of failure.
    pub fn remainder(&self) -> &Stream<I> {
        match self {
            ParseError::Unexpected { remainder, .. } => remainder,
            ParseError::UnexpectedEof { remainder, .. } => remainder,
            ParseError::Failure { remainder, .. } => remainder,
        }
    }

    pub fn position(&self) -> usize {
        self.remainder().position()
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            ParseError::Unexpected { context, .. } => context.as_deref(),
            ParseError::UnexpectedEof { context, .. } => context.as_deref(),
            ParseError::Failure { context, .. } => context.as_deref(),
        }
    }

    /// Prefixes the context chain with `ctx`, outermost first.
    pub fn with_context(self, ctx: &str) -> Self {
        let chain = |context: Option<String>| match context {
            Some(inner) => Some(format!("{} -> {}", ctx, inner)),
            None => Some(ctx.to_string()),
        };
        match self {
            ParseError::Unexpected {
                expected,
                actual,
                remainder,
                context,
            } => ParseError::Unexpected {
                expected,
                actual,
                remainder,
                context: chain(context),
            },
            ParseError::UnexpectedEof {
                expected,
                remainder,
                context,
            } => ParseError::UnexpectedEof {
                expected,
                remainder,
                context: chain(context),
            },
            ParseError::Failure {
                message,
                remainder,
                context,
            } => ParseError::Failure {
                message,
                remainder,
                context: chain(context),
            },
        }
    }
}

/// Builds the failure for a primitive that expected `expected` at `input`:
/// end of input if the stream is exhausted, otherwise the element found.
pub(crate) fn mismatch<I: fmt::Debug>(expected: impl Into<String>, input: &Stream<I>) -> ParseError<I> {
    match input.head() {
        Ok(found) => ParseError::unexpected(expected, format!("{:?}", found), input.clone()),
        Err(_) => ParseError::eof(expected, input.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let input = Stream::from("xyz").advance(1);
        let error = ParseError::unexpected("'a'", "'y'", input.clone());
        assert_eq!(error.expected(), "'a'");
        assert_eq!(error.actual(), "'y'");
        assert_eq!(error.position(), 1);
        assert_eq!(error.remainder(), &input);

        let error: ParseError<char> = ParseError::eof("digit", Stream::empty());
        assert_eq!(error.actual(), "end of input");
    }

    #[test]
    fn test_with_context_chains_outermost_first() {
        let error = ParseError::failure("boom", Stream::from("a"))
            .with_context("number")
            .with_context("expression");
        assert_eq!(error.context(), Some("expression -> number"));
        assert_eq!(
            error.to_string(),
            "Failure: boom at position 0, context: expression -> number"
        );
    }

    #[test]
    fn test_mismatch_describes_found_element() {
        let error = mismatch("'a'", &Stream::from("b"));
        assert_eq!(
            error.to_string(),
            "Unexpected: expected 'a', found 'b' at position 0"
        );

        let error = mismatch("'a'", &Stream::from(""));
        assert_eq!(
            error.to_string(),
            "Unexpected EOF: expected 'a' at position 0"
        );
    }
}
