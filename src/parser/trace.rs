//! # Parser Tracing
//!
//! [`Traced`] reports every invocation of the parser it wraps: the name it
//! was given, where it started, and how it ended. Reports go to a
//! [`TraceObserver`]; by default that is [`TracingObserver`], which emits
//! them as `tracing` events under the `lazyparse::trace` target.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use super::core::{ParseResult, Parser};
use crate::stream::Stream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceOutcome {
    /// `end` is `None` when the remainder is still a pending lazy
    /// repetition; tracing does not run it.
    Success { end: Option<usize>, value: String },
    Failure { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub name: String,
    pub start: usize,
    pub outcome: TraceOutcome,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            TraceOutcome::Success { end: Some(end), value } => write!(
                f,
                "{} [{}..{}] succeeded with {}",
                self.name, self.start, end, value
            ),
            TraceOutcome::Success { end: None, value } => write!(
                f,
                "{} [{}..?] succeeded with {}",
                self.name, self.start, value
            ),
            TraceOutcome::Failure { message } => {
                write!(f, "{} [{}] failed: {}", self.name, self.start, message)
            }
        }
    }
}

pub trait TraceObserver: Send + Sync {
    fn observe(&self, event: &TraceEvent);
}

/// Forwards trace events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TraceObserver for TracingObserver {
    fn observe(&self, event: &TraceEvent) {
        tracing::debug!(
            target: "lazyparse::trace",
            parser = %event.name,
            start = event.start,
            success = matches!(event.outcome, TraceOutcome::Success { .. }),
            "{}",
            event
        );
    }
}

/// Collects trace lines in memory.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TraceObserver for TraceLog {
    fn observe(&self, event: &TraceEvent) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.to_string());
    }
}

/// Reports the outcome of the inner parser without altering it.
pub struct Traced<P, I, O> {
    parser: P,
    name: String,
    observer: Arc<dyn TraceObserver>,
    _phantom: PhantomData<fn() -> (I, O)>,
}

impl<P: Clone, I, O> Clone for Traced<P, I, O> {
    fn clone(&self) -> Self {
        Self {
            parser: self.parser.clone(),
            name: self.name.clone(),
            observer: Arc::clone(&self.observer),
            _phantom: PhantomData,
        }
    }
}

impl<P, I, O> Traced<P, I, O> {
    pub fn new(parser: P, name: &str) -> Self {
        Self::with_observer(parser, name, Arc::new(TracingObserver))
    }

    pub fn with_observer(parser: P, name: &str, observer: Arc<dyn TraceObserver>) -> Self {
        Self {
            parser,
            name: name.to_string(),
            observer,
            _phantom: PhantomData,
        }
    }
}

impl<P, I, O> Parser<I, O> for Traced<P, I, O>
where
    P: Parser<I, O>,
    O: fmt::Debug,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        let start = input.position();
        let result = self.parser.parse(input);
        let outcome = match &result {
            Ok((rest, value)) => TraceOutcome::Success {
                end: rest.known_position(),
                value: format!("{:?}", value),
            },
            Err(e) => TraceOutcome::Failure {
                message: e.to_string(),
            },
        };
        self.observer.observe(&TraceEvent {
            name: self.name.clone(),
            start,
            outcome,
        });
        result
    }
}
