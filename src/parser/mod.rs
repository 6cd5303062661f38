//! # Parser Combinators
//!
//! Parsers are immutable values implementing [`Parser`]. They take an
//! explicit [`Stream`](crate::stream::Stream) handle and return either the
//! remainder and a value or a [`ParseError`]. Because the stream is
//! memoized and shared, backtracking is just holding on to an older handle.

pub mod combinators;
pub mod core;
pub mod ext;
pub mod pattern;
pub mod prelude;
pub mod reference;
pub mod sequence;
pub mod trace;

pub use core::BoxedParser;
pub use core::ParseError;
pub use core::ParseResult;
pub use core::Parser;
pub use ext::{ParserExt, TextParser};
pub use pattern::{Pattern, PatternError};
pub use reference::{GrammarError, Reference};
pub use trace::{TraceEvent, TraceLog, TraceObserver, TraceOutcome, TracingObserver};
