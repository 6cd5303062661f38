//! Parser combinators over a lazy, memoized character stream.
//!
//! Input is pulled from its source one element at a time, only when a parser
//! asks for it, and every element is read exactly once however often the
//! grammar backtracks over it. The [`parser::pattern`] bridge brings regular
//! expressions into the same model without reading past their match.
//!
//! ```
//! use lazyparse::parser::prelude::*;
//!
//! let date = pattern(r"\d{4}/\d{1,2}/\d{1,2}").unwrap();
//! let (rest, value) = date.parse_str("1977/1/10ABC").unwrap();
//! assert_eq!(value, "1977/1/10");
//! assert_eq!(rest.to_string(), "ABC");
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod stream;

// Re-exports
pub use config::PatternConfig;
pub use error::*;
pub use parser::{ParseError, ParseResult, Parser, ParserExt, TextParser};
pub use stream::Stream;
