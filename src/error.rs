use thiserror::Error;

use crate::parser::pattern::PatternError;
use crate::parser::reference::GrammarError;
use crate::stream::StreamError;

/// Errors raised outside of parsing itself: building grammars, compiling
/// patterns, loading configuration. Grammar failures stay as
/// [`ParseError`](crate::parser::ParseError) values.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
