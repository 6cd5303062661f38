use std::fmt;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use super::core::{ParseResult, Parser};
use crate::stream::Stream;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("Grammar rule `{name}` is already defined")]
    AlreadyDefined { name: String },
}

type Target<I, O> = Arc<dyn Parser<I, O> + Send + Sync>;

/// A named grammar rule that is defined after it is used.
///
/// Clones share the same definition, so a rule can appear inside its own
/// body:
///
/// ```
/// use lazyparse::parser::prelude::*;
/// use lazyparse::parser::{ParserExt, TextParser};
///
/// let nested: Reference<char, usize> = reference("nested");
/// nested
///     .set(
///         nested
///             .clone()
///             .between(character('('), character(')'))
///             .map(|depth| depth + 1)
///             .or(zero(0)),
///     )
///     .unwrap();
/// assert_eq!(nested.parse_str("((()))").unwrap().1, 3);
/// ```
///
/// A rule that contains itself keeps its definition alive through its own
/// handle, so recursive grammars are meant to be built once and kept.
pub struct Reference<I, O> {
    name: Arc<str>,
    target: Arc<OnceLock<Target<I, O>>>,
}

impl<I, O> Clone for Reference<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            target: Arc::clone(&self.target),
        }
    }
}

impl<I, O> Reference<I, O> {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            target: Arc::new(OnceLock::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_defined(&self) -> bool {
        self.target.get().is_some()
    }

    /// Defines the rule. A rule can only be defined once.
    pub fn set<P>(&self, parser: P) -> Result<(), GrammarError>
    where
        P: Parser<I, O> + Send + Sync + 'static,
    {
        self.target
            .set(Arc::new(parser))
            .map_err(|_| GrammarError::AlreadyDefined {
                name: self.name.to_string(),
            })?;
        tracing::debug!(target: "lazyparse::parser::reference", name = %self.name, "Defined grammar rule");
        Ok(())
    }
}

impl<I, O> fmt::Debug for Reference<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("name", &self.name)
            .field("defined", &self.is_defined())
            .finish()
    }
}

impl<I, O> Parser<I, O> for Reference<I, O> {
    /// # Panics
    ///
    /// Panics if the rule is invoked before [`Reference::set`] was called.
    /// That is a mistake in how the grammar was assembled, not a property of
    /// the input.
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, O> {
        match self.target.get() {
            Some(parser) => parser.parse(input),
            None => panic!("grammar rule `{}` was invoked before it was defined", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::combinators::{Equal, Zero};

    #[test]
    fn test_set_once() {
        let rule: Reference<char, char> = Reference::new("letter");
        assert!(!rule.is_defined());
        rule.set(Equal::new('a')).unwrap();
        assert!(rule.is_defined());

        let error = rule.clone().set(Equal::new('b')).unwrap_err();
        assert_eq!(
            error,
            GrammarError::AlreadyDefined {
                name: "letter".to_string()
            }
        );
        assert_eq!(error.to_string(), "Grammar rule `letter` is already defined");

        // the first definition stays in place
        assert_eq!(rule.parse(&Stream::from("a")).unwrap().1, 'a');
    }

    #[test]
    fn test_clones_share_definition() {
        let rule: Reference<char, u8> = Reference::new("zero");
        let handle = rule.clone();
        rule.set(Zero::new(0)).unwrap();
        assert!(handle.is_defined());
        assert_eq!(handle.parse(&Stream::from("")).unwrap().1, 0);
    }

    #[test]
    #[should_panic(expected = "grammar rule `expr` was invoked before it was defined")]
    fn test_undefined_reference_panics() {
        let rule: Reference<char, char> = Reference::new("expr");
        let _ = rule.parse(&Stream::from("x"));
    }
}
