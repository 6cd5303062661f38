use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use super::core::{ParseResult, Parser};
use crate::stream::Stream;

/// Lazy repetition of an item with an optional separator.
///
/// Succeeds immediately. The value is a stream of items that are parsed
/// only as the stream is inspected; the remainder is a stream that runs the
/// repetition to its end the first time it is inspected.
pub struct SequenceOf<P, S, I, O, OS> {
    item: Arc<P>,
    separator: Arc<S>,
    _phantom: PhantomData<fn() -> (I, O, OS)>,
}

impl<P, S, I, O, OS> Clone for SequenceOf<P, S, I, O, OS> {
    fn clone(&self) -> Self {
        Self {
            item: Arc::clone(&self.item),
            separator: Arc::clone(&self.separator),
            _phantom: PhantomData,
        }
    }
}

impl<P, S, I, O, OS> SequenceOf<P, S, I, O, OS> {
    pub fn new(item: P, separator: S) -> Self {
        Self {
            item: Arc::new(item),
            separator: Arc::new(separator),
            _phantom: PhantomData,
        }
    }
}

struct Steps<P, S, I, O, OS> {
    item: Arc<P>,
    separator: Arc<S>,
    current: Option<Stream<I>>,
    end: Arc<OnceLock<Stream<I>>>,
    _phantom: PhantomData<fn() -> (O, OS)>,
}

impl<P, S, I, O, OS> Steps<P, S, I, O, OS> {
    fn finish(&mut self, at: Stream<I>) {
        tracing::trace!(
            target: "lazyparse::parser::sequence",
            position = at.position(),
            "Lazy sequence finished"
        );
        self.current = None;
        // set once; the iterator stops yielding after this
        let _ = self.end.set(at);
    }
}

impl<P, S, I, O, OS> Iterator for Steps<P, S, I, O, OS>
where
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    type Item = O;

    fn next(&mut self) -> Option<O> {
        let current = self.current.take()?;
        match self.item.parse(&current) {
            Ok((rest, value)) => {
                let rest = match self.separator.parse(&rest) {
                    Ok((after_separator, _)) => after_separator,
                    Err(_) => rest,
                };
                if rest.position() == current.position() {
                    self.finish(rest);
                } else {
                    self.current = Some(rest);
                }
                Some(value)
            }
            Err(_) => {
                self.finish(current);
                None
            }
        }
    }
}

impl<P, S, I, O, OS> Parser<I, Stream<O>> for SequenceOf<P, S, I, O, OS>
where
    P: Parser<I, O> + Send + Sync + 'static,
    S: Parser<I, OS> + Send + Sync + 'static,
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
    OS: 'static,
{
    fn parse(&self, input: &Stream<I>) -> ParseResult<I, Stream<O>> {
        let end = Arc::new(OnceLock::new());
        let values = Stream::from_source(Steps {
            item: Arc::clone(&self.item),
            separator: Arc::clone(&self.separator),
            current: Some(input.clone()),
            end: Arc::clone(&end),
            _phantom: PhantomData::<fn() -> (O, OS)>,
        });

        let walk = values.clone();
        let remainder = Stream::deferred(move || {
            let mut current = walk;
            while let Ok(rest) = current.tail() {
                current = rest;
            }
            // the source records where it stopped before it reports the end
            end.get().cloned().unwrap_or_else(Stream::empty)
        });

        Ok((remainder, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::combinators::{Equal, Satisfy, Zero};
    use pretty_assertions::assert_eq;

    fn digit() -> Satisfy<char, u32, fn(&char) -> Option<u32>> {
        Satisfy::described("digit", |c: &char| c.to_digit(10))
    }

    #[test]
    fn test_items_are_parsed_on_demand() {
        let input = Stream::from("1,2,3;");
        let parser = SequenceOf::new(digit(), Equal::new(','));

        let (rest, values) = parser.parse(&input).unwrap();
        assert!(!values.is_forced());
        assert_eq!(input.materialized(), 0);

        assert_eq!(values.head(), Ok(&1));
        assert_eq!(input.materialized(), 2);

        assert_eq!(rest.to_string(), ";");
        assert_eq!(values.take(5), vec![1, 2, 3]);
        assert_eq!(rest.position(), 5);
    }

    #[test]
    fn test_empty_sequence() {
        let input = Stream::from("x");
        let parser = SequenceOf::new(digit(), Zero::new(()));
        let (rest, values) = parser.parse(&input).unwrap();
        assert!(values.is_empty());
        assert_eq!(rest, input);
        assert_eq!(rest.position(), 0);
    }

    #[test]
    fn test_remainder_first() {
        let input = Stream::from("123abc");
        let parser = SequenceOf::new(digit(), Zero::new(()));
        let (rest, values) = parser.parse(&input).unwrap();
        assert_eq!(rest.to_string(), "abc");
        assert_eq!(values.materialized(), 3);
        assert_eq!(values.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
