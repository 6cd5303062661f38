//! # Lazy Streams
//!
//! A [`Stream`] is an immutable, memoized view over a pull source. Each node
//! is either empty or holds one element plus the rest of the stream, and the
//! rest is only pulled from the source the first time somebody asks for it.
//!
//! ## Sharing and Backtracking
//!
//! Cloning a stream clones a handle, not the data. Every handle that denotes
//! the same logical position points at the same node, so a parser that fails
//! halfway through simply drops its handle and the caller resumes from the
//! one it kept. The source is read at most once per element no matter how
//! many branches walk over it.
//!
//! ## Memoization
//!
//! Each node owns a compute-once cell ([`OnceLock`]). When two threads force
//! the same node, exactly one of them runs the pull and both observe the
//! same successor. If the pull panics, the node stays unforced and every
//! later attempt to force it panics too.
//!
//! ```
//! use lazyparse::stream::Stream;
//!
//! let stream = Stream::from("abc");
//! assert_eq!(stream.head(), Ok(&'a'));
//! assert_eq!(stream.tail().unwrap().to_string(), "bc");
//! ```

mod source;

pub use source::Utf8Chars;

use std::fmt;
use std::io::Read;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use thiserror::Error;

/// Error returned when reading past the end of a stream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    #[error("Empty stream: no element at position {position}")]
    Empty { position: usize },
}

type Thunk<T> = Box<dyn FnOnce() -> Step<T> + Send>;

enum Step<T> {
    Empty,
    Cons(T, Stream<T>),
    // Forwards to another stream; used for remainders that are only known
    // once a lazy repetition has run to completion.
    Alias(Stream<T>),
}

struct Node<T> {
    offset: Option<usize>,
    step: OnceLock<Step<T>>,
    pending: Mutex<Option<Thunk<T>>>,
}

impl<T> Node<T> {
    fn force(&self) -> &Step<T> {
        self.step.get_or_init(|| {
            // only the winner of the OnceLock gets here, so the lock is never contended
            let thunk = self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            match thunk {
                Some(thunk) => thunk(),
                // an earlier pull of this node panicked and took the thunk with it
                None => panic!("stream source panicked while producing this element"),
            }
        })
    }

    fn detach(&mut self) -> Option<Arc<Node<T>>> {
        match self.step.take()? {
            Step::Cons(_, rest) | Step::Alias(rest) => Some(rest.node),
            Step::Empty => None,
        }
    }
}

impl<T> Drop for Node<T> {
    // Unlink the chain iteratively; a recursive drop overflows on long inputs.
    fn drop(&mut self) {
        let mut next = self.detach();
        while let Some(node) = next {
            next = match Arc::try_unwrap(node) {
                Ok(mut node) => node.detach(),
                Err(_) => None,
            };
        }
    }
}

/// Immutable, memoized, pull-based sequence of elements.
pub struct Stream<T> {
    node: Arc<Node<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<T> Stream<T> {
    fn ready(offset: usize, step: Step<T>) -> Self {
        Self {
            node: Arc::new(Node {
                offset: Some(offset),
                step: OnceLock::from(step),
                pending: Mutex::new(None),
            }),
        }
    }

    fn lazy<F>(offset: Option<usize>, thunk: F) -> Self
    where
        F: FnOnce() -> Step<T> + Send + 'static,
        T: 'static,
    {
        Self {
            node: Arc::new(Node {
                offset,
                step: OnceLock::new(),
                pending: Mutex::new(Some(Box::new(thunk))),
            }),
        }
    }

    /// Creates an exhausted stream.
    pub fn empty() -> Self {
        Self::ready(0, Step::Empty)
    }

    /// A stream whose contents are those of the stream returned by `f`,
    /// computed the first time this stream is inspected.
    pub(crate) fn deferred<F>(f: F) -> Self
    where
        F: FnOnce() -> Stream<T> + Send + 'static,
        T: 'static,
    {
        Self::lazy(None, move || Step::Alias(f()))
    }

    fn resolved(&self) -> &Stream<T> {
        let mut current = self;
        while let Step::Alias(target) = current.node.force() {
            current = target;
        }
        current
    }

    fn step(&self) -> &Step<T> {
        self.resolved().node.force()
    }

    /// Returns true when no element is left. Forces the current node.
    pub fn is_empty(&self) -> bool {
        matches!(self.step(), Step::Empty)
    }

    /// The current element.
    pub fn head(&self) -> Result<&T, StreamError> {
        match self.step() {
            Step::Cons(head, _) => Ok(head),
            _ => Err(StreamError::Empty {
                position: self.position(),
            }),
        }
    }

    /// The stream after the current element. The successor node itself is
    /// not forced.
    pub fn tail(&self) -> Result<Stream<T>, StreamError> {
        match self.step() {
            Step::Cons(_, rest) => Ok(rest.clone()),
            _ => Err(StreamError::Empty {
                position: self.position(),
            }),
        }
    }

    /// Head and tail at once, or `None` at the end.
    pub fn uncons(&self) -> Option<(&T, &Stream<T>)> {
        match self.step() {
            Step::Cons(head, rest) => Some((head, rest)),
            _ => None,
        }
    }

    /// Number of elements between the root of this stream and the current
    /// node. Ordinary nodes know their offset without pulling. The deferred
    /// remainder of a lazy repetition does not, so asking it runs the
    /// repetition to its end; use [`known_position`](Stream::known_position)
    /// to avoid that.
    pub fn position(&self) -> usize {
        match self.node.offset {
            Some(offset) => offset,
            None => self.resolved().node.offset.unwrap_or_default(),
        }
    }

    /// The position if it is known without forcing anything.
    pub fn known_position(&self) -> Option<usize> {
        let mut current = self;
        loop {
            if let Some(offset) = current.node.offset {
                return Some(offset);
            }
            match current.node.step.get() {
                Some(Step::Alias(target)) => current = target,
                Some(_) => return Some(0),
                None => return None,
            }
        }
    }

    /// Whether the current node has already been pulled from the source.
    pub fn is_forced(&self) -> bool {
        self.node.step.get().is_some()
    }

    /// Number of nodes from here on that are already materialized.
    pub fn materialized(&self) -> usize {
        let mut count = 0;
        let mut current = self;
        loop {
            match current.node.step.get() {
                Some(Step::Cons(_, rest)) => {
                    count += 1;
                    current = rest;
                }
                Some(Step::Alias(target)) => current = target,
                Some(Step::Empty) | None => return count,
            }
        }
    }

    /// The stream `n` elements further on, or the end if fewer remain.
    pub fn advance(&self, n: usize) -> Stream<T> {
        let mut current = self.clone();
        for _ in 0..n {
            match current.tail() {
                Ok(rest) => current = rest,
                Err(_) => break,
            }
        }
        current
    }

    /// Whether both handles point at the very same node.
    pub fn ptr_eq(&self, other: &Stream<T>) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    pub fn iter(&self) -> Iter<T> {
        Iter {
            current: self.clone(),
        }
    }
}

impl<T: Clone> Stream<T> {
    /// Collects up to `n` elements from the front of the stream.
    pub fn take(&self, n: usize) -> Vec<T> {
        self.iter().take(n).collect()
    }
}

impl<T: Send + Sync + 'static> Stream<T> {
    /// Wraps a pull source. Each call to `next` on the source produces one
    /// node, and the source is never polled again for that position.
    pub fn from_source<S>(source: S) -> Self
    where
        S: Iterator<Item = T> + Send + 'static,
    {
        Self::pull(source, 0)
    }

    fn pull<S>(mut source: S, offset: usize) -> Self
    where
        S: Iterator<Item = T> + Send + 'static,
    {
        Self::lazy(Some(offset), move || match source.next() {
            Some(item) => Step::Cons(item, Self::pull(source, offset + 1)),
            None => Step::Empty,
        })
    }

    /// An infinite stream of clones of `item`.
    pub fn repeat(item: T) -> Self
    where
        T: Clone,
    {
        Self::from_source(std::iter::repeat(item))
    }

    /// An infinite stream of values produced by `f`.
    pub fn repeat_with<F>(f: F) -> Self
    where
        F: FnMut() -> T + Send + 'static,
    {
        Self::from_source(std::iter::repeat_with(f))
    }

    /// `seed`, `f(seed)`, `f(f(seed))`, ...
    pub fn iterate<F>(seed: T, mut f: F) -> Self
    where
        F: FnMut(&T) -> T + Send + 'static,
    {
        Self::from_source(std::iter::successors(Some(seed), move |prev| Some(f(prev))))
    }
}

impl Stream<char> {
    /// Characters decoded as UTF-8 from a blocking byte source. Forcing a
    /// node reads exactly the bytes of one character.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::from_source(Utf8Chars::new(reader))
    }
}

impl<T: Send + Sync + 'static> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<T> = iter.into_iter().collect();
        Self::from_source(items.into_iter())
    }
}

impl From<&str> for Stream<char> {
    fn from(value: &str) -> Self {
        value.chars().collect()
    }
}

impl From<String> for Stream<char> {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl<T: PartialEq> PartialEq for Stream<T> {
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.clone();
        let mut right = other.clone();
        loop {
            if left.resolved().ptr_eq(right.resolved()) {
                return true;
            }
            let (next_left, next_right) = match (left.uncons(), right.uncons()) {
                (None, None) => return true,
                (Some((a, rest_a)), Some((b, rest_b))) if a == b => (rest_a.clone(), rest_b.clone()),
                _ => return false,
            };
            left = next_left;
            right = next_right;
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Stream<T> {
    // Only shows what has been materialized so far; never pulls.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        let mut current = self;
        loop {
            match current.node.step.get() {
                Some(Step::Cons(head, rest)) => {
                    list.entry(head);
                    current = rest;
                }
                Some(Step::Alias(target)) => current = target,
                Some(Step::Empty) => return list.finish(),
                None => {
                    list.entry(&format_args!(".."));
                    return list.finish();
                }
            }
        }
    }
}

impl fmt::Display for Stream<char> {
    /// Renders the remaining text, forcing the whole stream.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|c| fmt::Write::write_char(f, c))
    }
}

/// Iterator over the elements of a [`Stream`], cloning each one.
pub struct Iter<T> {
    current: Stream<T>,
}

impl<T: Clone> Iterator for Iter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let (head, rest) = match self.current.uncons() {
            Some((head, rest)) => (head.clone(), rest.clone()),
            None => return None,
        };
        self.current = rest;
        Some(head)
    }
}

impl<T: Clone> IntoIterator for &Stream<T> {
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Iter<T> {
        self.iter()
    }
}
