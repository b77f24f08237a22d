#![forbid(unsafe_code)]

//! Ordered container-query lists.
//!
//! A [`QueryList`] is immutable once built and compares by value: two lists
//! holding the same strings in the same order are equal even when they were
//! built independently. Controllers rely on this to decide whether a new list
//! requires a rebind.
//!
//! # Invariants
//!
//! 1. Length never changes after construction.
//! 2. Cloning shares storage; it never copies the strings.
//! 3. Duplicate strings are allowed and keep distinct indices.

use std::fmt;
use std::rc::Rc;

/// Position of a query within a [`QueryList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryIndex(usize);

impl QueryIndex {
    /// Wrap a raw position.
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw position.
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for QueryIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for QueryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered list of container query strings.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryList {
    queries: Rc<[String]>,
}

impl QueryList {
    /// Build a list from any sequence of query strings.
    pub fn new<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queries: queries.into_iter().map(Into::into).collect(),
        }
    }

    /// The empty list. Binding it is legal and creates no subscriptions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the list has no queries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Query at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: QueryIndex) -> Option<&str> {
        self.queries.get(index.get()).map(String::as_str)
    }

    /// Iterate `(index, query)` pairs in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (QueryIndex, &str)> + '_ {
        self.queries
            .iter()
            .enumerate()
            .map(|(i, q)| (QueryIndex(i), q.as_str()))
    }

    /// Borrow the queries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.queries
    }

    /// Whether both lists share the same storage (cheaper than `==`).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.queries, &other.queries)
    }
}

impl fmt::Debug for QueryList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.queries.iter()).finish()
    }
}

impl<S: Into<String>> FromIterator<S> for QueryList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for QueryList {
    fn from(queries: [S; N]) -> Self {
        Self::new(queries)
    }
}

impl From<Vec<String>> for QueryList {
    fn from(queries: Vec<String>) -> Self {
        Self {
            queries: queries.into(),
        }
    }
}

impl From<&[&str]> for QueryList {
    fn from(queries: &[&str]) -> Self {
        Self::new(queries.iter().copied())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for QueryList {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for QueryList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(Self::from)
    }
}
