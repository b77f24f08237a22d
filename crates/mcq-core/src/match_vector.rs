#![forbid(unsafe_code)]

//! Ordered boolean match state.
//!
//! A [`MatchVector`] mirrors a [`QueryList`](crate::QueryList) position for
//! position. It is the consumer-visible state of a binding: every read sees
//! a complete vector, never a partially resized one.
//!
//! # Invariants
//!
//! 1. Writes address a single index and never touch the others.
//! 2. Out-of-range writes are ignored (no panic, no resize).
//! 3. Resizing only happens through [`MatchVector::all_false`] or
//!    [`MatchVector::reset`], which set every entry.

use std::fmt;
use std::ops::Index;

use crate::query::QueryIndex;

/// Ordered match state, one boolean per query.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MatchVector {
    matches: Vec<bool>,
}

impl MatchVector {
    /// An empty vector (no session has ever been bound).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            matches: Vec::new(),
        }
    }

    /// A vector of `len` entries, all `false`.
    #[must_use]
    pub fn all_false(len: usize) -> Self {
        Self {
            matches: vec![false; len],
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether the vector has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Match state at `index`, or `None` when out of range.
    #[must_use]
    pub fn get(&self, index: QueryIndex) -> Option<bool> {
        self.matches.get(index.get()).copied()
    }

    /// Write one entry. Returns `true` if the stored value changed.
    ///
    /// Out-of-range indices are ignored and return `false`.
    pub fn set(&mut self, index: QueryIndex, matches: bool) -> bool {
        match self.matches.get_mut(index.get()) {
            Some(slot) if *slot != matches => {
                *slot = matches;
                true
            }
            _ => false,
        }
    }

    /// Resize to `len` entries and clear them all to `false`.
    pub fn reset(&mut self, len: usize) {
        self.matches.clear();
        self.matches.resize(len, false);
    }

    /// Set every existing entry to `false`, keeping the length.
    pub fn clear_all(&mut self) {
        self.matches.iter_mut().for_each(|m| *m = false);
    }

    /// Whether any entry matches.
    #[must_use]
    pub fn any(&self) -> bool {
        self.matches.iter().any(|m| *m)
    }

    /// Whether every entry matches. `true` for an empty vector.
    #[must_use]
    pub fn all(&self) -> bool {
        self.matches.iter().all(|m| *m)
    }

    /// Index of the last matching entry.
    ///
    /// With ascending breakpoint lists this is the "current breakpoint".
    #[must_use]
    pub fn last_match(&self) -> Option<QueryIndex> {
        self.matches.iter().rposition(|m| *m).map(QueryIndex::new)
    }

    /// Borrow the entries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.matches
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = bool> + '_ {
        self.matches.iter().copied()
    }
}

impl Index<usize> for MatchVector {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        &self.matches[index]
    }
}

impl From<Vec<bool>> for MatchVector {
    fn from(matches: Vec<bool>) -> Self {
        Self { matches }
    }
}

impl<const N: usize> From<[bool; N]> for MatchVector {
    fn from(matches: [bool; N]) -> Self {
        Self {
            matches: matches.to_vec(),
        }
    }
}

impl FromIterator<bool> for MatchVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            matches: iter.into_iter().collect(),
        }
    }
}

impl PartialEq<[bool]> for MatchVector {
    fn eq(&self, other: &[bool]) -> bool {
        self.matches == other
    }
}

impl<const N: usize> PartialEq<[bool; N]> for MatchVector {
    fn eq(&self, other: &[bool; N]) -> bool {
        self.matches == other
    }
}

impl fmt::Debug for MatchVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.matches.iter()).finish()
    }
}
