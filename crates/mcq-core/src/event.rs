#![forbid(unsafe_code)]

//! Typed change events.
//!
//! A [`MatchChange`] is addressed by position, not by query text. The index
//! is fixed when the listener is registered, so duplicate query strings never
//! need a tie-break and a change can never land on the wrong entry.

use crate::match_vector::MatchVector;
use crate::query::QueryIndex;

/// A single query's match state flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchChange {
    /// Position of the query in the bound list.
    pub index: QueryIndex,
    /// New match state.
    pub matches: bool,
}

impl MatchChange {
    /// Create a change event.
    #[must_use]
    pub const fn new(index: QueryIndex, matches: bool) -> Self {
        Self { index, matches }
    }

    /// Apply this change to `vector`. Returns `true` if the vector changed.
    pub fn apply(self, vector: &mut MatchVector) -> bool {
        vector.set(self.index, self.matches)
    }
}
