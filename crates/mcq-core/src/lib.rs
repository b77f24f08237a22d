#![forbid(unsafe_code)]

//! Core data types for mcq container-query bindings.
//!
//! This crate holds the plain values that flow between a binding controller
//! and its consumers:
//!
//! - [`QueryList`]: the ordered, value-compared list of container queries.
//! - [`MatchVector`]: the ordered boolean match state, one entry per query.
//! - [`MatchChange`]: a typed change event addressed by [`QueryIndex`].
//!
//! Nothing here observes anything; the reactive machinery lives in
//! `mcq-runtime`.

pub mod event;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod match_vector;
pub mod query;

pub use event::MatchChange;
pub use match_vector::MatchVector;
pub use query::{QueryIndex, QueryList};
