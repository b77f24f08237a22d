#![forbid(unsafe_code)]

//! Test harness for mcq bindings.
//!
//! - [`FakeEngine`]: a deterministic container-query engine over elements
//!   whose size the test controls, with immediate or deferred delivery.
//! - [`ContainerQuery`]: the size-feature evaluator behind it.
//! - [`SnapshotRecorder`]: captures every match vector a controller emits.
//!
//! Integration tests for the binding lifecycle live in `tests/`.

pub mod engine;
pub mod query;
pub mod recorder;

pub use engine::{Delivery, FakeElement, FakeEngine, FakeHandle};
pub use query::{ContainerQuery, QueryParseError, Size};
pub use recorder::SnapshotRecorder;

use mcq_runtime::{BindingConfig, EngineCapability, QueryBindingController};

/// A ready engine and a controller bound to it, for `queries`.
pub fn fixture<const N: usize>(
    queries: [&str; N],
    config: BindingConfig,
) -> (FakeEngine, QueryBindingController<FakeEngine>) {
    let engine = FakeEngine::new();
    let controller =
        QueryBindingController::with_config(EngineCapability::ready(engine.clone()), queries, config);
    (engine, controller)
}
