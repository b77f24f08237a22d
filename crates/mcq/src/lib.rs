#![forbid(unsafe_code)]

//! mcq: keep a component's container-query match state in sync with its element.
//!
//! ```ignore
//! use mcq::prelude::*;
//!
//! let container = MatchContainer::new(
//!     EngineCapability::ready(engine),
//!     ["(min-width: 200px)", "(min-width: 400px)"],
//! );
//! container.slot().mount(element);
//! let wide = container.controller().binding_at(1);
//! ```
//!
//! The engine is anything implementing [`ContainerQueryEngine`](runtime::ContainerQueryEngine).
//! `mcq-harness` provides an in-memory one for tests.

pub use mcq_core as core;
#[cfg(feature = "runtime")]
pub use mcq_runtime as runtime;

pub use mcq_core::{MatchChange, MatchVector, QueryIndex, QueryList};

#[cfg(feature = "runtime")]
pub use mcq_runtime::{
    BindingConfig, ContainerQueryEngine, DetachPolicy, ElementSlot, EmitPolicy, EngineCapability,
    MatchContainer, MatchHandle, QueryBindingController, SessionTeardown, Subscription,
};

#[cfg(feature = "policy-config")]
pub use mcq_runtime::ConfigError;

#[cfg(feature = "tracing-json")]
pub use mcq_core::logging;

pub mod prelude {
    //! Everything a component needs to bind and read match state.

    pub use mcq_core::{MatchVector, QueryIndex, QueryList};

    #[cfg(feature = "runtime")]
    pub use mcq_runtime::{
        BindingConfig, ContainerQueryEngine, DetachPolicy, ElementSlot, EmitPolicy,
        EngineCapability, MatchContainer, MatchHandle, QueryBindingController, Subscription,
    };
    #[cfg(feature = "runtime")]
    pub use mcq_runtime::reactive::{BatchScope, Binding, BindingScope};
}

#[cfg(all(test, feature = "runtime"))]
mod tests {
    use super::prelude::*;
    use mcq_harness::{FakeEngine, Size};

    #[test]
    fn prelude_covers_the_component_path() {
        let engine = FakeEngine::new();
        let el = engine.create_element(Size::new(320.0, 0.0));
        let container = MatchContainer::new(
            EngineCapability::ready(engine.clone()),
            ["(min-width: 200px)", "(min-width: 400px)"],
        );
        let wide = container.controller().binding_at(1);

        container.slot().mount(el);
        assert_eq!(container.matches(), MatchVector::from([true, false]));
        assert!(!wide.get());

        engine.resize(el, Size::new(480.0, 0.0));
        assert!(wide.get());
    }
}
