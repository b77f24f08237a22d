#![forbid(unsafe_code)]

//! Component-level glue: an element slot wired to a controller.
//!
//! A component creates one [`MatchContainer`] with its query list, hands
//! [`slot()`](MatchContainer::slot) to whatever mounts the element, and reads
//! [`matches()`](MatchContainer::matches) while rendering.
//!
//! ```ignore
//! let container = MatchContainer::new(capability, ["(min-width: 200px)", "(min-width: 400px)"]);
//! container.slot().mount(element);
//! let [narrow, wide] = [container.get(0), container.get(1)];
//! ```

use std::fmt;

use mcq_core::{MatchVector, QueryList};

use crate::attachment::ElementSlot;
use crate::config::BindingConfig;
use crate::controller::QueryBindingController;
use crate::engine::{ContainerQueryEngine, EngineCapability};
use crate::reactive::{Binding, BindingScope, Subscription};

/// An element slot, a controller, and the link between them.
///
/// Dropping the container releases the link and every engine listener.
pub struct MatchContainer<G: ContainerQueryEngine> {
    slot: ElementSlot<G::Element>,
    controller: QueryBindingController<G>,
    scope: BindingScope,
}

impl<G: ContainerQueryEngine> MatchContainer<G> {
    /// Create a container with the default policy.
    pub fn new(capability: EngineCapability<G>, queries: impl Into<QueryList>) -> Self {
        Self::with_config(capability, queries, BindingConfig::default())
    }

    /// Create a container with an explicit policy.
    pub fn with_config(
        capability: EngineCapability<G>,
        queries: impl Into<QueryList>,
        config: BindingConfig,
    ) -> Self {
        let slot = ElementSlot::new();
        let controller = QueryBindingController::with_config(capability, queries, config);
        let mut scope = BindingScope::new();
        scope.hold(controller.connect(&slot));
        Self {
            slot,
            controller,
            scope,
        }
    }

    /// The slot to mount the target element into.
    #[must_use]
    pub fn slot(&self) -> &ElementSlot<G::Element> {
        &self.slot
    }

    /// The underlying controller.
    #[must_use]
    pub fn controller(&self) -> &QueryBindingController<G> {
        &self.controller
    }

    /// Snapshot of the match vector.
    #[must_use]
    pub fn matches(&self) -> MatchVector {
        self.controller.matches()
    }

    /// Match state at `index`; `false` when out of range or never observed.
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        self.controller.get(index)
    }

    /// Live read binding for the whole vector.
    #[must_use]
    pub fn binding(&self) -> Binding<MatchVector> {
        self.controller.binding()
    }

    /// Replace the query list; rebinds if an element is mounted.
    pub fn set_queries(&self, queries: impl Into<QueryList>) -> bool {
        self.controller.set_queries(queries)
    }

    /// Receive every new snapshot.
    pub fn subscribe(&self, callback: impl Fn(&MatchVector) + 'static) -> Subscription {
        self.controller.subscribe(callback)
    }
}

impl<G: ContainerQueryEngine> Drop for MatchContainer<G> {
    fn drop(&mut self) {
        self.scope.clear();
        self.controller.detach();
    }
}

impl<G: ContainerQueryEngine> fmt::Debug for MatchContainer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchContainer")
            .field("slot", &self.slot)
            .field("controller", &self.controller)
            .finish()
    }
}
