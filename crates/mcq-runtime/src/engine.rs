#![forbid(unsafe_code)]

//! The container-query engine seam.
//!
//! The binding controller does not evaluate queries. It asks a
//! [`ContainerQueryEngine`] for a [`MatchHandle`] per `(element, query)`
//! pair, reads the handle's current state once, and listens for changes.
//!
//! Engine availability is explicit: an [`EngineCapability`] starts either
//! ready or unavailable and can be installed later. Controllers check it at
//! attach time; nothing is activated by merely linking a crate.
//!
//! # Engine contract
//!
//! 1. `observe` never blocks and may return `None` when the element cannot
//!    be observed.
//! 2. A listener registered through [`MatchHandle::subscribe`] is called once
//!    per match-state flip, on the thread that owns the handle.
//! 3. Releasing the returned [`Subscription`] stops delivery immediately,
//!    including deliveries already queued by the engine.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::reactive::{Observable, Subscription};

/// Listener called with the new match state.
pub type ChangeListener = Rc<dyn Fn(bool)>;

/// One `(element, query)` observation.
pub trait MatchHandle {
    /// Current match state.
    fn matches(&self) -> bool;

    /// Register `listener` for match-state flips.
    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

/// Produces match handles for an element.
pub trait ContainerQueryEngine: 'static {
    /// The element type queries are evaluated against.
    type Element: Clone + PartialEq + fmt::Debug + 'static;
    /// The handle type returned by [`observe`](Self::observe).
    type Handle: MatchHandle + 'static;

    /// Observe `query` against `element`.
    fn observe(&self, element: &Self::Element, query: &str) -> Option<Self::Handle>;
}

impl<G: ContainerQueryEngine> ContainerQueryEngine for Rc<G> {
    type Element = G::Element;
    type Handle = G::Handle;

    fn observe(&self, element: &Self::Element, query: &str) -> Option<Self::Handle> {
        (**self).observe(element, query)
    }
}

/// Shared, explicitly initialized access to an engine.
///
/// Clones share state: installing the engine through one clone makes it
/// visible to every controller holding another.
pub struct EngineCapability<G> {
    engine: Rc<RefCell<Option<Rc<G>>>>,
    ready: Observable<bool>,
}

impl<G> Clone for EngineCapability<G> {
    fn clone(&self) -> Self {
        Self {
            engine: Rc::clone(&self.engine),
            ready: self.ready.clone(),
        }
    }
}

impl<G: ContainerQueryEngine> EngineCapability<G> {
    /// A capability with no engine yet.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            engine: Rc::new(RefCell::new(None)),
            ready: Observable::new(false),
        }
    }

    /// A capability that is ready immediately.
    #[must_use]
    pub fn ready(engine: G) -> Self {
        let capability = Self::unavailable();
        capability.install(engine);
        capability
    }

    /// Install (or replace) the engine. Returns `true` on the first install.
    ///
    /// Ready listeners run on the first install only.
    pub fn install(&self, engine: G) -> bool {
        *self.engine.borrow_mut() = Some(Rc::new(engine));
        let first = self.ready.set(true);
        tracing::debug!(first, "container query engine installed");
        first
    }

    /// The engine, if installed.
    #[must_use]
    pub fn engine(&self) -> Option<Rc<G>> {
        self.engine.borrow().clone()
    }

    /// Whether an engine is installed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// Run `callback` when the engine becomes ready.
    ///
    /// Does not run for an engine that is already installed.
    pub fn on_ready(&self, callback: impl Fn() + 'static) -> Subscription {
        self.ready.subscribe(move |ready| {
            if *ready {
                callback();
            }
        })
    }
}

impl<G> fmt::Debug for EngineCapability<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineCapability")
            .field("ready", &self.engine.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubEngine;
    use std::cell::Cell;

    #[test]
    fn unavailable_then_install() {
        let cap: EngineCapability<StubEngine> = EngineCapability::unavailable();
        assert!(!cap.is_ready());
        assert!(cap.engine().is_none());

        let fired = Rc::new(Cell::new(0));
        let f = Rc::clone(&fired);
        let _sub = cap.on_ready(move || f.set(f.get() + 1));

        assert!(cap.install(StubEngine::new()));
        assert!(cap.is_ready());
        assert_eq!(fired.get(), 1);

        assert!(!cap.install(StubEngine::new()), "second install is a replace");
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn clones_share_installation() {
        let cap: EngineCapability<StubEngine> = EngineCapability::unavailable();
        let other = cap.clone();
        cap.install(StubEngine::new());
        assert!(other.is_ready());
        assert!(other.engine().is_some());
    }

    #[test]
    fn rc_engine_delegates() {
        let engine = Rc::new(StubEngine::new());
        engine.set_initial("(min-width: 1px)", true);
        let handle = engine.observe(&1, "(min-width: 1px)");
        assert!(handle.is_some_and(|h| h.matches()));
    }

    #[test]
    fn debug_reports_readiness() {
        let cap = EngineCapability::ready(StubEngine::new());
        assert_eq!(format!("{cap:?}"), "EngineCapability { ready: true }");
    }
}
