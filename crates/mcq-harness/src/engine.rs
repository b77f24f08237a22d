#![forbid(unsafe_code)]

//! Deterministic in-memory container-query engine.
//!
//! Elements are created on the engine and resized by the test. Each
//! `observe` call creates an observation that re-evaluates its query on
//! every resize and notifies its listeners when the result flips.
//!
//! # Delivery
//!
//! - [`Delivery::Immediate`]: listeners run inside `resize`/`force`.
//! - [`Delivery::Deferred`]: deliveries queue up until [`FakeEngine::flush`]
//!   (arrival order) or [`FakeEngine::flush_reversed`] (reverse order),
//!   which lets tests reorder events across queries.
//!
//! Releasing a listener removes it from the engine and cancels its queued
//! deliveries: the queue holds only weak references.
//!
//! # Failure injection
//!
//! `observe` returns `None` for unknown elements and for queries that do not
//! parse, mirroring an engine that cannot evaluate the request.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use mcq_runtime::{ChangeListener, ContainerQueryEngine, MatchHandle, Subscription};

use crate::query::{ContainerQuery, Size};

/// Element handle issued by a [`FakeEngine`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeElement(u64);

impl FakeElement {
    /// Raw id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// When listeners run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    #[default]
    Immediate,
    Deferred,
}

struct ListenerEntry {
    id: u64,
    callback: Weak<dyn Fn(bool)>,
}

struct Observation {
    element: FakeElement,
    text: String,
    query: ContainerQuery,
    current: bool,
    listeners: Vec<ListenerEntry>,
}

struct Queued {
    callback: Weak<dyn Fn(bool)>,
    matches: bool,
}

#[derive(Default)]
struct EngineState {
    sizes: AHashMap<FakeElement, Size>,
    observations: AHashMap<u64, Observation>,
    queue: Vec<Queued>,
    delivery: Delivery,
    next_id: u64,
    observe_calls: usize,
    delivered: usize,
}

impl EngineState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Apply `flip` to matching observations and collect their live listeners.
    fn flip(
        &mut self,
        element: FakeElement,
        mut decide: impl FnMut(&Observation) -> Option<bool>,
    ) -> Vec<Queued> {
        let mut out = Vec::new();
        let mut ids: Vec<_> = self
            .observations
            .iter()
            .filter(|(_, o)| o.element == element)
            .map(|(id, _)| *id)
            .collect();
        // Observation order is creation order, independent of hashing.
        ids.sort_unstable();
        for id in ids {
            let Some(obs) = self.observations.get_mut(&id) else {
                continue;
            };
            let Some(next) = decide(obs) else {
                continue;
            };
            if next == obs.current {
                continue;
            }
            obs.current = next;
            out.extend(obs.listeners.iter().map(|l| Queued {
                callback: l.callback.clone(),
                matches: next,
            }));
        }
        out
    }
}

/// Shared handle to the engine state. Clones share the same engine.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Rc<RefCell<EngineState>>,
}

impl FakeEngine {
    /// An engine with immediate delivery.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine with the given delivery mode.
    #[must_use]
    pub fn with_delivery(delivery: Delivery) -> Self {
        let engine = Self::new();
        engine.state.borrow_mut().delivery = delivery;
        engine
    }

    /// Switch delivery mode. Already queued deliveries stay queued.
    pub fn set_delivery(&self, delivery: Delivery) {
        self.state.borrow_mut().delivery = delivery;
    }

    /// Create an element with `size`.
    pub fn create_element(&self, size: Size) -> FakeElement {
        let mut state = self.state.borrow_mut();
        let element = FakeElement(state.next_id());
        state.sizes.insert(element, size);
        element
    }

    /// Current size of `element`.
    #[must_use]
    pub fn size(&self, element: FakeElement) -> Option<Size> {
        self.state.borrow().sizes.get(&element).copied()
    }

    /// Resize `element` and notify observations whose result flipped.
    pub fn resize(&self, element: FakeElement, size: Size) {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.sizes.insert(element, size);
            state.flip(element, |obs| Some(obs.query.evaluate(size)))
        };
        tracing::trace!(?element, ?size, flips = pending.len(), "fake element resized");
        self.dispatch(pending);
    }

    /// Force every observation of `query` on `element` to `matches`.
    ///
    /// Bypasses evaluation; the next resize recomputes from size.
    pub fn force(&self, element: FakeElement, query: &str, matches: bool) {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.flip(element, |obs| (obs.text == query).then_some(matches))
        };
        self.dispatch(pending);
    }

    fn dispatch(&self, pending: Vec<Queued>) {
        let deferred = {
            let mut state = self.state.borrow_mut();
            if state.delivery == Delivery::Deferred {
                state.queue.extend(pending);
                None
            } else {
                Some(pending)
            }
        };
        if let Some(pending) = deferred {
            self.deliver(pending);
        }
    }

    fn deliver(&self, pending: Vec<Queued>) {
        for queued in pending {
            if let Some(callback) = queued.callback.upgrade() {
                self.state.borrow_mut().delivered += 1;
                callback(queued.matches);
            }
        }
    }

    /// Deliver queued events in arrival order. Returns how many ran.
    pub fn flush(&self) -> usize {
        let queue = std::mem::take(&mut self.state.borrow_mut().queue);
        let before = self.delivered();
        self.deliver(queue);
        self.delivered() - before
    }

    /// Deliver queued events newest first. Returns how many ran.
    pub fn flush_reversed(&self) -> usize {
        let mut queue = std::mem::take(&mut self.state.borrow_mut().queue);
        queue.reverse();
        let before = self.delivered();
        self.deliver(queue);
        self.delivered() - before
    }

    /// Queued deliveries whose listener is still registered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state
            .borrow()
            .queue
            .iter()
            .filter(|q| q.callback.strong_count() > 0)
            .count()
    }

    /// Registered listeners across all observations.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state
            .borrow()
            .observations
            .values()
            .map(|o| o.listeners.len())
            .sum()
    }

    /// Registered listeners on `element`.
    #[must_use]
    pub fn listeners_on(&self, element: FakeElement) -> usize {
        self.state
            .borrow()
            .observations
            .values()
            .filter(|o| o.element == element)
            .map(|o| o.listeners.len())
            .sum()
    }

    /// Number of `observe` calls so far.
    #[must_use]
    pub fn observe_calls(&self) -> usize {
        self.state.borrow().observe_calls
    }

    /// Number of listener invocations so far.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.state.borrow().delivered
    }
}

impl fmt::Debug for FakeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FakeEngine")
            .field("elements", &state.sizes.len())
            .field("observations", &state.observations.len())
            .field("queued", &state.queue.len())
            .field("delivery", &state.delivery)
            .finish()
    }
}

/// Handle for one observation.
pub struct FakeHandle {
    state: Weak<RefCell<EngineState>>,
    observation: u64,
}

impl MatchHandle for FakeHandle {
    fn matches(&self) -> bool {
        self.state.upgrade().is_some_and(|state| {
            state
                .borrow()
                .observations
                .get(&self.observation)
                .is_some_and(|o| o.current)
        })
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let Some(state) = self.state.upgrade() else {
            return Subscription::empty();
        };
        let id = {
            let mut state = state.borrow_mut();
            let id = state.next_id();
            let Some(obs) = state.observations.get_mut(&self.observation) else {
                return Subscription::empty();
            };
            obs.listeners.push(ListenerEntry {
                id,
                callback: Rc::downgrade(&listener),
            });
            id
        };
        let weak = self.state.clone();
        let observation = self.observation;
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                if let Some(obs) = state.borrow_mut().observations.get_mut(&observation) {
                    obs.listeners.retain(|l| l.id != id);
                }
            }
            drop(listener);
        })
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.borrow_mut().observations.remove(&self.observation);
        }
    }
}

impl ContainerQueryEngine for FakeEngine {
    type Element = FakeElement;
    type Handle = FakeHandle;

    fn observe(&self, element: &FakeElement, query: &str) -> Option<FakeHandle> {
        let mut state = self.state.borrow_mut();
        state.observe_calls += 1;
        let size = state.sizes.get(element).copied()?;
        let parsed = match ContainerQuery::parse(query) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(query, %err, "fake engine cannot observe query");
                return None;
            }
        };
        let id = state.next_id();
        let current = parsed.evaluate(size);
        state.observations.insert(
            id,
            Observation {
                element: *element,
                text: query.to_string(),
                query: parsed,
                current,
                listeners: Vec::new(),
            },
        );
        Some(FakeHandle {
            state: Rc::downgrade(&self.state),
            observation: id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<usize>>, ChangeListener) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, Rc::new(move |_: bool| h.set(h.get() + 1)))
    }

    #[test]
    fn observe_evaluates_current_size() {
        let engine = FakeEngine::new();
        let el = engine.create_element(Size::new(300.0, 100.0));
        let small = engine.observe(&el, "(min-width: 200px)").unwrap();
        let large = engine.observe(&el, "(min-width: 400px)").unwrap();
        assert!(small.matches());
        assert!(!large.matches());
    }

    #[test]
    fn unknown_element_or_bad_query_is_unobservable() {
        let engine = FakeEngine::new();
        let el = engine.create_element(Size::default());
        assert!(engine.observe(&FakeElement(999), "(min-width: 1px)").is_none());
        assert!(engine.observe(&el, "(aspect-ratio: 1)").is_none());
        assert_eq!(engine.observe_calls(), 2);
    }

    #[test]
    fn resize_notifies_only_flips() {
        let engine = FakeEngine::new();
        let el = engine.create_element(Size::new(100.0, 100.0));
        let handle = engine.observe(&el, "(min-width: 200px)").unwrap();
        let (hits, listener) = counter();
        let _sub = handle.subscribe(listener);

        engine.resize(el, Size::new(150.0, 100.0));
        assert_eq!(hits.get(), 0);
        engine.resize(el, Size::new(250.0, 100.0));
        assert_eq!(hits.get(), 1);
        assert!(handle.matches());
    }

    #[test]
    fn released_listener_skips_queued_delivery() {
        let engine = FakeEngine::with_delivery(Delivery::Deferred);
        let el = engine.create_element(Size::new(100.0, 100.0));
        let handle = engine.observe(&el, "(min-width: 200px)").unwrap();
        let (hits, listener) = counter();
        let sub = handle.subscribe(listener);

        engine.resize(el, Size::new(300.0, 100.0));
        assert_eq!(engine.pending(), 1);
        drop(sub);
        assert_eq!(engine.pending(), 0);
        assert_eq!(engine.flush(), 0);
        assert_eq!(hits.get(), 0);
        assert_eq!(engine.listener_count(), 0);
    }

    #[test]
    fn force_bypasses_evaluation() {
        let engine = FakeEngine::new();
        let el = engine.create_element(Size::new(100.0, 100.0));
        let handle = engine.observe(&el, "(min-width: 200px)").unwrap();
        let (hits, listener) = counter();
        let _sub = handle.subscribe(listener);

        engine.force(el, "(min-width: 200px)", true);
        assert!(handle.matches());
        assert_eq!(hits.get(), 1);
        engine.force(el, "(min-width: 999px)", true);
        assert_eq!(hits.get(), 1, "other query text is untouched");
    }

    #[test]
    fn dropping_handle_forgets_observation() {
        let engine = FakeEngine::new();
        let el = engine.create_element(Size::default());
        let handle = engine.observe(&el, "(min-width: 1px)").unwrap();
        drop(handle);
        assert!(format!("{engine:?}").contains("observations: 0"));
    }
}
