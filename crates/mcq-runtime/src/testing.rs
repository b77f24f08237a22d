//! Minimal in-crate engine for unit tests.
//!
//! Elements are plain `u32` ids and match state is keyed by query text only.
//! The full engine with size-based evaluation lives in `mcq-harness`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::engine::{ChangeListener, ContainerQueryEngine, MatchHandle};
use crate::reactive::Subscription;

struct Listener {
    id: u64,
    element: u32,
    query: String,
    callback: Weak<dyn Fn(bool)>,
}

#[derive(Default)]
struct StubState {
    state: HashMap<String, bool>,
    listeners: Vec<Listener>,
    next_id: u64,
    observe_calls: usize,
}

#[derive(Clone, Default)]
pub(crate) struct StubEngine {
    shared: Rc<RefCell<StubState>>,
}

impl StubEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_initial(&self, query: &str, matches: bool) {
        self.shared
            .borrow_mut()
            .state
            .insert(query.to_string(), matches);
    }

    /// Flip `query` on `element` and deliver to live listeners.
    pub(crate) fn emit(&self, element: u32, query: &str, matches: bool) {
        let targets: Vec<_> = {
            let mut shared = self.shared.borrow_mut();
            shared.state.insert(query.to_string(), matches);
            shared
                .listeners
                .iter()
                .filter(|l| l.element == element && l.query == query)
                .map(|l| l.callback.clone())
                .collect()
        };
        for weak in targets {
            if let Some(callback) = weak.upgrade() {
                callback(matches);
            }
        }
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.shared.borrow().listeners.len()
    }

    pub(crate) fn observe_calls(&self) -> usize {
        self.shared.borrow().observe_calls
    }
}

pub(crate) struct StubHandle {
    shared: Rc<RefCell<StubState>>,
    element: u32,
    query: String,
}

impl MatchHandle for StubHandle {
    fn matches(&self) -> bool {
        self.shared
            .borrow()
            .state
            .get(&self.query)
            .copied()
            .unwrap_or(false)
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let id = {
            let mut shared = self.shared.borrow_mut();
            shared.next_id += 1;
            let id = shared.next_id;
            shared.listeners.push(Listener {
                id,
                element: self.element,
                query: self.query.clone(),
                callback: Rc::downgrade(&listener),
            });
            id
        };
        let shared = Rc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.borrow_mut().listeners.retain(|l| l.id != id);
            }
            drop(listener);
        })
    }
}

impl ContainerQueryEngine for StubEngine {
    type Element = u32;
    type Handle = StubHandle;

    fn observe(&self, element: &u32, query: &str) -> Option<StubHandle> {
        self.shared.borrow_mut().observe_calls += 1;
        Some(StubHandle {
            shared: Rc::clone(&self.shared),
            element: *element,
            query: query.to_string(),
        })
    }
}
