#![forbid(unsafe_code)]

//! Query binding controller.
//!
//! [`QueryBindingController`] keeps one [`MatchVector`] in sync with one
//! element and one [`QueryList`]. It owns at most one binding session at a
//! time: attach builds a session (one slot per query), detach releases it.
//!
//! # Lifecycle
//!
//! ```text
//!            attach(el, queries)                 detach()
//!   Idle ───────────────────────────▶ Attached ──────────▶ Idle
//!                                       │  ▲
//!        set_queries(new) / new element │  │ detach() then attach()
//!                                       └──┘
//! ```
//!
//! # Invariants
//!
//! 1. After `attach` of N queries the vector has length N before any change
//!    event is applied.
//! 2. A change event writes exactly one entry: the index captured when its
//!    listener was registered.
//! 3. Every session has a generation; listeners of a released session are
//!    rejected even if the engine still calls them.
//! 4. A previous session is fully released before the next one subscribes.
//! 5. No internal borrow is held while engine listeners or consumers run, so
//!    `detach`/`attach` may be called from inside either.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Engine not installed | Entries default to `false`, slots are placeholders |
//! | Engine cannot observe a query | That entry is `false`, slot is a placeholder |
//! | Late change event | Discarded, logged at trace level |
//! | `detach` with no session | No-op |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use mcq_core::{MatchChange, MatchVector, QueryIndex, QueryList};

use crate::attachment::ElementSlot;
use crate::config::{BindingConfig, DetachPolicy, EmitPolicy};
use crate::engine::{ChangeListener, ContainerQueryEngine, EngineCapability, MatchHandle};
use crate::reactive::{BatchScope, Binding, Observable, Subscription, bind_entry, bind_observable};
use crate::session::{BindingSession, SessionSlot};

struct ControllerInner<G: ContainerQueryEngine> {
    capability: EngineCapability<G>,
    config: BindingConfig,
    matches: Observable<MatchVector>,
    queries: RefCell<QueryList>,
    session: RefCell<Option<BindingSession<G::Element, G::Handle>>>,
    active: Cell<Option<u64>>,
    last_generation: Cell<u64>,
    ready: RefCell<Option<Subscription>>,
}

impl<G: ContainerQueryEngine> ControllerInner<G> {
    fn deliver(&self, generation: u64, change: MatchChange) -> bool {
        if self.active.get() != Some(generation) {
            tracing::trace!(
                generation,
                index = %change.index,
                matches = change.matches,
                "discarding late match change"
            );
            return false;
        }
        let changed = self.matches.update(|v| {
            change.apply(v);
        });
        tracing::trace!(
            generation,
            index = %change.index,
            matches = change.matches,
            changed,
            "match change applied"
        );
        changed
    }
}

/// Binds an element's container-query match state to a [`MatchVector`].
///
/// Clones share the same controller.
pub struct QueryBindingController<G: ContainerQueryEngine> {
    inner: Rc<ControllerInner<G>>,
}

impl<G: ContainerQueryEngine> Clone for QueryBindingController<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<G: ContainerQueryEngine> QueryBindingController<G> {
    /// Create an idle controller with the default policy.
    pub fn new(capability: EngineCapability<G>, queries: impl Into<QueryList>) -> Self {
        Self::with_config(capability, queries, BindingConfig::default())
    }

    /// Create an idle controller with an explicit policy.
    pub fn with_config(
        capability: EngineCapability<G>,
        queries: impl Into<QueryList>,
        config: BindingConfig,
    ) -> Self {
        let inner = Rc::new(ControllerInner {
            capability,
            config,
            matches: Observable::new(MatchVector::new()),
            queries: RefCell::new(queries.into()),
            session: RefCell::new(None),
            active: Cell::new(None),
            last_generation: Cell::new(0),
            ready: RefCell::new(None),
        });
        if config.rebind_on_ready && !inner.capability.is_ready() {
            let weak = Rc::downgrade(&inner);
            let sub = inner.capability.on_ready(move || {
                if let Some(inner) = weak.upgrade() {
                    QueryBindingController { inner }.rebind_placeholders();
                }
            });
            *inner.ready.borrow_mut() = Some(sub);
        }
        Self { inner }
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Bind `element` to `queries`, replacing any active session.
    ///
    /// The returned [`SessionTeardown`] detaches this session only; it is
    /// inert once a later session has replaced it.
    pub fn attach(&self, element: G::Element, queries: impl Into<QueryList>) -> SessionTeardown<G> {
        let queries = queries.into();
        self.detach();
        *self.inner.queries.borrow_mut() = queries.clone();

        let generation = self.inner.last_generation.get() + 1;
        self.inner.last_generation.set(generation);
        self.inner.active.set(Some(generation));

        let engine = self.inner.capability.engine();
        let batch = (self.inner.config.emit == EmitPolicy::Batched).then(BatchScope::new);

        self.inner.matches.update(|v| v.reset(queries.len()));
        let mut slots = Vec::with_capacity(queries.len());
        for (index, query) in queries.iter() {
            if self.inner.active.get() != Some(generation) {
                break;
            }
            let Some(handle) = engine.as_ref().and_then(|g| g.observe(&element, query)) else {
                slots.push(SessionSlot::placeholder(index));
                continue;
            };
            let initial = handle.matches();
            self.inner.matches.update(|v| {
                v.set(index, initial);
            });
            let subscription = handle.subscribe(self.listener(generation, index));
            slots.push(SessionSlot {
                index,
                handle: Some(handle),
                subscription: Some(subscription),
            });
        }

        if self.inner.active.get() != Some(generation) {
            // A consumer detached or re-attached while this session was being built.
            let released = BindingSession {
                generation,
                element,
                queries,
                slots,
            }
            .release();
            tracing::debug!(generation, released, "binding session superseded during attach");
            drop(batch);
            return SessionTeardown::inert();
        }

        let current = self.inner.queries.borrow().clone();
        if current != queries {
            // A consumer replaced the query list while this session was being built.
            let released = BindingSession {
                generation,
                element: element.clone(),
                queries,
                slots,
            }
            .release();
            tracing::debug!(
                generation,
                released,
                queries = current.len(),
                "query list changed during attach, rebinding"
            );
            let teardown = self.attach(element, current);
            drop(batch);
            return teardown;
        }

        let session = BindingSession {
            generation,
            element,
            queries,
            slots,
        };
        tracing::debug!(
            generation,
            element = ?session.element,
            queries = session.queries.len(),
            subscriptions = session.subscription_count(),
            placeholders = ?session.placeholder_indices(),
            engine_ready = engine.is_some(),
            "binding session attached"
        );
        *self.inner.session.borrow_mut() = Some(session);
        drop(batch);

        SessionTeardown {
            inner: Rc::downgrade(&self.inner),
            generation,
        }
    }

    /// Release the active session. Returns `false` if none was active.
    ///
    /// Safe to call repeatedly and from inside change or consumer callbacks.
    pub fn detach(&self) -> bool {
        let Some(generation) = self.inner.active.take() else {
            return false;
        };
        let session = self.inner.session.borrow_mut().take();
        let released = session.map_or(0, BindingSession::release);
        if self.inner.config.detach == DetachPolicy::ResetToFalse {
            self.inner.matches.update(MatchVector::clear_all);
        }
        tracing::debug!(generation, released, "binding session detached");
        true
    }

    /// Replace the query list. Rebinds if attached and the list differs by value.
    ///
    /// Returns `true` if the list changed.
    pub fn set_queries(&self, queries: impl Into<QueryList>) -> bool {
        let queries = queries.into();
        if *self.inner.queries.borrow() == queries {
            return false;
        }
        *self.inner.queries.borrow_mut() = queries.clone();
        if let Some(element) = self.attached_element() {
            tracing::debug!(queries = queries.len(), "query list changed, rebinding");
            self.attach(element, queries);
        }
        true
    }

    /// React to an attachment-source notification.
    ///
    /// `None` detaches; a different element rebinds with the current queries;
    /// the already attached element is a no-op.
    pub fn on_element(&self, element: Option<&G::Element>) {
        match element {
            None => {
                self.detach();
            }
            Some(element) => {
                if self.attached_element().as_ref() == Some(element) {
                    return;
                }
                let queries = self.queries();
                self.attach(element.clone(), queries);
            }
        }
    }

    /// Follow `slot`: bind now if it holds an element, then track its changes.
    ///
    /// Dropping the returned subscription stops tracking but leaves the
    /// current session in place.
    pub fn connect(&self, slot: &ElementSlot<G::Element>) -> Subscription {
        self.on_element(slot.current().as_ref());
        let weak: Weak<ControllerInner<G>> = Rc::downgrade(&self.inner);
        slot.subscribe(move |element| {
            if let Some(inner) = weak.upgrade() {
                QueryBindingController { inner }.on_element(element);
            }
        })
    }

    /// Apply a change addressed to session `generation`.
    ///
    /// This is the path every engine listener takes. Returns `true` if the
    /// vector changed; late events return `false`.
    pub fn handle_change(&self, generation: u64, change: MatchChange) -> bool {
        self.inner.deliver(generation, change)
    }

    fn listener(&self, generation: u64, index: QueryIndex) -> ChangeListener {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move |matches| {
            if let Some(inner) = weak.upgrade() {
                inner.deliver(generation, MatchChange::new(index, matches));
            }
        })
    }

    fn rebind_placeholders(&self) {
        let target = self
            .inner
            .session
            .borrow()
            .as_ref()
            .filter(|s| s.placeholder_count() > 0)
            .map(|s| (s.element.clone(), s.queries.clone()));
        if let Some((element, queries)) = target {
            tracing::debug!("engine became ready, rebinding placeholder session");
            self.attach(element, queries);
        }
    }

    fn attached_element(&self) -> Option<G::Element> {
        self.inner
            .session
            .borrow()
            .as_ref()
            .map(|s| s.element.clone())
    }

    // -----------------------------------------------------------------------
    // Consumer surface
    // -----------------------------------------------------------------------

    /// Snapshot of the match vector.
    #[must_use]
    pub fn matches(&self) -> MatchVector {
        self.inner.matches.get()
    }

    /// Match state at `index`; `false` when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        self.inner
            .matches
            .with(|v| v.get(QueryIndex::new(index)).unwrap_or(false))
    }

    /// Length of the match vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.matches.with(MatchVector::len)
    }

    /// Whether the match vector is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.matches.with(MatchVector::is_empty)
    }

    /// Number of snapshots emitted so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.matches.version()
    }

    /// Receive every new snapshot.
    pub fn subscribe(&self, callback: impl Fn(&MatchVector) + 'static) -> Subscription {
        self.inner.matches.subscribe(callback)
    }

    /// Live read binding for the whole vector.
    #[must_use]
    pub fn binding(&self) -> Binding<MatchVector> {
        bind_observable(&self.inner.matches)
    }

    /// Live read binding for one entry (`false` when out of range).
    #[must_use]
    pub fn binding_at(&self, index: usize) -> Binding<bool> {
        bind_entry(&self.inner.matches, QueryIndex::new(index))
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Current query list.
    #[must_use]
    pub fn queries(&self) -> QueryList {
        self.inner.queries.borrow().clone()
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.active.get().is_some()
    }

    /// Generation of the active session.
    #[must_use]
    pub fn session_generation(&self) -> Option<u64> {
        self.inner.active.get()
    }

    /// Live engine subscriptions held by the active session.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner
            .session
            .borrow()
            .as_ref()
            .map_or(0, BindingSession::subscription_count)
    }

    /// Slots of the active session that have no engine handle.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.inner
            .session
            .borrow()
            .as_ref()
            .map_or(0, BindingSession::placeholder_count)
    }

    /// Active policy.
    #[must_use]
    pub fn config(&self) -> BindingConfig {
        self.inner.config
    }

    /// Engine capability this controller reads at attach time.
    #[must_use]
    pub fn capability(&self) -> &EngineCapability<G> {
        &self.inner.capability
    }
}

impl<G: ContainerQueryEngine> fmt::Debug for QueryBindingController<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBindingController")
            .field("queries", &*self.inner.queries.borrow())
            .field("matches", &self.inner.matches.get())
            .field("generation", &self.inner.active.get())
            .field("session", &*self.inner.session.borrow())
            .finish()
    }
}

/// Detaches one specific session.
pub struct SessionTeardown<G: ContainerQueryEngine> {
    inner: Weak<ControllerInner<G>>,
    generation: u64,
}

impl<G: ContainerQueryEngine> SessionTeardown<G> {
    fn inert() -> Self {
        Self {
            inner: Weak::new(),
            generation: 0,
        }
    }

    /// Generation of the session this teardown belongs to (`0` if inert).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the session is still the controller's active one.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.active.get() == Some(self.generation))
    }

    /// Detach the session if it is still active. Returns `true` if it was.
    pub fn teardown(self) -> bool {
        match self.inner.upgrade() {
            Some(inner) if inner.active.get() == Some(self.generation) => {
                QueryBindingController { inner }.detach()
            }
            _ => false,
        }
    }
}

impl<G: ContainerQueryEngine> fmt::Debug for SessionTeardown<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTeardown")
            .field("generation", &self.generation)
            .finish()
    }
}
