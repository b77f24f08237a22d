#![forbid(unsafe_code)]

//! Read bindings and subscription scopes for UI consumers.
//!
//! A [`Binding<T>`] is what a widget holds to read match state during
//! render: it reads the live [`Observable`] on every `get()`, so it can never
//! return a vector older than the last delivered change.
//!
//! ```ignore
//! let matches = Observable::new(MatchVector::from([true, false]));
//! let wide = bind_entry(&matches, QueryIndex::new(1));
//! assert!(!wide.get());
//! ```
//!
//! A [`BindingScope`] collects the [`Subscription`]s a component owns and
//! releases them together.
//!
//! # Invariants
//!
//! 1. `Binding::get()` always reflects the source at call time.
//! 2. Projections run on every `get()`; nothing is cached.
//! 3. A scope releases its subscriptions newest first.
//! 4. After `clear()` or drop, no callback registered through the scope runs.

use std::fmt;
use std::rc::Rc;

use mcq_core::{MatchVector, QueryIndex};

use super::observable::{Observable, Subscription};

/// A read-only view of reactive state, possibly projected.
pub struct Binding<T> {
    read: Rc<dyn Fn() -> T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            read: Rc::clone(&self.read),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.get()).finish()
    }
}

impl<T: 'static> Binding<T> {
    /// A binding backed by an arbitrary reader.
    pub fn new(read: impl Fn() -> T + 'static) -> Self {
        Self {
            read: Rc::new(read),
        }
    }

    /// Read the current value.
    #[must_use]
    pub fn get(&self) -> T {
        (self.read)()
    }

    /// Project every read through `f`.
    #[must_use]
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Binding<U> {
        let read = self.read;
        Binding::new(move || f(read()))
    }
}

/// Bind to an observable's whole value.
pub fn bind_observable<T: Clone + PartialEq + 'static>(source: &Observable<T>) -> Binding<T> {
    let source = source.clone();
    Binding::new(move || source.get())
}

/// Bind to a projection of an observable's value, read by reference.
pub fn bind_mapped<S, T>(source: &Observable<S>, project: impl Fn(&S) -> T + 'static) -> Binding<T>
where
    S: Clone + PartialEq + 'static,
    T: 'static,
{
    let source = source.clone();
    Binding::new(move || source.with(&project))
}

/// Bind to one entry of a match vector; `false` while the index is out of range.
pub fn bind_entry(source: &Observable<MatchVector>, index: QueryIndex) -> Binding<bool> {
    bind_mapped(source, move |v| v.get(index).unwrap_or(false))
}

/// Owns the subscriptions of one logical component.
#[derive(Default)]
pub struct BindingScope {
    held: Vec<Subscription>,
}

impl BindingScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `subscription` alive until the scope is cleared or dropped.
    pub fn hold(&mut self, subscription: Subscription) -> &mut Self {
        self.held.push(subscription);
        self
    }

    /// Run `callback` on every change of `source` while the scope lives.
    pub fn watch<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        self.hold(source.subscribe(callback))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Release everything, newest first. Returns how many were held.
    ///
    /// The scope can be reused afterwards.
    pub fn clear(&mut self) -> usize {
        let count = self.held.len();
        while let Some(subscription) = self.held.pop() {
            subscription.unsubscribe();
        }
        count
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingScope({} held)", self.held.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn vector(bits: &[bool]) -> Observable<MatchVector> {
        Observable::new(MatchVector::from(bits.to_vec()))
    }

    #[test]
    fn whole_vector_binding_follows_updates() {
        let matches = vector(&[true, false]);
        let all = bind_observable(&matches);
        assert_eq!(all.get(), [true, false]);

        matches.update(|v| {
            v.set(QueryIndex::new(1), true);
        });
        assert_eq!(all.get(), [true, true]);
    }

    #[test]
    fn entry_binding_reads_one_index() {
        let matches = vector(&[false, false]);
        let second = bind_entry(&matches, QueryIndex::new(1));
        let missing = bind_entry(&matches, QueryIndex::new(5));
        assert!(!second.get());

        matches.set(MatchVector::from([false, true]));
        assert!(second.get());
        assert!(!missing.get());
    }

    #[test]
    fn entry_binding_survives_length_change() {
        let matches = vector(&[true]);
        let second = bind_entry(&matches, QueryIndex::new(1));
        assert!(!second.get());
        matches.set(MatchVector::from([false, true, false]));
        assert!(second.get());
    }

    #[test]
    fn map_projects_the_widest_match() {
        let matches = vector(&[true, true, false]);
        let label = bind_observable(&matches)
            .map(|v| v.last_match())
            .map(|m| m.map_or_else(|| "none".to_string(), |i| i.to_string()));
        assert_eq!(label.get(), "#1");

        matches.set(MatchVector::from([false, false, false]));
        assert_eq!(label.get(), "none");
    }

    #[test]
    fn reads_are_not_cached() {
        let reads = Rc::new(Cell::new(0));
        let r = Rc::clone(&reads);
        let counter = Binding::new(move || {
            r.set(r.get() + 1);
            r.get()
        });
        let shared = counter.clone();
        assert_eq!(counter.get(), 1);
        assert_eq!(shared.get(), 2);
    }

    #[test]
    fn binding_debug_shows_current_value() {
        let matches = vector(&[true]);
        assert_eq!(format!("{:?}", bind_observable(&matches)), "Binding([true])");
    }

    #[test]
    fn scope_stops_callbacks_when_dropped() {
        let matches = vector(&[false]);
        let hits = Rc::new(Cell::new(0));
        {
            let mut scope = BindingScope::new();
            let h = Rc::clone(&hits);
            scope.watch(&matches, move |_| h.set(h.get() + 1));
            matches.set(MatchVector::from([true]));
            assert_eq!(hits.get(), 1);
        }
        matches.set(MatchVector::from([false]));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn clear_releases_newest_first_and_counts() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut scope = BindingScope::new();
        for i in 0..3 {
            let o = Rc::clone(&order);
            scope.hold(Subscription::new(move || o.borrow_mut().push(i)));
        }
        assert_eq!(scope.clear(), 3);
        assert!(scope.is_empty());
        assert_eq!(*order.borrow(), vec![2, 1, 0]);
        assert_eq!(scope.clear(), 0);
    }

    #[test]
    fn cleared_scope_accepts_new_watches() {
        let matches = vector(&[false]);
        let mut scope = BindingScope::new();
        let stale = Rc::new(Cell::new(false));
        let s = Rc::clone(&stale);
        scope.watch(&matches, move |_| s.set(true));
        scope.clear();

        let fresh = Rc::new(Cell::new(false));
        let f = Rc::clone(&fresh);
        scope.watch(&matches, move |_| f.set(true));
        matches.set(MatchVector::from([true]));
        assert!(!stale.get());
        assert!(fresh.get());
    }

    #[test]
    fn watches_chain() {
        let matches = vector(&[]);
        let mut scope = BindingScope::new();
        scope.watch(&matches, |_| {}).watch(&matches, |_| {});
        assert_eq!(scope.len(), 2);
        assert_eq!(format!("{scope:?}"), "BindingScope(2 held)");
    }
}
