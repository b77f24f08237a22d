#![forbid(unsafe_code)]

//! Deferred notification scopes.
//!
//! While a [`BatchScope`] is alive, [`Observable`](super::Observable) writes
//! land immediately but their notifications are queued. When the outermost
//! scope drops, each observable that changed is notified once, with its
//! final value, in the order it first changed.
//!
//! A controller opens a scope around session setup so consumers see one
//! complete match vector instead of N partial ones.

use std::cell::RefCell;
use std::marker::PhantomData;

type Deferred = Box<dyn FnOnce()>;

#[derive(Default)]
struct BatchState {
    depth: usize,
    pending: Vec<(usize, Deferred)>,
}

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

/// RAII guard that defers observable notifications until it drops.
///
/// Scopes nest; only the outermost one flushes.
#[must_use = "notifications flush when the scope is dropped"]
pub struct BatchScope {
    _not_send: PhantomData<*const ()>,
}

impl BatchScope {
    /// Open a scope on the current thread.
    pub fn new() -> Self {
        BATCH.with(|b| b.borrow_mut().depth += 1);
        Self {
            _not_send: PhantomData,
        }
    }

    /// Whether a scope is open on this thread.
    #[must_use]
    pub fn is_active() -> bool {
        BATCH.with(|b| b.borrow().depth > 0)
    }

    /// Number of notifications waiting for the outermost scope.
    #[must_use]
    pub fn pending() -> usize {
        BATCH.with(|b| b.borrow().pending.len())
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let flush = BATCH.with(|b| {
            let mut state = b.borrow_mut();
            state.depth = state.depth.saturating_sub(1);
            if state.depth == 0 {
                std::mem::take(&mut state.pending)
            } else {
                Vec::new()
            }
        });
        for (_, notify) in flush {
            notify();
        }
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("pending", &Self::pending())
            .finish()
    }
}

/// Queue `notify` under `key` if a scope is open, otherwise run it now.
///
/// A key already queued is not queued twice; the queued closure reads the
/// observable's value at flush time.
pub(crate) fn defer_or_run(key: usize, notify: Deferred) {
    let run_now = BATCH.with(|b| {
        let mut state = b.borrow_mut();
        if state.depth == 0 {
            return Some(notify);
        }
        if !state.pending.iter().any(|(k, _)| *k == key) {
            state.pending.push((key, notify));
        }
        None
    });
    if let Some(notify) = run_now {
        notify();
    }
}

#[cfg(test)]
mod tests {
    use super::super::Observable;
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn notifications_deferred_until_scope_exit() {
        let obs = Observable::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = obs.subscribe(move |v| s.borrow_mut().push(*v));

        {
            let _batch = BatchScope::new();
            obs.set(1);
            obs.set(2);
            obs.set(3);
            assert_eq!(obs.get(), 3, "values update immediately");
            assert!(seen.borrow().is_empty());
        }
        assert_eq!(*seen.borrow(), vec![3], "one notification with the final value");
    }

    #[test]
    fn nested_scopes_flush_at_outermost() {
        let obs = Observable::new(0);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| h.set(h.get() + 1));

        let outer = BatchScope::new();
        {
            let _inner = BatchScope::new();
            obs.set(5);
        }
        assert_eq!(hits.get(), 0);
        assert!(BatchScope::is_active());
        drop(outer);
        assert_eq!(hits.get(), 1);
        assert!(!BatchScope::is_active());
    }

    #[test]
    fn distinct_observables_flush_in_change_order() {
        let a = Observable::new(0);
        let b = Observable::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        let oa = Rc::clone(&order);
        let ob = Rc::clone(&order);
        let _sa = a.subscribe(move |_| oa.borrow_mut().push('a'));
        let _sb = b.subscribe(move |_| ob.borrow_mut().push('b'));

        {
            let _batch = BatchScope::new();
            b.set(1);
            a.set(1);
            b.set(2);
            assert_eq!(BatchScope::pending(), 2);
        }
        assert_eq!(*order.borrow(), vec!['b', 'a']);
    }

    #[test]
    fn no_scope_runs_immediately() {
        let obs = Observable::new(0);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| h.set(h.get() + 1));
        obs.set(1);
        assert_eq!(hits.get(), 1);
    }
}
