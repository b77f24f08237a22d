#![forbid(unsafe_code)]

//! One element bound to one query list.
//!
//! A session owns one slot per query. A slot whose engine was unavailable at
//! attach time holds no handle and no subscription but still occupies its
//! position, so indices never shift.

use mcq_core::{QueryIndex, QueryList};

use crate::reactive::Subscription;

pub(crate) struct SessionSlot<H> {
    pub(crate) index: QueryIndex,
    pub(crate) handle: Option<H>,
    pub(crate) subscription: Option<Subscription>,
}

impl<H> SessionSlot<H> {
    pub(crate) fn placeholder(index: QueryIndex) -> Self {
        Self {
            index,
            handle: None,
            subscription: None,
        }
    }

    pub(crate) fn is_placeholder(&self) -> bool {
        self.handle.is_none()
    }
}

pub(crate) struct BindingSession<E, H> {
    pub(crate) generation: u64,
    pub(crate) element: E,
    pub(crate) queries: QueryList,
    pub(crate) slots: Vec<SessionSlot<H>>,
}

impl<E, H> BindingSession<E, H> {
    pub(crate) fn subscription_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.subscription.is_some())
            .count()
    }

    pub(crate) fn placeholder_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_placeholder()).count()
    }

    pub(crate) fn placeholder_indices(&self) -> Vec<QueryIndex> {
        self.slots
            .iter()
            .filter(|s| s.is_placeholder())
            .map(|s| s.index)
            .collect()
    }

    /// Unsubscribe every slot, last first, then drop the handles.
    ///
    /// Returns the number of listeners released.
    pub(crate) fn release(mut self) -> usize {
        let mut released = 0;
        for slot in self.slots.iter_mut().rev() {
            if let Some(sub) = slot.subscription.take() {
                sub.unsubscribe();
                released += 1;
            }
        }
        self.slots.clear();
        released
    }
}

impl<E: std::fmt::Debug, H> std::fmt::Debug for BindingSession<E, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingSession")
            .field("generation", &self.generation)
            .field("element", &self.element)
            .field("queries", &self.queries)
            .field("subscriptions", &self.subscription_count())
            .field("placeholders", &self.placeholder_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn slot(i: usize, log: &Rc<RefCell<Vec<usize>>>) -> SessionSlot<()> {
        let l = Rc::clone(log);
        SessionSlot {
            index: QueryIndex::new(i),
            handle: Some(()),
            subscription: Some(Subscription::new(move || l.borrow_mut().push(i))),
        }
    }

    #[test]
    fn release_unsubscribes_in_reverse() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let session = BindingSession {
            generation: 1,
            element: "el",
            queries: QueryList::from(["a", "b", "c"]),
            slots: vec![
                slot(0, &log),
                SessionSlot::placeholder(QueryIndex::new(1)),
                slot(2, &log),
            ],
        };
        assert_eq!(session.subscription_count(), 2);
        assert_eq!(session.placeholder_count(), 1);
        assert_eq!(session.release(), 2);
        assert_eq!(*log.borrow(), vec![2, 0]);
    }

    #[test]
    fn debug_summarizes() {
        let session: BindingSession<&str, ()> = BindingSession {
            generation: 3,
            element: "el",
            queries: QueryList::from(["a"]),
            slots: vec![SessionSlot::placeholder(QueryIndex::new(0))],
        };
        let debug = format!("{session:?}");
        assert!(debug.contains("generation: 3"));
        assert!(debug.contains("placeholders: 1"));
    }
}
