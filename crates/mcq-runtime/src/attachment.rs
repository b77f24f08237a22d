#![forbid(unsafe_code)]

//! Element attachment source.
//!
//! An [`ElementSlot`] is the reference a UI layer fills in when the target
//! element mounts and clears when it unmounts. Controllers connect to a slot
//! and rebind whenever the element it holds changes.
//!
//! Re-mounting the element the slot already holds is a no-op; listeners only
//! hear real transitions, including the transition to "no element".

use std::fmt;

use crate::reactive::{Observable, Subscription};

/// Shared, observable holder for the currently mounted element.
pub struct ElementSlot<E> {
    current: Observable<Option<E>>,
}

impl<E> Clone for ElementSlot<E> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
        }
    }
}

impl<E: Clone + PartialEq + 'static> ElementSlot<E> {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Observable::new(None),
        }
    }

    /// Mount `element`. Returns `true` if the slot changed.
    pub fn mount(&self, element: E) -> bool {
        self.current.set(Some(element))
    }

    /// Clear the slot. Returns `true` if an element was mounted.
    pub fn unmount(&self) -> bool {
        self.current.set(None)
    }

    /// Set or clear the slot in one call, as a callback ref would.
    pub fn set(&self, element: Option<E>) -> bool {
        self.current.set(element)
    }

    /// The mounted element, if any.
    #[must_use]
    pub fn current(&self) -> Option<E> {
        self.current.get()
    }

    /// Whether an element is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.current.with(Option::is_some)
    }

    /// Listen for mount/unmount transitions.
    pub fn subscribe(&self, callback: impl Fn(Option<&E>) + 'static) -> Subscription {
        self.current.subscribe(move |element| callback(element.as_ref()))
    }
}

impl<E: Clone + PartialEq + 'static> Default for ElementSlot<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for ElementSlot<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementSlot").field(&self.current).finish()
    }
}
