#![forbid(unsafe_code)]

//! Reactive primitives behind the match-vector bindings.
//!
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that releases a listener on drop. Engines
//!   return the same guard type from their own listener registration.
//! - [`Binding`]: a read view for UI consumers.
//! - [`BindingScope`]: owns a component's subscriptions.
//! - [`BatchScope`]: defers notifications so a multi-entry update is seen
//!   as one change.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Subscribers are stored as `Weak` callbacks; the strong side
//! lives inside the [`Subscription`], so releasing the guard is enough to
//! stop delivery. Dead entries are pruned lazily during notification.
//!
//! `BatchScope` uses a thread-local queue. Nested scopes are supported; only
//! the outermost scope triggers the flush.

pub mod batch;
pub mod binding;
pub mod observable;

pub use batch::BatchScope;
pub use binding::{Binding, BindingScope, bind_entry, bind_mapped, bind_observable};
pub use observable::{Observable, Subscription};
