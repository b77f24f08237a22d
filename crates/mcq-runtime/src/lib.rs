#![forbid(unsafe_code)]

//! Subscription lifecycle for container-query match bindings.
//!
//! The pieces, bottom up:
//!
//! - [`reactive`]: observables, subscriptions, bindings and batch scopes.
//! - [`engine`]: the [`ContainerQueryEngine`] / [`MatchHandle`] seam and the
//!   explicitly initialized [`EngineCapability`].
//! - [`attachment`]: the [`ElementSlot`] a UI layer mounts elements into.
//! - [`controller`]: [`QueryBindingController`], which owns one binding
//!   session at a time and the consumer-visible match vector.
//! - [`container`]: [`MatchContainer`], a slot and controller wired together
//!   for a single component.
//! - [`config`]: detach and emit policy, optionally loaded from TOML/JSON.
//!
//! Everything is single-threaded (`Rc`/`RefCell`); controllers and their
//! handles are `!Send`.

pub mod attachment;
pub mod config;
pub mod container;
pub mod controller;
pub mod engine;
pub mod reactive;
mod session;
#[cfg(test)]
mod testing;

pub use attachment::ElementSlot;
#[cfg(feature = "policy-config")]
pub use config::ConfigError;
pub use config::{BindingConfig, DetachPolicy, EmitPolicy};
pub use container::MatchContainer;
pub use controller::{QueryBindingController, SessionTeardown};
pub use engine::{ChangeListener, ContainerQueryEngine, EngineCapability, MatchHandle};
pub use mcq_core::{MatchChange, MatchVector, QueryIndex, QueryList};
pub use reactive::{BatchScope, Binding, BindingScope, Observable, Subscription};
