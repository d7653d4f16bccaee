//! # Instance Registry
//!
//! Restricts a type to a single shared instance within one process.
//!
//! Construction requests for an enrolled type are intercepted: the first one
//! runs the constructor and records the instance, every later one returns that
//! same instance and ignores its arguments. A constructor that fails records
//! nothing, so the next request tries again.
//!
//! ## Quick Start
//!
//! ```rust
//! use instance_registry::get_or_create;
//! use std::sync::Arc;
//!
//! struct Counter {
//!     value: Option<i32>,
//! }
//!
//! let first = get_or_create(|| Counter { value: None }).unwrap();
//! let second = get_or_create(|| Counter { value: Some(10) }).unwrap();
//!
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(second.value, None);
//! ```
//!
//! ## Interception Strategies
//!
//! All three satisfy the same contract; pick whichever reads best at the call site.
//!
//! - **Call interception**: implement [`Enrolled`] and obtain instances with
//!   `T::instance(args)`, which routes through the global registry.
//! - **Factory wrapping**: put the raw constructor in a [`SingletonFactory`]
//!   and call the factory instead.
//! - **Allocation interception**: keep an [`InstanceSlot`] in a `static`
//!   (or use [`singleton!`]); the slot is checked before the initializer runs.
//!
//! ## Main Functions
//!
//! - [`get_or_create`] - Return the instance, constructing it on first request
//! - [`get_or_create_with`] - Same, with explicit construction arguments
//! - [`get_or_try_create`] - Same, with a fallible constructor
//! - [`get`] - Retrieve an already constructed instance
//! - [`contains`] - Check if a type has been constructed
//! - [`set_trace_callback`] - Observe registry operations
//! - [`define_registry!`] - Declare an isolated registry
//!
//! ## Concurrency
//!
//! Every registry and slot is safe to share between threads. Each type gets its own
//! `OnceCell` inside a registry, so racing callers never construct twice, and a
//! constructor may request instances of other types from the same registry.

mod enrolled;
mod factory;
mod macros;
mod registry;
mod registry_error;
mod registry_event;
mod registry_trait;
mod slot;

pub use enrolled::{ConstructToken, Enrolled};
pub use factory::SingletonFactory;
pub use registry::{
    clear_trace_callback, contains, get, get_or_create, get_or_create_with, get_or_try_create,
    set_trace_callback, GlobalRegistry,
};
pub use registry_error::{BoxError, RegistryError};
pub use registry_event::RegistryEvent;
pub use registry_trait::{InstanceCell, RegistryApi, Storage, TraceCallback};
pub use slot::InstanceSlot;
