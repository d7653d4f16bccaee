//! The default process-wide instance registry.
//!
//! Storage is created empty on first access and lives for the rest of the process.
//! Nothing is ever removed from it.
//!
//! # Examples
//!
//! ```
//! use instance_registry::get_or_create;
//! use std::sync::Arc;
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let first = get_or_create(|| Greeter { greeting: "hello".into() }).unwrap();
//! let second = get_or_create(|| Greeter { greeting: "ignored".into() }).unwrap();
//!
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(second.greeting, "hello");
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, Mutex},
};

use crate::{BoxError, RegistryApi, RegistryError, RegistryEvent, Storage, TraceCallback};

/// Global registry storing one instance per type.
static GLOBAL_STORAGE: Storage = LazyLock::new(|| Mutex::new(HashMap::new()));

/// Holds an optional user-defined tracing callback for the global registry.
static GLOBAL_TRACE: TraceCallback = LazyLock::new(|| Mutex::new(None));

/// Handle to the default process-wide registry.
///
/// The free functions in this module delegate to it; use it directly when
/// code is generic over [`RegistryApi`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalRegistry;

impl RegistryApi for GlobalRegistry {
    fn storage() -> &'static Storage {
        &GLOBAL_STORAGE
    }

    fn trace() -> &'static TraceCallback {
        &GLOBAL_TRACE
    }
}

/// Returns the instance of `T` from the global registry, constructing it on first request.
///
/// Later calls drop `constructor` unused.
///
/// # Examples
///
/// ```
/// use instance_registry::get_or_create;
///
/// struct Config {
///     retries: u32,
/// }
///
/// let config = get_or_create(|| Config { retries: 3 }).unwrap();
/// assert_eq!(config.retries, 3);
/// ```
pub fn get_or_create<T, F>(constructor: F) -> Result<Arc<T>, RegistryError>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> T,
{
    GlobalRegistry.get_or_create(constructor)
}

/// Returns the instance of `T`, calling `constructor(args)` only if `T` is unconstructed.
///
/// # Examples
///
/// ```
/// use instance_registry::get_or_create_with;
///
/// struct Pool {
///     size: usize,
/// }
///
/// let pool = get_or_create_with(4, |size| Pool { size }).unwrap();
/// let same = get_or_create_with(16, |size| Pool { size }).unwrap();
///
/// assert_eq!(same.size, 4);
/// # let _ = pool;
/// ```
pub fn get_or_create_with<T, A, F>(args: A, constructor: F) -> Result<Arc<T>, RegistryError>
where
    T: Send + Sync + 'static,
    F: FnOnce(A) -> T,
{
    GlobalRegistry.get_or_create_with(args, constructor)
}

/// Returns the instance of `T`, trying to construct it on first request.
///
/// A failed construction stores nothing; the next call tries again.
///
/// # Examples
///
/// ```
/// use instance_registry::get_or_try_create;
///
/// #[derive(Debug)]
/// struct Endpoint {
///     port: u16,
/// }
///
/// let err = get_or_try_create(|| "nope".parse::<u16>().map(|port| Endpoint { port }))
///     .unwrap_err();
/// assert!(err.is_construction());
///
/// let endpoint = get_or_try_create(|| "8080".parse::<u16>().map(|port| Endpoint { port }))
///     .unwrap();
/// assert_eq!(endpoint.port, 8080);
/// ```
pub fn get_or_try_create<T, E, F>(constructor: F) -> Result<Arc<T>, RegistryError>
where
    T: Send + Sync + 'static,
    E: Into<BoxError>,
    F: FnOnce() -> Result<T, E>,
{
    GlobalRegistry.get_or_try_create(constructor)
}

/// Retrieves an already constructed instance of `T` from the global registry.
///
/// # Errors
///
/// [`RegistryError::TypeNotFound`] if `T` has not been constructed.
pub fn get<T: Send + Sync + 'static>() -> Result<Arc<T>, RegistryError> {
    GlobalRegistry.get()
}

/// Checks whether `T` has been constructed in the global registry.
pub fn contains<T: Send + Sync + 'static>() -> bool {
    GlobalRegistry.contains::<T>()
}

/// Sets a tracing callback that will be invoked on every global registry interaction.
///
/// # Example
/// ```rust
/// use instance_registry::{clear_trace_callback, set_trace_callback};
///
/// set_trace_callback(|event| println!("[registry-trace] {event}"));
/// clear_trace_callback();
/// ```
pub fn set_trace_callback(callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
    GlobalRegistry.set_trace_callback(callback)
}

/// Clears the tracing callback (disables global registry tracing).
pub fn clear_trace_callback() {
    GlobalRegistry.clear_trace_callback()
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
