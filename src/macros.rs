//! Macros for declaring isolated registries and slot-backed accessors.

/// Declares an isolated instance registry as a module with a single macro invocation.
///
/// The macro generates a module containing:
/// - Storage static (hidden)
/// - Trace callback static (hidden)
/// - An `Api` struct that implements `RegistryApi`, exposed as the `API` constant
/// - Free functions delegating to `API`
///
/// # Examples
///
/// ```rust
/// use instance_registry::define_registry;
/// use std::sync::Arc;
///
/// define_registry!(services);
///
/// struct Clock {
///     tick_ms: u64,
/// }
///
/// let a: Arc<Clock> = services::get_or_create(|| Clock { tick_ms: 10 }).unwrap();
/// let b: Arc<Clock> = services::get_or_create(|| Clock { tick_ms: 99 }).unwrap();
///
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(b.tick_ms, 10);
/// ```
///
/// # Multiple Registries
///
/// Each registry holds its own instance of a type:
///
/// ```rust
/// use instance_registry::define_registry;
/// use std::sync::Arc;
///
/// define_registry!(primary);
/// define_registry!(replica);
///
/// let p = primary::get_or_create(|| "primary".to_string()).unwrap();
/// let r = replica::get_or_create(|| "replica".to_string()).unwrap();
///
/// assert!(!Arc::ptr_eq(&p, &r));
/// assert_eq!(&*r, "replica");
/// ```
///
/// # Trait-Based Usage
///
/// ```rust
/// use instance_registry::{define_registry, RegistryApi};
///
/// define_registry!(app);
///
/// let value = app::API.get_or_create(|| 100i32).unwrap();
/// assert!(app::API.contains::<i32>());
/// assert_eq!(*value, 100);
/// ```
#[macro_export]
macro_rules! define_registry {
    ($name:ident) => {
        pub mod $name {
            use std::collections::HashMap;
            use std::sync::{Arc, LazyLock, Mutex};

            static STORAGE: $crate::Storage = LazyLock::new(|| Mutex::new(HashMap::new()));

            static TRACE: $crate::TraceCallback = LazyLock::new(|| Mutex::new(None));

            /// Zero-sized type that implements the registry API.
            ///
            /// All registry operations are provided by the `RegistryApi` trait's
            /// default implementations. This struct only provides access to the statics.
            pub struct Api;

            impl $crate::RegistryApi for Api {
                fn storage() -> &'static $crate::Storage {
                    &STORAGE
                }

                fn trace() -> &'static $crate::TraceCallback {
                    &TRACE
                }
            }

            /// Convenient constant for accessing the registry API.
            pub const API: Api = Api;

            /// Return the instance of `T`, constructing it on first request.
            pub fn get_or_create<T, F>(constructor: F) -> Result<Arc<T>, $crate::RegistryError>
            where
                T: Send + Sync + 'static,
                F: FnOnce() -> T,
            {
                use $crate::RegistryApi;
                API.get_or_create(constructor)
            }

            /// Return the instance of `T`, constructing it from `args` on first request.
            pub fn get_or_create_with<T, A, F>(
                args: A,
                constructor: F,
            ) -> Result<Arc<T>, $crate::RegistryError>
            where
                T: Send + Sync + 'static,
                F: FnOnce(A) -> T,
            {
                use $crate::RegistryApi;
                API.get_or_create_with(args, constructor)
            }

            /// Return the instance of `T`, trying to construct it on first request.
            pub fn get_or_try_create<T, E, F>(
                constructor: F,
            ) -> Result<Arc<T>, $crate::RegistryError>
            where
                T: Send + Sync + 'static,
                E: Into<$crate::BoxError>,
                F: FnOnce() -> Result<T, E>,
            {
                use $crate::RegistryApi;
                API.get_or_try_create(constructor)
            }

            /// Retrieve an already constructed instance.
            pub fn get<T: Send + Sync + 'static>() -> Result<Arc<T>, $crate::RegistryError> {
                use $crate::RegistryApi;
                API.get()
            }

            /// Check whether `T` has been constructed in this registry.
            pub fn contains<T: Send + Sync + 'static>() -> bool {
                use $crate::RegistryApi;
                API.contains::<T>()
            }

            /// Set a tracing callback for registry operations.
            pub fn set_trace_callback(
                callback: impl Fn(&$crate::RegistryEvent) + Send + Sync + 'static,
            ) {
                use $crate::RegistryApi;
                API.set_trace_callback(callback)
            }

            /// Clear the tracing callback.
            pub fn clear_trace_callback() {
                use $crate::RegistryApi;
                API.clear_trace_callback()
            }
        }
    };
}

/// Declares an accessor function backed by its own hidden [`InstanceSlot`](crate::InstanceSlot).
///
/// The body is the initializer. It runs on the first call only; every call
/// returns the same `Arc`.
///
/// ```rust
/// use instance_registry::singleton;
/// use std::sync::Arc;
///
/// pub struct Settings {
///     pub verbose: bool,
/// }
///
/// singleton! {
///     pub fn settings() -> Settings {
///         Settings { verbose: true }
///     }
/// }
///
/// assert!(Arc::ptr_eq(&settings(), &settings()));
/// assert!(settings().verbose);
/// ```
#[macro_export]
macro_rules! singleton {
    ($(#[$meta:meta])* $vis:vis fn $accessor:ident() -> $ty:ty $body:block) => {
        $(#[$meta])*
        $vis fn $accessor() -> ::std::sync::Arc<$ty> {
            static SLOT: $crate::InstanceSlot<$ty> = $crate::InstanceSlot::new();
            SLOT.get_or_init(|| $body)
        }
    };
}
