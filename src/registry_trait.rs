//! Core trait defining registry behavior.
//!
//! This module provides the `RegistryApi` trait with default implementations for
//! type-keyed get-or-create, lookup, and tracing of single instances.
//!
//! The registry is type-based: each type (`TypeId`) can have exactly one instance stored,
//! and once stored it is never replaced or removed.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, LazyLock, Mutex};

use once_cell::sync::OnceCell;

use crate::{BoxError, RegistryError, RegistryEvent};

/// One per-type cell. Empty until its constructor succeeds.
pub type InstanceCell = Arc<OnceCell<Arc<dyn Any + Send + Sync>>>;

/// Type alias for the instance storage static.
pub type Storage = LazyLock<Mutex<HashMap<TypeId, InstanceCell>>>;

/// Type alias for the trace callback storage.
pub type TraceCallback = LazyLock<Mutex<Option<Arc<dyn Fn(&RegistryEvent) + Send + Sync>>>>;

/// Core trait defining registry behavior.
///
/// Provides default implementations for all registry operations, requiring only
/// two accessor methods (`storage` and `trace`) to be implemented by the implementor.
///
/// Each type moves from unconstructed to constructed at most once per registry.
/// There is no way back.
pub trait RegistryApi {
    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Access the trace callback static.
    fn trace() -> &'static TraceCallback;

    /// Set a tracing callback for registry operations.
    ///
    /// The callback will be invoked for every registry operation. No registry lock
    /// is held while it runs, so it may call back into the same registry. Any
    /// operation it performs emits its own event, so guard against recursion.
    fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
        let mut guard = Self::trace().lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    fn clear_trace_callback(&self) {
        let mut guard = Self::trace().lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    /// Invoke the current trace callback, if any, with `event`.
    fn emit_event(&self, event: &RegistryEvent) {
        let callback = Self::trace()
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();

        if let Some(callback) = callback {
            callback(event);
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------------------------------

    /// Access the storage static.
    fn storage() -> &'static Storage;

    /// Return the instance of `T`, constructing it with `constructor` on first request.
    ///
    /// On every later call `constructor` is dropped without being called, so
    /// whatever arguments it captured are ignored.
    ///
    /// # Errors
    ///
    /// - Type mismatch on the stored value (cannot happen while keys are `TypeId`s)
    fn get_or_create<T, F>(&self, constructor: F) -> Result<Arc<T>, RegistryError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.get_or_try_create(|| Ok::<T, Infallible>(constructor()))
    }

    /// Like [`get_or_create`](RegistryApi::get_or_create), with the construction
    /// arguments passed explicitly. `args` is only consulted on the enrolling call.
    fn get_or_create_with<T, A, F>(&self, args: A, constructor: F) -> Result<Arc<T>, RegistryError>
    where
        T: Send + Sync + 'static,
        F: FnOnce(A) -> T,
    {
        self.get_or_create(move || constructor(args))
    }

    /// Return the instance of `T`, constructing it with a fallible `constructor`
    /// on first request.
    ///
    /// The storage lock is only held while looking up the per-type cell, so a
    /// constructor may request instances of other types from this registry.
    /// Concurrent callers for the same type block on that type's cell until the
    /// first constructor finishes. A constructor must not request its own type.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Construction`] if `constructor` fails. Nothing is stored,
    ///   and the next call tries again. The constructor's error is the `source`.
    /// - Type mismatch on the stored value
    fn get_or_try_create<T, E, F>(&self, constructor: F) -> Result<Arc<T>, RegistryError>
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: FnOnce() -> Result<T, E>,
    {
        let type_name = std::any::type_name::<T>();

        let cell = Self::storage()
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .entry(TypeId::of::<T>())
            .or_default()
            .clone();

        let mut constructed = false;
        let outcome = cell.get_or_try_init(|| match constructor() {
            Ok(value) => {
                constructed = true;
                let instance: Arc<dyn Any + Send + Sync> = Arc::new(value);
                Ok(instance)
            }
            Err(err) => Err::<_, BoxError>(err.into()),
        });

        let (result, event) = match outcome {
            Ok(instance) if constructed => {
                tracing::debug!(type_name, "constructed instance");
                (
                    downcast::<T>(instance.clone()),
                    RegistryEvent::Create { type_name },
                )
            }
            Ok(instance) => {
                tracing::trace!(type_name, "reusing existing instance");
                (
                    downcast::<T>(instance.clone()),
                    RegistryEvent::Reuse { type_name },
                )
            }
            Err(source) => {
                tracing::warn!(type_name, error = %source, "construction failed");
                (
                    Err(RegistryError::Construction { type_name, source }),
                    RegistryEvent::ConstructionFailed { type_name },
                )
            }
        };

        self.emit_event(&event);

        result
    }

    /// Retrieve an already constructed instance without constructing one.
    ///
    /// # Errors
    ///
    /// - Type `T` has not been constructed in this registry
    /// - Type mismatch (extremely rare)
    fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, RegistryError> {
        let type_name = std::any::type_name::<T>();

        let any_arc_opt = Self::storage()
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&TypeId::of::<T>())
            .and_then(|cell| cell.get().cloned());

        let result = match any_arc_opt {
            Some(any_arc) => downcast::<T>(any_arc),
            None => Err(RegistryError::TypeNotFound { type_name }),
        };

        self.emit_event(&RegistryEvent::Get {
            type_name,
            found: result.is_ok(),
        });

        result
    }

    /// Check whether `T` has been constructed in this registry.
    fn contains<T: Send + Sync + 'static>(&self) -> bool {
        let found = Self::storage()
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&TypeId::of::<T>())
            .is_some_and(|cell| cell.get().is_some());

        self.emit_event(&RegistryEvent::Contains {
            type_name: std::any::type_name::<T>(),
            found,
        });

        found
    }
}

fn downcast<T: Send + Sync + 'static>(
    any_arc: Arc<dyn Any + Send + Sync>,
) -> Result<Arc<T>, RegistryError> {
    any_arc
        .downcast::<T>()
        .map_err(|_| RegistryError::TypeMismatch {
            type_name: std::any::type_name::<T>(),
        })
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{RegistryError, RegistryEvent};

    use super::{RegistryApi, Storage, TraceCallback};

    use serial_test::serial;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, LazyLock, Mutex};

    static STORAGE: Storage = LazyLock::new(|| Mutex::new(HashMap::new()));

    static TRACE: TraceCallback = LazyLock::new(|| Mutex::new(None));

    struct Api;

    impl RegistryApi for Api {
        fn storage() -> &'static Storage {
            &STORAGE
        }

        fn trace() -> &'static TraceCallback {
            &TRACE
        }
    }

    const API: Api = Api;

    // The storage is never cleared, so every test enrolls its own local types.
    // All tests are serial so trace callbacks only observe their own test.

    #[test]
    #[serial]
    fn test_same_instance_returned() -> Result<(), RegistryError> {
        struct Settings {
            port: u16,
        }

        let first = API.get_or_create(|| Settings { port: 8080 })?;
        let second = API.get_or_create(|| Settings { port: 9090 })?;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.port, 8080);

        Ok(())
    }

    #[test]
    #[serial]
    fn test_constructor_runs_once() {
        static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

        struct Counter {
            value: Option<i32>,
        }

        impl Counter {
            fn new(value: Option<i32>) -> Self {
                CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
                Counter { value }
            }
        }

        let a = API.get_or_create_with(None, Counter::new).unwrap();
        let b = API.get_or_create_with(Some(7), Counter::new).unwrap();
        let c = API.get_or_create_with(Some(9), Counter::new).unwrap();

        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(c.value, None);
    }

    #[test]
    #[serial]
    fn test_types_are_independent() {
        struct Alpha(&'static str);
        struct Beta(&'static str);

        let alpha = API.get_or_create(|| Alpha("alpha")).unwrap();
        assert!(!API.contains::<Beta>());

        let beta = API.get_or_create(|| Beta("beta")).unwrap();

        assert_eq!(alpha.0, "alpha");
        assert_eq!(beta.0, "beta");
        assert!(Arc::ptr_eq(&alpha, &API.get::<Alpha>().unwrap()));
    }

    #[test]
    #[serial]
    fn test_constructor_builds_other_type() {
        struct Pool {
            size: usize,
        }

        struct Service {
            pool: Arc<Pool>,
        }

        let service = API
            .get_or_create(|| Service {
                pool: API.get_or_create(|| Pool { size: 4 }).unwrap(),
            })
            .unwrap();

        assert_eq!(service.pool.size, 4);
        assert!(Arc::ptr_eq(&service.pool, &API.get::<Pool>().unwrap()));
        assert!(API.contains::<Service>());
    }

    #[test]
    #[serial]
    fn test_failed_nested_construction_propagates() {
        #[derive(Debug)]
        struct Upstream;

        #[derive(Debug)]
        struct Downstream;

        let err = API
            .get_or_try_create(|| {
                API.get_or_try_create(|| Err::<Upstream, _>("upstream down"))?;
                Ok::<_, RegistryError>(Downstream)
            })
            .unwrap_err();

        assert!(err.type_name().ends_with("Downstream"));
        assert!(!API.contains::<Upstream>());
        assert!(!API.contains::<Downstream>());
    }

    #[test]
    #[serial]
    fn test_failed_construction_is_not_cached() {
        #[derive(Debug)]
        struct Flaky {
            attempt: usize,
        }

        let attempts = AtomicUsize::new(0);

        let err = API
            .get_or_try_create(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<Flaky, _>("not ready")
            })
            .unwrap_err();

        assert!(err.is_construction());
        assert!(!API.contains::<Flaky>());

        let flaky = API
            .get_or_try_create(|| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, std::io::Error>(Flaky { attempt })
            })
            .unwrap();

        assert_eq!(flaky.attempt, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[serial]
    fn test_failing_constructor_ignored_once_constructed() {
        struct Ready;

        let first = API.get_or_create(|| Ready).unwrap();
        let second = API
            .get_or_try_create(|| Err::<Ready, _>("should never run"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    #[serial]
    fn test_panicking_constructor_leaves_no_entry() {
        struct Fragile(u8);

        let outcome = std::panic::catch_unwind(|| {
            let _ = API.get_or_create::<Fragile, _>(|| panic!("constructor blew up"));
        });
        assert!(outcome.is_err());
        assert!(!API.contains::<Fragile>());

        let fragile = API.get_or_create(|| Fragile(3)).unwrap();
        assert_eq!(fragile.0, 3);
    }

    #[test]
    #[serial]
    fn test_get_unconstructed() {
        struct Missing;

        let result = API.get::<Missing>();
        assert!(matches!(
            result,
            Err(RegistryError::TypeNotFound { type_name }) if type_name.ends_with("Missing")
        ));
    }

    #[test]
    #[serial]
    fn test_concurrent_construction_happens_once() {
        static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

        struct Shared;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    API.get_or_create(|| {
                        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(5));
                        Shared
                    })
                    .unwrap()
                })
            })
            .collect();

        let instances: Vec<Arc<Shared>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    #[serial]
    fn test_trace_callback_create_and_reuse() {
        struct Traced;

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        API.set_trace_callback(move |e| {
            events_clone.lock().unwrap().push(e.to_string());
        });

        API.get_or_create(|| Traced).unwrap();
        API.get_or_create(|| Traced).unwrap();
        API.clear_trace_callback();

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert!(captured[0].starts_with("create { type_name: "));
        assert!(captured[1].starts_with("reuse { type_name: "));
        assert!(captured.iter().all(|e| e.contains("Traced")));
    }

    #[test]
    #[serial]
    fn test_trace_callback_construction_failed() {
        struct Refused;

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        API.set_trace_callback(move |e| {
            events_clone.lock().unwrap().push(e.to_string());
        });

        let _ = API.get_or_try_create(|| Err::<Refused, _>("no"));
        let _ = API.contains::<Refused>();
        API.clear_trace_callback();

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert!(captured[0].starts_with("construction_failed"));
        assert!(captured[1].ends_with("found: false }"));
    }

    #[test]
    #[serial]
    fn test_clear_trace_callback_stops_events() {
        struct Quiet;

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        API.set_trace_callback(move |e| {
            events_clone.lock().unwrap().push(e.to_string());
        });

        API.get_or_create(|| Quiet).unwrap();
        API.clear_trace_callback();

        API.get_or_create(|| Quiet).unwrap();
        let _ = API.get::<Quiet>();
        let _ = API.contains::<Quiet>();

        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    #[serial]
    fn test_trace_callback_may_query_registry() {
        struct Observed;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        API.set_trace_callback(move |e| {
            if let RegistryEvent::Create { .. } = e {
                seen_clone.lock().unwrap().push(API.contains::<Observed>());
            }
        });

        API.get_or_create(|| Observed).unwrap();
        API.clear_trace_callback();

        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }
}
