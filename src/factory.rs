//! Factory wrapping: a raw constructor behind a gate that calls it at most once.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use crate::{BoxError, InstanceSlot, RegistryError};

enum Constructor<T, A, E> {
    Infallible(fn(A) -> T),
    Fallible(fn(A) -> Result<T, E>),
}

/// Wraps a constructor function so every caller gets the same instance.
///
/// Callers use the factory, never the raw constructor. Arguments passed to
/// [`get`](SingletonFactory::get) / [`try_get`](SingletonFactory::try_get)
/// reach the constructor only on the first successful call.
///
/// # Examples
///
/// ```
/// use instance_registry::SingletonFactory;
/// use std::sync::Arc;
///
/// struct Database {
///     url: String,
/// }
///
/// impl Database {
///     fn connect(url: &str) -> Database {
///         Database { url: url.to_string() }
///     }
/// }
///
/// static DATABASE: SingletonFactory<Database, &str> = SingletonFactory::new(Database::connect);
///
/// let primary = DATABASE.get("postgres://primary");
/// let other = DATABASE.get("postgres://other");
///
/// assert!(Arc::ptr_eq(&primary, &other));
/// assert_eq!(other.url, "postgres://primary");
/// ```
pub struct SingletonFactory<T, A = (), E = Infallible> {
    slot: InstanceSlot<T>,
    constructor: Constructor<T, A, E>,
}

impl<T, A> SingletonFactory<T, A, Infallible> {
    /// Wraps an infallible constructor.
    pub const fn new(constructor: fn(A) -> T) -> Self {
        SingletonFactory {
            slot: InstanceSlot::new(),
            constructor: Constructor::Infallible(constructor),
        }
    }

    /// Returns the shared instance, constructing it from `args` on first call.
    pub fn get(&self, args: A) -> Arc<T> {
        match self.constructor {
            Constructor::Infallible(constructor) => self.slot.get_or_init(|| constructor(args)),
            Constructor::Fallible(constructor) => {
                self.slot.get_or_init(|| match constructor(args) {
                    Ok(value) => value,
                    Err(never) => match never {},
                })
            }
        }
    }
}

impl<T, A, E> SingletonFactory<T, A, E> {
    /// Wraps a fallible constructor.
    pub const fn fallible(constructor: fn(A) -> Result<T, E>) -> Self {
        SingletonFactory {
            slot: InstanceSlot::new(),
            constructor: Constructor::Fallible(constructor),
        }
    }

    /// Returns the instance if it has been constructed.
    pub fn peek(&self) -> Option<Arc<T>> {
        self.slot.get()
    }

    /// Returns `true` once the constructor has succeeded.
    pub fn is_constructed(&self) -> bool {
        self.slot.is_initialized()
    }
}

impl<T, A, E> SingletonFactory<T, A, E>
where
    E: Into<BoxError>,
{
    /// Returns the shared instance, trying to construct it from `args` on first call.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Construction`] if the constructor fails. Nothing is
    /// stored, and the next call tries again with its own `args`.
    pub fn try_get(&self, args: A) -> Result<Arc<T>, RegistryError> {
        match self.constructor {
            Constructor::Infallible(constructor) => {
                Ok(self.slot.get_or_init(|| constructor(args)))
            }
            Constructor::Fallible(constructor) => self.slot.get_or_try_init(|| constructor(args)),
        }
    }
}

impl<T, A, E> fmt::Debug for SingletonFactory<T, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonFactory")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
