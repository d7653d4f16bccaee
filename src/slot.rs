//! A `static`-friendly slot holding at most one instance.
//!
//! The slot is consulted before the initializer runs, so once it is filled
//! initialization is skipped entirely.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::{BoxError, RegistryError};

/// Holds the single instance of `T` for one `static`.
///
/// # Examples
///
/// ```
/// use instance_registry::InstanceSlot;
/// use std::sync::Arc;
///
/// struct Logger {
///     prefix: &'static str,
/// }
///
/// static LOGGER: InstanceSlot<Logger> = InstanceSlot::new();
///
/// let a = LOGGER.get_or_init(|| Logger { prefix: "app" });
/// let b = LOGGER.get_or_init(|| Logger { prefix: "other" });
///
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(b.prefix, "app");
/// ```
pub struct InstanceSlot<T> {
    cell: OnceCell<Arc<T>>,
}

impl<T> InstanceSlot<T> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        InstanceSlot {
            cell: OnceCell::new(),
        }
    }

    /// Returns the instance if the slot has been filled.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// Returns `true` once an instance has been stored.
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns the instance, running `init` only if the slot is empty.
    ///
    /// If several threads race on an empty slot, one runs `init` and the rest
    /// block until it finishes.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> Arc<T> {
        if let Some(existing) = self.cell.get() {
            tracing::trace!(type_name = std::any::type_name::<T>(), "slot already filled");
            return existing.clone();
        }

        self.cell
            .get_or_init(|| {
                tracing::debug!(type_name = std::any::type_name::<T>(), "filling slot");
                Arc::new(init())
            })
            .clone()
    }

    /// Returns the instance, trying `init` only if the slot is empty.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Construction`] if `init` fails. The slot stays empty
    /// and the next call tries again.
    pub fn get_or_try_init<E>(
        &self,
        init: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, RegistryError>
    where
        E: Into<BoxError>,
    {
        if let Some(existing) = self.cell.get() {
            tracing::trace!(type_name = std::any::type_name::<T>(), "slot already filled");
            return Ok(existing.clone());
        }

        let type_name = std::any::type_name::<T>();
        self.cell
            .get_or_try_init(|| match init() {
                Ok(value) => {
                    tracing::debug!(type_name, "filling slot");
                    Ok(Arc::new(value))
                }
                Err(err) => {
                    let source: BoxError = err.into();
                    tracing::warn!(type_name, error = %source, "slot initialization failed");
                    Err(RegistryError::Construction { type_name, source })
                }
            })
            .cloned()
    }
}

impl<T> Default for InstanceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InstanceSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceSlot")
            .field("type_name", &std::any::type_name::<T>())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_init_runs_once() {
        let slot = InstanceSlot::new();
        let runs = AtomicUsize::new(0);

        let a = slot.get_or_init(|| {
            runs.fetch_add(1, Ordering::SeqCst);
            String::from("first")
        });
        let b = slot.get_or_init(|| {
            runs.fetch_add(1, Ordering::SeqCst);
            String::from("second")
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(&*b, "first");
    }

    #[test]
    fn test_get_before_and_after() {
        let slot: InstanceSlot<u32> = InstanceSlot::default();
        assert!(slot.get().is_none());
        assert!(!slot.is_initialized());

        slot.get_or_init(|| 5);

        assert_eq!(slot.get().as_deref(), Some(&5));
        assert!(slot.is_initialized());
    }

    #[test]
    fn test_failed_init_leaves_slot_empty() {
        let slot: InstanceSlot<u16> = InstanceSlot::new();

        let err = slot.get_or_try_init(|| "x".parse::<u16>()).unwrap_err();
        assert!(err.is_construction());
        assert!(!slot.is_initialized());

        let value = slot.get_or_try_init(|| "7".parse::<u16>()).unwrap();
        assert_eq!(*value, 7);

        // Filled now, so a failing initializer is never consulted.
        let again = slot.get_or_try_init(|| "y".parse::<u16>()).unwrap();
        assert!(Arc::ptr_eq(&value, &again));
    }

    #[test]
    fn test_static_slot_shared_across_threads() {
        static SLOT: InstanceSlot<Vec<u8>> = InstanceSlot::new();
        static RUNS: AtomicUsize = AtomicUsize::new(0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    SLOT.get_or_init(|| {
                        RUNS.fetch_add(1, Ordering::SeqCst);
                        vec![1, 2]
                    })
                })
            })
            .collect();

        for handle in handles {
            let value = handle.join().unwrap();
            assert_eq!(*value, [1, 2]);
        }
        assert_eq!(RUNS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_format() {
        let slot: InstanceSlot<u8> = InstanceSlot::new();
        assert_eq!(
            format!("{slot:?}"),
            "InstanceSlot { type_name: \"u8\", initialized: false }"
        );
    }
}
