//! Call interception: an enrolled type's construction always goes through a registry.

use std::sync::Arc;

use crate::{BoxError, GlobalRegistry, RegistryApi, RegistryError};

/// Proof that a construction request went through a registry.
///
/// Only [`Enrolled::instance_in`] can create one, so code outside this crate
/// cannot call [`Enrolled::construct`] directly.
///
/// ```compile_fail
/// use instance_registry::{ConstructToken, Enrolled};
///
/// struct Unique(u8);
///
/// impl Enrolled for Unique {
///     type Args = u8;
///     type Error = std::convert::Infallible;
///
///     fn construct(value: u8, _: ConstructToken) -> Result<Self, Self::Error> {
///         Ok(Unique(value))
///     }
/// }
///
/// let _bypass = Unique::construct(2, ConstructToken(()));
/// ```
#[derive(Debug)]
pub struct ConstructToken(());

/// A type whose instances are obtained through [`Enrolled::instance`] only.
///
/// Implementors keep their raw constructor private to their module and expose
/// it here as [`construct`](Enrolled::construct). `construct` takes a
/// [`ConstructToken`] that only the registry hands out, so every request goes
/// through [`instance`](Enrolled::instance) or
/// [`instance_in`](Enrolled::instance_in), and `construct` runs at most once
/// successfully per registry.
///
/// # Examples
///
/// ```
/// use instance_registry::Enrolled;
/// use std::sync::Arc;
///
/// mod metrics {
///     use instance_registry::{ConstructToken, Enrolled};
///
///     pub struct Metrics {
///         pub namespace: String,
///     }
///
///     impl Enrolled for Metrics {
///         type Args = &'static str;
///         type Error = std::convert::Infallible;
///
///         fn construct(namespace: &'static str, _: ConstructToken) -> Result<Self, Self::Error> {
///             Ok(Metrics { namespace: namespace.to_string() })
///         }
///     }
/// }
///
/// let a = metrics::Metrics::instance("app").unwrap();
/// let b = metrics::Metrics::instance("ignored").unwrap();
///
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(b.namespace, "app");
/// ```
pub trait Enrolled: Sized + Send + Sync + 'static {
    /// Arguments consulted only by the enrolling call.
    type Args;

    /// Error returned by a failing [`construct`](Enrolled::construct).
    type Error: Into<BoxError>;

    /// The raw constructor. Only a registry can supply the token.
    fn construct(args: Self::Args, token: ConstructToken) -> Result<Self, Self::Error>;

    /// Returns the process-wide instance, constructing it from `args` on first request.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Construction`] if `construct` fails. Nothing is cached
    /// and the next call constructs again.
    fn instance(args: Self::Args) -> Result<Arc<Self>, RegistryError> {
        Self::instance_in(&GlobalRegistry, args)
    }

    /// Like [`instance`](Enrolled::instance), against an explicit registry.
    fn instance_in<R: RegistryApi>(
        registry: &R,
        args: Self::Args,
    ) -> Result<Arc<Self>, RegistryError> {
        registry.get_or_try_create(|| Self::construct(args, ConstructToken(())))
    }

    /// Returns `true` once the process-wide instance exists.
    fn is_constructed() -> bool {
        Self::is_constructed_in(&GlobalRegistry)
    }

    /// Returns `true` once `registry` holds an instance.
    fn is_constructed_in<R: RegistryApi>(registry: &R) -> bool {
        registry.contains::<Self>()
    }
}
